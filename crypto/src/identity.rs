//! Signing identity derivation.
//!
//! The ledger knows the gateway's signer by a 20-byte address: the last 20
//! bytes of Blake2b-256(public key).

use capmint_types::address::ADDRESS_LEN;
use capmint_types::{Address, PublicKey};

/// Derive the ledger address of a signing key.
pub fn derive_identity(public_key: &PublicKey) -> Address {
    let digest = crate::blake2b_256(public_key.as_bytes());
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
    Address::from_bytes(bytes)
}
