//! Cryptographic primitives for the capmint gateway.
//!
//! - **Ed25519** for signing mint transactions
//! - **Blake2b** for transaction digests and signer identity derivation
//! - Parsing of hex-encoded signing keys from configuration

pub mod hash;
pub mod identity;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi};
pub use identity::derive_identity;
pub use keys::{
    generate_keypair, keypair_from_hex, keypair_from_private, keypair_from_seed,
    public_from_private, KeyError,
};
pub use sign::{sign_message, verify_signature};
