//! The mint transaction and its signed envelope.
//!
//! Canonical encoding is bincode of [`MintTransaction`]. The signature covers
//! `Blake2b-256(SIGNING_DOMAIN || payload)`, so a signature over a mint can
//! never be replayed as a signature over anything else.

use capmint_crypto::{blake2b_256_multi, derive_identity, sign_message, verify_signature};
use capmint_types::{
    Address, ContractId, KeyPair, MintAmount, PublicKey, RecipientAddress, SequenceNumber,
    Signature,
};
use serde::{Deserialize, Serialize};

/// Current transaction format version.
pub const TRANSACTION_VERSION: u8 = 1;

/// Domain tag mixed into the signed digest.
const SIGNING_DOMAIN: &[u8] = b"capmint/mint-transaction/v1";

/// The contract method a transaction invokes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractCall {
    /// `mint(recipient, amount)` on the capped token contract.
    Mint {
        recipient: RecipientAddress,
        amount: MintAmount,
    },
}

/// An unsigned mint transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintTransaction {
    pub version: u8,
    /// Identity the transaction is sent from (derived from the signing key).
    pub signer: Address,
    /// The signer's sequence number this transaction consumes.
    pub sequence: SequenceNumber,
    /// The token contract being called.
    pub contract: ContractId,
    pub call: ContractCall,
}

impl MintTransaction {
    pub fn mint(
        signer: Address,
        sequence: SequenceNumber,
        contract: ContractId,
        recipient: RecipientAddress,
        amount: MintAmount,
    ) -> Self {
        Self {
            version: TRANSACTION_VERSION,
            signer,
            sequence,
            contract,
            call: ContractCall::Mint { recipient, amount },
        }
    }

    /// Canonical byte encoding.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// Encode and sign with `keypair`.
    ///
    /// Fails only if the transaction cannot be encoded.
    pub fn sign(self, keypair: &KeyPair) -> Result<SignedTransaction, bincode::Error> {
        let payload = self.encode()?;
        let digest = signing_digest(&payload);
        let signature = sign_message(&digest, &keypair.private);
        Ok(SignedTransaction {
            transaction: self,
            payload,
            signature,
            public_key: keypair.public.clone(),
        })
    }
}

fn signing_digest(payload: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[SIGNING_DOMAIN, payload])
}

/// A signed transaction, ready for the ledger network client.
///
/// The `transaction` field is a decoded view of `payload` for readers of the
/// envelope; the ledger verifies `payload`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub transaction: MintTransaction,
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
    pub signature: Signature,
    pub public_key: PublicKey,
}

impl SignedTransaction {
    /// Digest the signature covers. Doubles as a stable transaction hash.
    pub fn digest(&self) -> [u8; 32] {
        signing_digest(&self.payload)
    }

    /// `0x`-prefixed hex of [`SignedTransaction::digest`].
    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.digest()))
    }

    /// Check signature, payload/view consistency and signer identity.
    pub fn verify(&self) -> bool {
        let Ok(decoded) = MintTransaction::decode(&self.payload) else {
            return false;
        };
        decoded == self.transaction
            && derive_identity(&self.public_key) == self.transaction.signer
            && verify_signature(&self.digest(), &self.signature, &self.public_key)
    }
}
