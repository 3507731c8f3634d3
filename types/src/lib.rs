//! Fundamental types for the capmint gateway.
//!
//! Every other crate in the workspace builds on these: ledger addresses,
//! sequence numbers, mint amounts, key material, the inbound request shape
//! and the terminal outcome handed back to callers.

pub mod address;
pub mod amount;
pub mod keys;
pub mod outcome;
pub mod request;
pub mod secret;
pub mod sequence;
pub mod txid;

pub use address::{Address, AddressError, ContractId, RecipientAddress};
pub use amount::MintAmount;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use outcome::{MintOutcome, MintStatus};
pub use request::{MintRequest, ProofToken, ValidatedRequest};
pub use secret::Secret;
pub use sequence::SequenceNumber;
pub use txid::TransactionId;
