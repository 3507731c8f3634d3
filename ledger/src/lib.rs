//! Ledger side of the gateway.
//!
//! - [`MintTransaction`]: the mint call, its canonical encoding and signature
//! - [`LedgerClient`] / [`TokenQuery`]: the seams to the ledger network
//! - [`RpcLedgerClient`]: JSON-RPC over HTTP implementation of both seams
//! - [`LedgerSubmitter`]: builds, signs and dispatches one mint transaction
//!
//! Nothing here retries. A retried submission with a stale sequence number
//! is either a duplicate or a double use of the slot; retry decisions start
//! over with a fresh number, above this crate.

pub mod client;
pub mod error;
pub mod rpc_client;
pub mod submitter;
pub mod transaction;

pub use client::{LedgerClient, TokenQuery};
pub use error::{LedgerError, SubmitError};
pub use rpc_client::RpcLedgerClient;
pub use submitter::LedgerSubmitter;
pub use transaction::{ContractCall, MintTransaction, SignedTransaction, TRANSACTION_VERSION};
