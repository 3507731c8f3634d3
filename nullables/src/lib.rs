//! Nullable infrastructure for deterministic testing.
//!
//! The gateway's external collaborators (verification oracle, ledger network)
//! sit behind traits. This crate provides in-memory implementations that:
//! - answer from a script instead of the network
//! - record every call for later assertions
//! - can be slowed down or made to fail on demand
//!
//! Usage: swap real implementations for nullables in tests.

pub mod ledger;
pub mod verifier;

pub use ledger::{DispatchRecord, NullLedger};
pub use verifier::NullVerifier;
