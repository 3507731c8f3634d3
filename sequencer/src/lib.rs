//! Sequence number allocation for the gateway's signing identity.
//!
//! The ledger processes one identity's transactions strictly in sequence
//! order: a duplicate number is rejected and a missing one stalls every
//! higher number behind it. [`SequencedSigner`] is the only owner of the
//! counter. Each [`SequenceSlot`] it hands out keeps the critical section
//! open until the transaction carrying that number has been dispatched to
//! the ledger client, so dispatch order always equals acquisition order.

pub mod signer;

pub use signer::{SequenceSlot, SequencedSigner};
