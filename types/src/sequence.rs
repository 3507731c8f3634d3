//! Per-signer transaction sequence numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A sequence number scoped to one signing identity.
///
/// The ledger orders and deduplicates an identity's transactions by this
/// value; a gap stalls every higher-numbered transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The number that follows this one, or `None` on overflow.
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// The number that precedes this one, or `None` at zero.
    pub fn checked_prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
