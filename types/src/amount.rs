//! The fixed amount minted per accepted request.
//!
//! Stored as raw units (u128), the smallest denomination the token contract
//! understands. Serialized as a decimal string so JSON consumers never lose
//! precision.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MintAmount(u128);

impl MintAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for MintAmount {
    fn from(raw: u64) -> Self {
        Self(u128::from(raw))
    }
}

impl TryFrom<String> for MintAmount {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse::<u128>().map(Self)
    }
}

impl From<MintAmount> for String {
    fn from(amount: MintAmount) -> Self {
        amount.0.to_string()
    }
}

impl fmt::Display for MintAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
