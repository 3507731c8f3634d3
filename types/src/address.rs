//! Ledger account addresses.
//!
//! Format: `0x` + 40 hex characters (20 bytes). The hex part is accepted in
//! three spellings:
//! - all lowercase,
//! - all uppercase,
//! - mixed case, in which case it must carry a valid checksum: a letter is
//!   uppercase iff the matching nibble of `keccak256(lowercase hex)` is >= 8.
//!
//! Parsed addresses always render in their checksummed form.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of raw bytes in an address.
pub const ADDRESS_LEN: usize = 20;
/// Prefix for every textual address.
const PREFIX: &str = "0x";
/// Number of hex characters after the prefix.
const HEX_LEN: usize = ADDRESS_LEN * 2;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("address must have 40 hex characters, got {0}")]
    WrongLength(usize),

    #[error("address contains non-hex character {0:?}")]
    InvalidCharacter(char),

    #[error("mixed-case address has an invalid checksum")]
    BadChecksum,
}

/// A well-formed 20-byte ledger address.
///
/// Construction goes through [`Address::parse`] (or `FromStr`), so holding an
/// `Address` means the format check already passed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

/// The recipient of a mint. Validated once at the request boundary.
pub type RecipientAddress = Address;

/// The token contract the gateway mints through.
pub type ContractId = Address;

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Wrap raw bytes. Used when an address is derived rather than parsed.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse and validate a textual address.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let hex_part = raw.strip_prefix(PREFIX).ok_or(AddressError::MissingPrefix)?;
        if hex_part.len() != HEX_LEN {
            return Err(AddressError::WrongLength(hex_part.len()));
        }
        if let Some(bad) = hex_part.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidCharacter(bad));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|_| AddressError::WrongLength(hex_part.len()))?;

        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && checksum_encode(&bytes)[PREFIX.len()..] != *hex_part {
            return Err(AddressError::BadChecksum);
        }

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Checksummed textual form.
    pub fn to_checksum(&self) -> String {
        checksum_encode(&self.0)
    }
}

/// Render bytes as a checksummed `0x` address.
fn checksum_encode(bytes: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(PREFIX.len() + HEX_LEN);
    out.push_str(PREFIX);
    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_checksum()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}
