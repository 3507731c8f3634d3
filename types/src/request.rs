//! Inbound mint requests and their validated form.

use crate::address::RecipientAddress;
use serde::Deserialize;
use std::fmt;

/// A mint request exactly as the caller sent it.
///
/// Both fields are optional at this layer so that a missing field turns into
/// an `InvalidInput` outcome instead of a transport-level parse failure. The
/// short names used by the browser front end (`address`, `token`) are
/// accepted as aliases.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    #[serde(default, alias = "address", alias = "recipient_address")]
    pub recipient_address: Option<String>,
    #[serde(default, alias = "token", alias = "humanity_proof")]
    pub humanity_proof: Option<String>,
}

impl MintRequest {
    pub fn new(recipient_address: impl Into<String>, humanity_proof: impl Into<String>) -> Self {
        Self {
            recipient_address: Some(recipient_address.into()),
            humanity_proof: Some(humanity_proof.into()),
        }
    }
}

/// A proof-of-humanity token issued by the verification oracle.
///
/// Single-use by the oracle's contract. Only a short prefix is ever shown
/// in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ProofToken(String);

impl ProofToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProofToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "ProofToken({prefix}…)")
    }
}

/// A request that passed shape and address checks.
#[derive(Clone, Debug)]
pub struct ValidatedRequest {
    pub recipient: RecipientAddress,
    pub proof: ProofToken,
}
