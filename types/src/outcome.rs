//! Terminal outcomes of a mint request.

use crate::txid::TransactionId;
use serde::Serialize;
use std::fmt;

/// The single result every mint request resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MintOutcome {
    /// The ledger network accepted the transaction (not yet confirmed).
    Submitted { transaction_id: TransactionId },
    /// Malformed address or missing proof token.
    InvalidInput,
    /// The oracle rejected the proof token.
    VerificationFailed,
    /// The oracle could not be reached or answered nonsense.
    VerifierError,
    /// The ledger client rejected or failed to accept the transaction.
    SubmissionFailed { cause: String },
}

/// Caller-facing status string of a [`MintOutcome`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MintStatus {
    Submitted,
    InvalidInput,
    VerificationFailed,
    VerifierError,
    SubmissionFailed,
}

impl MintOutcome {
    pub fn status(&self) -> MintStatus {
        match self {
            MintOutcome::Submitted { .. } => MintStatus::Submitted,
            MintOutcome::InvalidInput => MintStatus::InvalidInput,
            MintOutcome::VerificationFailed => MintStatus::VerificationFailed,
            MintOutcome::VerifierError => MintStatus::VerifierError,
            MintOutcome::SubmissionFailed { .. } => MintStatus::SubmissionFailed,
        }
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        match self {
            MintOutcome::Submitted { transaction_id } => Some(transaction_id),
            _ => None,
        }
    }
}

impl MintStatus {
    pub const ALL: [MintStatus; 5] = [
        MintStatus::Submitted,
        MintStatus::InvalidInput,
        MintStatus::VerificationFailed,
        MintStatus::VerifierError,
        MintStatus::SubmissionFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MintStatus::Submitted => "submitted",
            MintStatus::InvalidInput => "invalid_input",
            MintStatus::VerificationFailed => "verification_failed",
            MintStatus::VerifierError => "verifier_error",
            MintStatus::SubmissionFailed => "submission_failed",
        }
    }

    /// Whether the failure is the caller's fault (4xx) rather than ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, MintStatus::InvalidInput | MintStatus::VerificationFailed)
    }

    /// Whether the failure is an infrastructure problem (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, MintStatus::VerifierError | MintStatus::SubmissionFailed)
    }
}

impl fmt::Display for MintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
