use thiserror::Error;

/// Failure reported by, or while talking to, the ledger network client.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The ledger (or the token contract) refused the transaction, e.g. the
    /// issuance cap would be exceeded or the sequence number is stale.
    #[error("ledger rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },

    /// The ledger endpoint could not be reached or answered with a non-2xx.
    #[error("ledger transport error: {0}")]
    Transport(String),

    /// The ledger answered with something we could not understand.
    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, LedgerError::Rejected { .. })
    }
}

/// Failure of one [`LedgerSubmitter::submit`](crate::LedgerSubmitter::submit)
/// call.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The transaction could not be built or signed; nothing reached the
    /// ledger client and the sequence number may be handed back.
    #[error("transaction not dispatched: {0}")]
    NotDispatched(String),

    /// The ledger client was called and failed. The sequence number is spent.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl SubmitError {
    /// Whether the ledger client was called.
    pub fn was_dispatched(&self) -> bool {
        matches!(self, SubmitError::Ledger(_))
    }
}
