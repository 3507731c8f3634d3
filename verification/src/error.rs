use thiserror::Error;

/// Why the oracle could not produce a verdict.
///
/// None of these messages carry the verification secret.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerifierError {
    #[error("verification oracle timed out")]
    Timeout,

    #[error("verification oracle unreachable: {0}")]
    Unreachable(String),

    #[error("verification oracle returned HTTP {0}")]
    HttpStatus(u16),

    #[error("invalid response from verification oracle: {0}")]
    InvalidResponse(String),

    #[error("verification request failed: {0}")]
    RequestFailed(String),
}
