//! Result of one proof-of-humanity check.

use crate::error::VerifierError;
use std::collections::BTreeSet;

/// Verdict on a single proof token. Never cached or reused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Accepted,
    /// The oracle rejected the token; `reasons` holds its error codes.
    Rejected { reasons: BTreeSet<String> },
    /// No trustworthy verdict could be obtained.
    VerifierUnavailable(VerifierError),
}

impl VerificationOutcome {
    pub fn rejected<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        VerificationOutcome::Rejected {
            reasons: reasons.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationOutcome::Accepted)
    }
}
