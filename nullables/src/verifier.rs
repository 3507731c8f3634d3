//! Nullable verification oracle with scripted verdicts, recorded calls.

use async_trait::async_trait;
use capmint_types::ProofToken;
use capmint_verification::{HumanityVerifier, VerificationOutcome};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A verifier that answers from a per-token script.
///
/// Tokens without a scripted verdict get the default verdict.
pub struct NullVerifier {
    script: HashMap<String, VerificationOutcome>,
    default: VerificationOutcome,
    delay: Option<Duration>,
    seen: Mutex<Vec<String>>,
}

impl NullVerifier {
    /// Accept every token.
    pub fn accepting() -> Self {
        Self::with_default(VerificationOutcome::Accepted)
    }

    /// Reject every token with `invalid-input-response`.
    pub fn rejecting() -> Self {
        Self::with_default(VerificationOutcome::rejected(["invalid-input-response"]))
    }

    pub fn with_default(default: VerificationOutcome) -> Self {
        Self {
            script: HashMap::new(),
            default,
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Script the verdict for one token.
    pub fn on(mut self, token: impl Into<String>, outcome: VerificationOutcome) -> Self {
        self.script.insert(token.into(), outcome);
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of verify calls made so far.
    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Tokens seen, in call order.
    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HumanityVerifier for NullVerifier {
    fn name(&self) -> &str {
        "null-verifier"
    }

    async fn verify(&self, proof: &ProofToken) -> VerificationOutcome {
        self.seen.lock().unwrap().push(proof.as_str().to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .get(proof.as_str())
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capmint_verification::VerifierError;

    #[tokio::test]
    async fn scripted_tokens_override_default() {
        let verifier = NullVerifier::rejecting()
            .on("good-token", VerificationOutcome::Accepted)
            .on("down", VerificationOutcome::VerifierUnavailable(VerifierError::Timeout));

        assert!(verifier.verify(&ProofToken::new("good-token")).await.is_accepted());
        assert_eq!(
            verifier.verify(&ProofToken::new("bad-token")).await,
            VerificationOutcome::rejected(["invalid-input-response"])
        );
        assert_eq!(
            verifier.verify(&ProofToken::new("down")).await,
            VerificationOutcome::VerifierUnavailable(VerifierError::Timeout)
        );
        assert_eq!(verifier.calls(), 3);
        assert_eq!(verifier.seen_tokens(), vec!["good-token", "bad-token", "down"]);
    }
}
