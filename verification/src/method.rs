//! The verifier seam the gateway depends on.

use crate::outcome::VerificationOutcome;
use async_trait::async_trait;
use capmint_types::ProofToken;

/// A source of proof-of-humanity verdicts.
///
/// Implementations:
/// - [`OracleClient`](crate::OracleClient): the real HTTP oracle
/// - `capmint_nullables::NullVerifier`: scripted verdicts for tests
///
/// `verify` must make at most one call to the oracle and must not retry.
#[async_trait]
pub trait HumanityVerifier: Send + Sync {
    /// Human-readable name of this verifier, for logs.
    fn name(&self) -> &str;

    async fn verify(&self, proof: &ProofToken) -> VerificationOutcome;
}
