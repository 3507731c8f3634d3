//! The end-to-end mint flow.

use crate::error::GatewayError;
use crate::validator::validate;

use capmint_ledger::{LedgerClient, LedgerSubmitter, SubmitError};
use capmint_sequencer::{SequenceSlot, SequencedSigner};
use capmint_types::{
    ContractId, KeyPair, MintAmount, MintOutcome, MintRequest, RecipientAddress, SequenceNumber,
};
use capmint_verification::{HumanityVerifier, VerificationOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Upper bound on one verification round trip unless configured otherwise.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Composes validation, verification, sequencing and submission.
///
/// One instance serves every request for one signing identity and one
/// contract. [`MintGateway::mint`] may be called concurrently; requests
/// only ever wait on each other while holding a sequence slot.
///
/// Dropping a `mint` future is safe at any point. Once a request holds a
/// sequence slot, signing and dispatch run in a task of their own and
/// finish even if the caller has gone away.
pub struct MintGateway {
    verifier: Arc<dyn HumanityVerifier>,
    signer: Arc<SequencedSigner>,
    submitter: Arc<LedgerSubmitter>,
    amount: MintAmount,
    verify_timeout: Duration,
}

impl MintGateway {
    /// Assemble a gateway from parts.
    ///
    /// `signer` must count for the identity of the submitter's signing key.
    pub fn new(
        verifier: Arc<dyn HumanityVerifier>,
        signer: Arc<SequencedSigner>,
        submitter: LedgerSubmitter,
        amount: MintAmount,
    ) -> Result<Self, GatewayError> {
        if signer.identity() != submitter.identity() {
            return Err(GatewayError::IdentityMismatch {
                signer: *signer.identity(),
                key: *submitter.identity(),
            });
        }
        Ok(Self {
            verifier,
            signer,
            submitter: Arc::new(submitter),
            amount,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
        })
    }

    /// Build a gateway whose sequence counter is seeded from the ledger's
    /// current view of the signing identity.
    pub async fn connect(
        verifier: Arc<dyn HumanityVerifier>,
        ledger: Arc<dyn LedgerClient>,
        keypair: KeyPair,
        contract: ContractId,
        amount: MintAmount,
    ) -> Result<Self, GatewayError> {
        let submitter = LedgerSubmitter::new(ledger, keypair, contract);
        let identity = *submitter.identity();
        let seed = submitter.client().current_sequence(&identity).await?;
        let signer = Arc::new(SequencedSigner::new(identity, seed));
        Self::new(verifier, signer, submitter, amount)
    }

    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    pub fn signer(&self) -> &Arc<SequencedSigner> {
        &self.signer
    }

    pub fn amount(&self) -> MintAmount {
        self.amount
    }

    pub fn contract(&self) -> &ContractId {
        self.submitter.contract()
    }

    /// Handle one mint request to completion.
    ///
    /// Always resolves to exactly one [`MintOutcome`]; no step is retried.
    pub async fn mint(&self, request: MintRequest) -> MintOutcome {
        let span = tracing::info_span!(
            "mint",
            recipient = request.recipient_address.as_deref().unwrap_or_default()
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: MintRequest) -> MintOutcome {
        let validated = match validate(&request) {
            Ok(validated) => validated,
            Err(reason) => {
                tracing::debug!(%reason, "rejected invalid input");
                return MintOutcome::InvalidInput;
            }
        };

        let verdict = tokio::time::timeout(self.verify_timeout, self.verifier.verify(&validated.proof))
            .await;
        match verdict {
            Ok(VerificationOutcome::Accepted) => {
                tracing::debug!(verifier = self.verifier.name(), "humanity proof accepted");
            }
            Ok(VerificationOutcome::Rejected { reasons }) => {
                tracing::debug!(?reasons, "humanity proof rejected");
                return MintOutcome::VerificationFailed;
            }
            Ok(VerificationOutcome::VerifierUnavailable(cause)) => {
                tracing::warn!(%cause, "verification oracle unavailable");
                return MintOutcome::VerifierError;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.verify_timeout.as_millis() as u64,
                    "verification oracle timed out"
                );
                return MintOutcome::VerifierError;
            }
        }

        self.submit(&validated.recipient).await
    }

    /// Sequence and dispatch. The slot is held across the ledger call so
    /// dispatch order equals sequence order.
    async fn submit(&self, recipient: &RecipientAddress) -> MintOutcome {
        let slot = self.signer.acquire().await;
        let sequence: SequenceNumber = slot.number();
        tracing::info!(%sequence, "sequence number assigned");

        // No await between acquiring and spawning: from here the slot is
        // owned by the dispatch task, never by the caller's future.
        let task = tokio::spawn(
            dispatch(Arc::clone(&self.submitter), slot, *recipient, self.amount)
                .in_current_span(),
        );
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(%sequence, "dispatch task failed: {e}");
                MintOutcome::SubmissionFailed {
                    cause: format!("dispatch task failed: {e}"),
                }
            }
        }
    }
}

async fn dispatch(
    submitter: Arc<LedgerSubmitter>,
    mut slot: SequenceSlot,
    recipient: RecipientAddress,
    amount: MintAmount,
) -> MintOutcome {
    let sequence = slot.number();
    slot.mark_dispatching();

    match submitter.submit(&recipient, amount, sequence).await {
        Ok(transaction_id) => {
            slot.commit();
            tracing::info!(%sequence, %transaction_id, "mint submitted");
            MintOutcome::Submitted { transaction_id }
        }
        Err(SubmitError::NotDispatched(cause)) => {
            slot.release();
            tracing::error!(%sequence, %cause, "mint abandoned before dispatch");
            MintOutcome::SubmissionFailed { cause }
        }
        Err(SubmitError::Ledger(err)) => {
            // Dispatched: the number is spent whatever the ledger said.
            slot.commit();
            if err.is_rejection() {
                tracing::warn!(%sequence, cause = %err, "ledger rejected mint");
            } else {
                tracing::error!(%sequence, cause = %err, "mint submission failed");
            }
            MintOutcome::SubmissionFailed {
                cause: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capmint_crypto::keypair_from_seed;
    use capmint_nullables::{NullLedger, NullVerifier};
    use capmint_types::Address;

    const RECIPIENT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    async fn gateway(verifier: NullVerifier, ledger: Arc<NullLedger>) -> MintGateway {
        let contract = Address::parse("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359").unwrap();
        MintGateway::connect(
            Arc::new(verifier),
            ledger,
            keypair_from_seed(&[3u8; 32]),
            contract,
            MintAmount::new(100),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn connect_seeds_signer_from_ledger() {
        let ledger = Arc::new(NullLedger::new(17));
        let gateway = gateway(NullVerifier::accepting(), ledger).await;
        assert_eq!(gateway.signer().seed(), SequenceNumber::new(17));
        assert_eq!(gateway.signer().current().await, SequenceNumber::new(17));
    }

    #[tokio::test]
    async fn accepted_request_is_submitted_with_next_sequence() {
        let ledger = Arc::new(NullLedger::new(4));
        let gateway = gateway(NullVerifier::accepting(), ledger.clone()).await;

        let outcome = gateway.mint(MintRequest::new(RECIPIENT, "good-token")).await;
        let id = outcome.transaction_id().expect("submitted").clone();
        assert!(id.as_str().starts_with("0x"));
        assert_eq!(ledger.dispatched_sequences(), vec![4]);
        assert_eq!(ledger.supply(), 100);
    }

    #[tokio::test]
    async fn invalid_input_never_touches_oracle_or_counter() {
        let ledger = Arc::new(NullLedger::new(0));
        let verifier = Arc::new(NullVerifier::accepting());
        let contract = Address::parse("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359").unwrap();
        let gateway = MintGateway::connect(
            verifier.clone(),
            ledger.clone(),
            keypair_from_seed(&[3u8; 32]),
            contract,
            MintAmount::new(1),
        )
        .await
        .unwrap();

        let outcome = gateway.mint(MintRequest::new("0x1234", "good-token")).await;
        assert_eq!(outcome, MintOutcome::InvalidInput);
        assert_eq!(verifier.calls(), 0);
        assert_eq!(gateway.signer().current().await, SequenceNumber::new(0));
    }

    #[test]
    fn signer_for_another_identity_is_refused() {
        let contract = Address::parse("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359").unwrap();
        let submitter = LedgerSubmitter::new(
            Arc::new(NullLedger::new(0)),
            keypair_from_seed(&[3u8; 32]),
            contract,
        );
        let stranger = Address::from_bytes([0x42; 20]);
        let signer = Arc::new(SequencedSigner::new(stranger, SequenceNumber::new(0)));

        let result = MintGateway::new(
            Arc::new(NullVerifier::accepting()),
            signer,
            submitter,
            MintAmount::new(1),
        );
        match result {
            Err(GatewayError::IdentityMismatch { signer, .. }) => assert_eq!(signer, stranger),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("mismatched signer accepted"),
        }
    }

    #[tokio::test]
    async fn slow_oracle_becomes_verifier_error() {
        let ledger = Arc::new(NullLedger::new(0));
        let verifier = NullVerifier::accepting().with_delay(Duration::from_millis(500));
        let gateway = gateway(verifier, ledger.clone())
            .await
            .with_verify_timeout(Duration::from_millis(20));

        let outcome = gateway.mint(MintRequest::new(RECIPIENT, "good-token")).await;
        assert_eq!(outcome, MintOutcome::VerifierError);
        assert!(ledger.dispatched().is_empty());
    }
}
