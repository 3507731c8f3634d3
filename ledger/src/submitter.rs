//! Builds, signs and dispatches mint transactions.

use crate::client::LedgerClient;
use crate::error::SubmitError;
use crate::transaction::MintTransaction;

use capmint_crypto::derive_identity;
use capmint_types::{
    Address, ContractId, KeyPair, MintAmount, RecipientAddress, SequenceNumber, TransactionId,
};
use std::sync::Arc;

/// Submits mint calls to the token contract on behalf of one signing key.
///
/// `submit` makes exactly one call to the ledger client and never retries:
/// the sequence number it was given is spent as soon as that call is made.
pub struct LedgerSubmitter {
    client: Arc<dyn LedgerClient>,
    keypair: KeyPair,
    identity: Address,
    contract: ContractId,
}

impl LedgerSubmitter {
    pub fn new(client: Arc<dyn LedgerClient>, keypair: KeyPair, contract: ContractId) -> Self {
        let identity = derive_identity(&keypair.public);
        Self {
            client,
            keypair,
            identity,
            contract,
        }
    }

    /// The ledger address transactions are sent from.
    pub fn identity(&self) -> &Address {
        &self.identity
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    pub fn client(&self) -> &Arc<dyn LedgerClient> {
        &self.client
    }

    /// Build, sign and send `mint(recipient, amount)` using `sequence`.
    ///
    /// Returns once the network accepted the transaction (not confirmed).
    /// [`SubmitError::NotDispatched`] means the ledger client was never
    /// called; any other error means the number is spent.
    pub async fn submit(
        &self,
        recipient: &RecipientAddress,
        amount: MintAmount,
        sequence: SequenceNumber,
    ) -> Result<TransactionId, SubmitError> {
        let signed = MintTransaction::mint(self.identity, sequence, self.contract, *recipient, amount)
            .sign(&self.keypair)
            .map_err(|e| SubmitError::NotDispatched(format!("encoding failed: {e}")))?;

        tracing::debug!(
            sequence = %sequence,
            %recipient,
            hash = %signed.hash_hex(),
            "dispatching mint transaction"
        );

        let transaction_id = self.client.submit_transaction(&signed).await?;
        Ok(transaction_id)
    }
}
