//! Seams to the ledger network.

use crate::error::LedgerError;
use crate::transaction::SignedTransaction;
use async_trait::async_trait;
use capmint_types::{Address, ContractId, SequenceNumber, TransactionId};

/// The write side of the ledger network client.
///
/// Implementations:
/// - [`RpcLedgerClient`](crate::RpcLedgerClient): JSON-RPC over HTTP
/// - `capmint_nullables::NullLedger`: in-memory ledger for tests
///
/// Transport retries, if any, live inside the implementation. A returned
/// error is final for that call.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// The next sequence number the ledger expects from `identity`,
    /// counting transactions still pending.
    async fn current_sequence(&self, identity: &Address) -> Result<SequenceNumber, LedgerError>;

    /// Hand a signed transaction to the network. Returns as soon as the
    /// network accepted it, before confirmation.
    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<TransactionId, LedgerError>;
}

/// Read-only view of the token contract's issuance state.
#[async_trait]
pub trait TokenQuery: Send + Sync {
    /// Total amount issued so far, in raw units.
    async fn total_supply(&self, contract: &ContractId) -> Result<u128, LedgerError>;

    /// Issuance cap enforced by the contract, in raw units.
    async fn supply_cap(&self, contract: &ContractId) -> Result<u128, LedgerError>;
}
