//! Nullable ledger: an in-memory ledger that behaves like a strict one.
//!
//! Like a real network it:
//! - expects an identity's transactions in exact sequence order and rejects
//!   anything else,
//! - verifies signatures,
//! - lets the token contract refuse mints beyond the issuance cap while
//!   still consuming the sequence number.

use async_trait::async_trait;
use capmint_ledger::{ContractCall, LedgerClient, LedgerError, SignedTransaction, TokenQuery};
use capmint_types::{Address, ContractId, SequenceNumber, TransactionId};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Error code used for out-of-order sequence numbers.
pub const CODE_BAD_SEQUENCE: i64 = -32001;
/// Error code used when the contract refuses the mint.
pub const CODE_REVERTED: i64 = -32000;
/// Error code used for invalid signatures.
pub const CODE_BAD_SIGNATURE: i64 = -32002;

/// One transaction as it arrived at the ledger.
#[derive(Clone, Debug)]
pub struct DispatchRecord {
    pub sequence: SequenceNumber,
    pub transaction: SignedTransaction,
    /// `None` if accepted, otherwise what the ledger answered.
    pub error: Option<LedgerError>,
}

struct State {
    next_sequence: SequenceNumber,
    total_supply: u128,
    dispatched: Vec<DispatchRecord>,
    /// Failures to return for the next submissions, before anything else.
    injected: VecDeque<LedgerError>,
}

pub struct NullLedger {
    cap: u128,
    delay: Option<Duration>,
    state: Mutex<State>,
}

impl NullLedger {
    /// A ledger whose signer is at `sequence`, with no supply and no cap.
    pub fn new(sequence: u64) -> Self {
        Self {
            cap: u128::MAX,
            delay: None,
            state: Mutex::new(State {
                next_sequence: SequenceNumber::new(sequence),
                total_supply: 0,
                dispatched: Vec::new(),
                injected: VecDeque::new(),
            }),
        }
    }

    pub fn with_cap(mut self, cap: u128) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_supply(self, supply: u128) -> Self {
        self.state.lock().unwrap().total_supply = supply;
        self
    }

    /// Sleep this long inside every submission (after recording arrival).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the next submission fail with `error` without reaching the
    /// sequence or cap checks.
    pub fn fail_next(&self, error: LedgerError) {
        self.state.lock().unwrap().injected.push_back(error);
    }

    /// Every transaction received, in arrival order.
    pub fn dispatched(&self) -> Vec<DispatchRecord> {
        self.state.lock().unwrap().dispatched.clone()
    }

    /// Sequence numbers received, in arrival order.
    pub fn dispatched_sequences(&self) -> Vec<u64> {
        self.dispatched()
            .iter()
            .map(|record| record.sequence.value())
            .collect()
    }

    /// The next sequence number the ledger expects.
    pub fn next_sequence(&self) -> SequenceNumber {
        self.state.lock().unwrap().next_sequence
    }

    pub fn supply(&self) -> u128 {
        self.state.lock().unwrap().total_supply
    }

    fn apply(&self, state: &mut State, tx: &SignedTransaction) -> Result<TransactionId, LedgerError> {
        if let Some(error) = state.injected.pop_front() {
            return Err(error);
        }
        if !tx.verify() {
            return Err(LedgerError::Rejected {
                code: CODE_BAD_SIGNATURE,
                message: "invalid signature".into(),
            });
        }
        if tx.transaction.sequence != state.next_sequence {
            return Err(LedgerError::Rejected {
                code: CODE_BAD_SEQUENCE,
                message: format!(
                    "sequence out of order: expected {}, got {}",
                    state.next_sequence, tx.transaction.sequence
                ),
            });
        }

        // From here on the sequence number is consumed, even if the
        // contract call reverts.
        state.next_sequence = state.next_sequence.checked_next().ok_or_else(|| {
            LedgerError::Rejected {
                code: CODE_BAD_SEQUENCE,
                message: "sequence space exhausted".into(),
            }
        })?;

        let ContractCall::Mint { amount, .. } = &tx.transaction.call;
        let new_supply = state.total_supply.checked_add(amount.raw());
        match new_supply {
            Some(supply) if supply <= self.cap => {
                state.total_supply = supply;
                Ok(TransactionId::new(tx.hash_hex()))
            }
            _ => Err(LedgerError::Rejected {
                code: CODE_REVERTED,
                message: "execution reverted: ERC20Capped: cap exceeded".into(),
            }),
        }
    }
}

#[async_trait]
impl LedgerClient for NullLedger {
    async fn current_sequence(&self, _identity: &Address) -> Result<SequenceNumber, LedgerError> {
        Ok(self.next_sequence())
    }

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<TransactionId, LedgerError> {
        let result = {
            let mut state = self.state.lock().unwrap();
            let result = self.apply(&mut state, transaction);
            state.dispatched.push(DispatchRecord {
                sequence: transaction.transaction.sequence,
                transaction: transaction.clone(),
                error: result.as_ref().err().cloned(),
            });
            result
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl TokenQuery for NullLedger {
    async fn total_supply(&self, _contract: &ContractId) -> Result<u128, LedgerError> {
        Ok(self.supply())
    }

    async fn supply_cap(&self, _contract: &ContractId) -> Result<u128, LedgerError> {
        Ok(self.cap)
    }
}
