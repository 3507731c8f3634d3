//! JSON-RPC 2.0 client for the ledger network.
//!
//! Methods:
//! - `ledger_getSequence [identity]` → integer (or decimal string)
//! - `ledger_submitTransaction [signedTransaction]` → transaction id string
//! - `ledger_totalSupply [contract]` → decimal string
//! - `ledger_supplyCap [contract]` → decimal string
//!
//! A JSON-RPC `error` object is a rejection by the ledger. Everything that
//! prevents us from getting a well-formed answer is a transport or
//! response error.

use crate::client::{LedgerClient, TokenQuery};
use crate::error::LedgerError;
use crate::transaction::SignedTransaction;

use async_trait::async_trait;
use capmint_types::{Address, ContractId, SequenceNumber, TransactionId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default timeout for a ledger round trip.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RpcLedgerClient {
    http_client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Integers arrive as JSON numbers from some nodes and as strings from
/// others (u128 does not fit a JSON number safely).
#[derive(Deserialize)]
#[serde(untagged)]
enum Quantity {
    Number(u64),
    Text(String),
}

impl Quantity {
    fn into_u128(self) -> Result<u128, LedgerError> {
        match self {
            Quantity::Number(n) => Ok(u128::from(n)),
            Quantity::Text(s) => s
                .parse::<u128>()
                .map_err(|e| LedgerError::InvalidResponse(format!("bad quantity {s:?}: {e}"))),
        }
    }
}

impl RpcLedgerClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<P, T>(&self, method: &str, params: P) -> Result<T, LedgerError>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // Hosted ledger endpoints often embed an API key in the URL.
                let e = e.without_url();
                if e.is_timeout() {
                    LedgerError::Transport(format!("{method} timed out"))
                } else if e.is_connect() {
                    LedgerError::Transport(format!("connection failed: {e}"))
                } else {
                    LedgerError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(LedgerError::Transport(format!(
                "{method}: HTTP status {}",
                response.status()
            )));
        }

        let body: RpcResponse<T> = response.json().await.map_err(|e| {
            LedgerError::InvalidResponse(format!("failed to parse {method} response: {e}"))
        })?;

        if let Some(err) = body.error {
            return Err(LedgerError::Rejected {
                code: err.code,
                message: err.message,
            });
        }
        body.result
            .ok_or_else(|| LedgerError::InvalidResponse(format!("{method}: missing result")))
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn current_sequence(&self, identity: &Address) -> Result<SequenceNumber, LedgerError> {
        let raw: Quantity = self.call("ledger_getSequence", [identity.to_string()]).await?;
        let value = raw.into_u128()?;
        u64::try_from(value)
            .map(SequenceNumber::new)
            .map_err(|_| LedgerError::InvalidResponse(format!("sequence {value} out of range")))
    }

    async fn submit_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<TransactionId, LedgerError> {
        let id: String = self
            .call("ledger_submitTransaction", [transaction])
            .await?;
        if id.trim().is_empty() {
            return Err(LedgerError::InvalidResponse(
                "ledger_submitTransaction: empty transaction id".into(),
            ));
        }
        Ok(TransactionId::new(id))
    }
}

#[async_trait]
impl TokenQuery for RpcLedgerClient {
    async fn total_supply(&self, contract: &ContractId) -> Result<u128, LedgerError> {
        let raw: Quantity = self.call("ledger_totalSupply", [contract.to_string()]).await?;
        raw.into_u128()
    }

    async fn supply_cap(&self, contract: &ContractId) -> Result<u128, LedgerError> {
        let raw: Quantity = self.call("ledger_supplyCap", [contract.to_string()]).await?;
        raw.into_u128()
    }
}
