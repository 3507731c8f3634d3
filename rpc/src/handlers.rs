//! RPC request handlers.

use crate::error::RpcError;
use crate::metrics::GatewayMetrics;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use capmint_gateway::MintGateway;
use capmint_ledger::TokenQuery;
use capmint_types::{MintOutcome, MintRequest, MintStatus, TransactionId};
use serde::Serialize;
use std::sync::Arc;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<MintGateway>,
    pub token: Arc<dyn TokenQuery>,
    pub metrics: Option<Arc<GatewayMetrics>>,
}

// ── Mint ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintResponse {
    pub status: MintStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
}

impl From<&MintOutcome> for MintResponse {
    fn from(outcome: &MintOutcome) -> Self {
        Self {
            status: outcome.status(),
            transaction_id: outcome.transaction_id().cloned(),
        }
    }
}

/// HTTP status for each terminal mint status.
pub fn http_status(status: MintStatus) -> StatusCode {
    match status {
        MintStatus::Submitted => StatusCode::OK,
        MintStatus::InvalidInput => StatusCode::BAD_REQUEST,
        MintStatus::VerificationFailed => StatusCode::FORBIDDEN,
        MintStatus::VerifierError => StatusCode::SERVICE_UNAVAILABLE,
        MintStatus::SubmissionFailed => StatusCode::BAD_GATEWAY,
    }
}

fn mint_response(state: &AppState, outcome: &MintOutcome) -> Response {
    let status = outcome.status();
    if let Some(metrics) = &state.metrics {
        metrics.record_outcome(status);
    }
    (http_status(status), Json(MintResponse::from(outcome))).into_response()
}

/// `POST /token/mint`
///
/// The gateway runs in its own task: if the client goes away mid-request,
/// a transaction that already holds a sequence number is still dispatched.
pub async fn mint(
    State(state): State<AppState>,
    payload: Result<Json<MintRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "unreadable mint request");
            return mint_response(&state, &MintOutcome::InvalidInput);
        }
    };

    let gateway = Arc::clone(&state.gateway);
    let outcome = match tokio::spawn(async move { gateway.mint(request).await }).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => {
            // Only a broken sequence counter panics in there. Carrying on
            // would hand out numbers the ledger never sees in order.
            tracing::error!("mint task panicked: {e}; aborting");
            std::process::abort();
        }
        Err(e) => {
            tracing::error!("mint task cancelled: {e}");
            MintOutcome::SubmissionFailed {
                cause: "gateway shutting down".into(),
            }
        }
    };
    mint_response(&state, &outcome)
}

// ── Token state ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CapResponse {
    pub cap: String,
}

#[derive(Debug, Serialize)]
pub struct SupplyResponse {
    pub supply: String,
}

/// `GET /token/cap`
pub async fn cap(State(state): State<AppState>) -> Result<Json<CapResponse>, RpcError> {
    let cap = state.token.supply_cap(state.gateway.contract()).await?;
    Ok(Json(CapResponse {
        cap: cap.to_string(),
    }))
}

/// `GET /token/supply`
pub async fn supply(State(state): State<AppState>) -> Result<Json<SupplyResponse>, RpcError> {
    let supply = state.token.total_supply(state.gateway.contract()).await?;
    Ok(Json(SupplyResponse {
        supply: supply.to_string(),
    }))
}

/// `GET /token/price`
pub async fn price() -> RpcError {
    RpcError::NotFound("token price")
}

// ── Operations ───────────────────────────────────────────────────────────

/// `GET /healthcheck`
pub async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Result<Response, RpcError> {
    let metrics = state.metrics.as_ref().ok_or(RpcError::NotFound("metrics"))?;
    metrics.set_next_sequence(state.gateway.signer().next_hint());
    let body = metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
