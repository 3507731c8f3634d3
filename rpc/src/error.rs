//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use capmint_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RpcError::Ledger(_) => StatusCode::BAD_GATEWAY,
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Metrics(_) | RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for RpcError {
    fn from(e: std::io::Error) -> Self {
        RpcError::Server(e.to_string())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
