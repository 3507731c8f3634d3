//! HTTP API for the capmint gateway.
//!
//! Routes:
//! - `POST /token/mint`: run one request through the minting gateway
//! - `GET /token/cap`, `GET /token/supply`: read-only issuance state
//! - `GET /token/price`: always 404, the token has no price
//! - `GET /healthcheck`
//! - `GET /metrics`: Prometheus text exposition

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::RpcError;
pub use handlers::AppState;
pub use metrics::GatewayMetrics;
pub use server::{build_router, serve, RpcServer};
