//! Axum-based HTTP server.

use crate::error::RpcError;
use crate::handlers::{self, AppState};

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Build the router with every route and permissive CORS (the browser
/// front end is served from another origin).
pub fn build_router(state: AppState) -> Router {
    let token_routes = Router::new()
        .route("/mint", post(handlers::mint))
        .route("/cap", get(handlers::cap))
        .route("/supply", get(handlers::supply))
        .route("/price", get(handlers::price));

    Router::new()
        .nest("/token", token_routes)
        .route("/healthcheck", get(handlers::healthcheck))
        .route("/metrics", get(handlers::metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub struct RpcServer {
    pub addr: SocketAddr,
    pub state: AppState,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until a shutdown signal arrives.
    pub async fn start(self, shutdown: broadcast::Receiver<()>) -> Result<(), RpcError> {
        let listener = TcpListener::bind(self.addr).await?;
        serve(listener, self.state, shutdown).await
    }
}

/// Serve on an already bound listener until a shutdown signal arrives.
///
/// In-flight mint tasks are not cancelled by shutdown; they finish their
/// dispatch on their own.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), RpcError> {
    let addr = listener.local_addr()?;
    info!("HTTP server listening on {addr}");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            info!("HTTP server stopping");
        })
        .await?;
    Ok(())
}
