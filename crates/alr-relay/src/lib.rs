//! Audit log relay: fetch a compressed log delivery, rewrite it as
//! partitioned JSON Lines, and publish it.
//!
//! Entry points are the `run` command (one object, then exit) and the
//! HTTP invocation endpoint served by [`serve`].

pub mod cli;
pub mod driver;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;

pub use driver::{Relay, RelayOutcome};

/// Build the application router around a relay.
pub fn app(relay: Arc<Relay>) -> Router {
    app_with_state(AppState::new(relay))
}

/// Build the application router with a custom state.
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::invoke_routes())
        .with_state(state)
}

/// Serve the invocation API until Ctrl-C.
pub async fn serve(relay: Arc<Relay>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening for invocations");
    axum::serve(listener, app(relay))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
