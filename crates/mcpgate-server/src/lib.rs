//! MCP Proxy Gateway server
//!
//! One HTTP entry point fronting many MCP tool servers: identity
//! resolution, group-based access control, catalog aggregation and
//! request routing.

pub mod app_state;
pub mod catalog;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod invoker;
pub mod middleware;
pub mod openapi;
pub mod router;

pub use app_state::AppState;
pub use error::{ServerError, ServerResult};
pub use router::create_router;

use std::net::SocketAddr;

/// Serve the gateway on the given address.
pub async fn serve(app_state: AppState, addr: &str) -> ServerResult<()> {
    let app = create_router(app_state);

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| ServerError::InvalidInput(format!("Invalid address: {}", e)))?;

    tracing::info!("Starting gateway on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?,
        app,
    )
    .await
    .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
