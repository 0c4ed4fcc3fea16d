//! Gateway router

use crate::middleware::{IdentityLayer, RequestIdLayer};
use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

/// Create the gateway router. Static routes are registered alongside the
/// dynamic `/{server_id}` routes; axum gives the static ones precedence.
pub fn create_router(state: AppState) -> Router {
    let identity = IdentityLayer::new(state.resolver.clone());

    Router::new()
        .route("/health", get(handlers::system::health))
        .route("/servers", get(handlers::servers::list_servers))
        .route("/tools", get(handlers::tools::list_tools))
        .route("/openapi.json", get(handlers::tools::openapi_document))
        .route("/refresh", post(handlers::system::refresh))
        .route("/:server_id", get(handlers::servers::server_tools))
        .route("/:server_id/*tool_name", post(handlers::invoke::invoke_tool))
        .layer(ServiceBuilder::new().layer(RequestIdLayer).layer(identity))
        .with_state(state)
}
