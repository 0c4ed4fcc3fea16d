//! Health and cache administration handlers

use super::{require_identity, HandlerError};
use crate::dto::{ResponseEnvelope, ResponseMeta};
use crate::middleware::{CallerIdentity, RequestId};
use crate::AppState;
use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde_json::{json, Value};

/// GET /health
pub async fn health(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<ResponseEnvelope<Value>> {
    let registry = state.registry.load();
    let database = if state.store.healthy().await { "connected" } else { "degraded" };

    Json(ResponseEnvelope {
        success: true,
        data: json!({
            "status": "healthy",
            "service": "mcpgate",
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "servers": registry.list_enabled_servers().len(),
            "cached_tools": state.catalog.cached_count().await,
        }),
        metadata: ResponseMeta::new(request_id.0),
    })
}

/// POST /refresh
pub async fn refresh(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<Json<ResponseEnvelope<Value>>, HandlerError> {
    let identity = require_identity(&caller, &request_id)?;

    state.catalog.invalidate_all().await;
    tracing::info!(user = %identity.email, "catalog caches invalidated");

    Ok(Json(ResponseEnvelope {
        success: true,
        data: json!({"refreshed": true}),
        metadata: ResponseMeta::with_user(request_id.0, &identity.email),
    }))
}
