//! Catalog listing and dynamic OpenAPI handlers

use super::{require_identity, HandlerError};
use crate::catalog::CatalogSnapshot;
use crate::dto::{ResponseEnvelope, ResponseMeta, ToolListing, ToolSummary};
use crate::middleware::{CallerIdentity, RequestId};
use crate::{openapi, AppState};
use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde_json::Value;

/// GET /tools
pub async fn list_tools(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<Json<ResponseEnvelope<ToolListing>>, HandlerError> {
    let identity = require_identity(&caller, &request_id)?;
    let access = state.effective_access(&identity).await;
    let registry = state.registry.load();

    let snapshot = state.catalog.list_tools(&registry, &access).await;
    let tools: Vec<ToolSummary> = snapshot.entries.iter().map(ToolSummary::from).collect();

    Ok(Json(ResponseEnvelope {
        success: true,
        data: ToolListing {
            count: tools.len(),
            tools,
            degraded_servers: snapshot.degraded.iter().map(|id| id.to_string()).collect(),
        },
        metadata: ResponseMeta::with_user(request_id.0, &identity.email),
    }))
}

/// GET /openapi.json
///
/// Anonymous callers get the static paths only; the per-tool surface is
/// scoped to the caller's authorized servers.
pub async fn openapi_document(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Json<Value> {
    let Some(identity) = caller.0 else {
        let empty = CatalogSnapshot { entries: Vec::new(), degraded: Vec::new() };
        return Json(openapi::build_document("", &[], &empty));
    };

    let access = state.effective_access(&identity).await;
    let registry = state.registry.load();
    let servers: Vec<_> = access
        .server_ids
        .iter()
        .filter_map(|id| registry.get_server(id))
        .collect();
    let snapshot = state.catalog.list_tools(&registry, &access).await;

    Json(openapi::build_document(&identity.email, &servers, &snapshot))
}
