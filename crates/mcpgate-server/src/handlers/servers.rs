//! Server listing handlers

use super::{require_identity, HandlerError};
use crate::dto::{ResponseEnvelope, ResponseMeta, ServerListing, ServerSummary, ToolSummary};
use crate::error::ServerError;
use crate::middleware::{CallerIdentity, RequestId};
use crate::AppState;
use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use mcpgate_core::ServerId;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// GET /servers
///
/// Anonymous callers under a Deny policy get an empty listing with a hint
/// rather than 401, so discovery UIs can render before login.
pub async fn list_servers(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
) -> Json<ResponseEnvelope<ServerListing>> {
    let Some(identity) = caller.0 else {
        let mut metadata = ResponseMeta::new(request_id.0);
        metadata.warnings = Some(vec![
            "No identity resolved; authenticate to see your servers".to_string(),
        ]);
        return Json(ResponseEnvelope {
            success: true,
            data: ServerListing { servers: BTreeMap::new(), total: 0 },
            metadata,
        });
    };

    let access = state.effective_access(&identity).await;
    let registry = state.registry.load();

    let mut servers: BTreeMap<String, Vec<ServerSummary>> = BTreeMap::new();
    let mut total = 0;
    for id in &access.server_ids {
        if let Some(descriptor) = registry.get_server(id) {
            servers
                .entry(descriptor.tier.as_str().to_string())
                .or_default()
                .push(ServerSummary::from(descriptor));
            total += 1;
        }
    }

    Json(ResponseEnvelope {
        success: true,
        data: ServerListing { servers, total },
        metadata: ResponseMeta::with_user(request_id.0, &identity.email),
    })
}

/// GET /{server_id}
pub async fn server_tools(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path(server_id): Path<String>,
) -> Result<Json<ResponseEnvelope<Value>>, HandlerError> {
    let identity = require_identity(&caller, &request_id)?;
    let server_id = ServerId::new(server_id);
    let registry = state.registry.load();

    let descriptor = registry
        .get_server(&server_id)
        .filter(|s| s.enabled)
        .ok_or_else(|| {
            ServerError::NotFound(format!("Unknown server '{server_id}'"))
                .to_http_response(request_id.0.clone())
        })?;

    let access = state.effective_access(&identity).await;
    if !access.contains(&server_id) {
        return Err(ServerError::Forbidden(format!(
            "Access to server '{server_id}' is not granted by your groups"
        ))
        .to_http_response(request_id.0.clone()));
    }

    let (entries, degraded) = state
        .catalog
        .tools_for_server(descriptor)
        .await
        .map_err(|e| ServerError::from(e).to_http_response(request_id.0.clone()))?;

    Ok(Json(ResponseEnvelope {
        success: true,
        data: json!({
            "server": ServerSummary::from(descriptor),
            "tools": entries.iter().map(ToolSummary::from).collect::<Vec<_>>(),
            "degraded": degraded,
        }),
        metadata: ResponseMeta::with_user(request_id.0, &identity.email),
    }))
}
