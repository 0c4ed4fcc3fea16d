//! Tool invocation handler

use super::{require_identity, HandlerError};
use crate::dto::{ResponseEnvelope, ResponseMeta};
use crate::error::ServerError;
use crate::middleware::{CallerIdentity, RequestId};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    response::Json,
};
use mcpgate_core::ServerId;
use serde_json::Value;

/// POST /{server_id}/{tool_name}
///
/// The body is the tool's JSON arguments. Some clients wrap them as
/// `{"arguments": {...}}`; that wrapper is unwrapped transparently. An empty
/// body means no arguments; a non-empty body that is not valid JSON is a 400,
/// never a silent `{}`.
pub async fn invoke_tool(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(caller): Extension<CallerIdentity>,
    Path((server_id, tool_name)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<ResponseEnvelope<Value>>, HandlerError> {
    let identity = require_identity(&caller, &request_id)?;
    let server_id = ServerId::new(server_id);

    let body = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            ServerError::InvalidInput(format!("request body is not valid JSON: {err}"))
                .to_http_response(request_id.0.clone())
        })?
    };
    let arguments = match body {
        Value::Object(ref map) if map.len() == 1 && map.contains_key("arguments") => {
            map["arguments"].clone()
        }
        other => other,
    };

    let registry = state.registry.load();
    let access = state.effective_access(&identity).await;

    let result = state
        .invoker
        .invoke(&registry, &identity, &access, &server_id, &tool_name, &arguments)
        .await
        .map_err(|e| e.to_http_response(request_id.0.clone()))?;

    Ok(Json(ResponseEnvelope {
        success: true,
        data: result,
        metadata: ResponseMeta::with_user(request_id.0, &identity.email),
    }))
}
