//! HTTP handlers

pub mod invoke;
pub mod servers;
pub mod system;
pub mod tools;

use crate::error::{ErrorResponse, ServerError};
use crate::middleware::{CallerIdentity, RequestId};
use axum::{http::StatusCode, response::Json};
use mcpgate_core::Identity;

pub(crate) type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Reject anonymous callers with 401; handlers that tolerate anonymous
/// access read `CallerIdentity` directly instead.
pub(crate) fn require_identity(
    caller: &CallerIdentity,
    request_id: &RequestId,
) -> Result<Identity, HandlerError> {
    caller
        .0
        .clone()
        .ok_or_else(|| ServerError::IdentityUnresolved.to_http_response(request_id.0.clone()))
}
