//! Server error types

use axum::{http::StatusCode, response::Json};
use mcpgate_client::ClientError;
use serde::Serialize;

pub type ServerResult<T> = Result<T, ServerError>;

/// Gateway error enum
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Identity could not be resolved")]
    IdentityUnresolved,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The backend executed the tool and reported a failure; the original
    /// payload rides along so callers can inspect it.
    #[error("Tool execution failed")]
    ToolExecution(serde_json::Value),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClientError> for ServerError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unavailable(msg) => ServerError::UpstreamUnavailable(msg),
            ClientError::ToolError(payload) => ServerError::ToolExecution(payload),
            ClientError::Protocol(msg) => ServerError::UpstreamUnavailable(msg),
        }
    }
}

impl From<mcpgate_store::StoreError> for ServerError {
    fn from(err: mcpgate_store::StoreError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

/// Error response DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub metadata: super::dto::ResponseMeta,
}

#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    pub fn to_http_response(&self, request_id: String) -> (StatusCode, Json<ErrorResponse>) {
        let (status, code, message, details) = match self {
            ServerError::IdentityUnresolved => (
                StatusCode::UNAUTHORIZED,
                "IDENTITY_UNRESOLVED",
                "Authentication required: no identity could be resolved from the request".into(),
                None,
            ),
            ServerError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), None)
            }
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            ServerError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone(), None)
            }
            ServerError::UpstreamUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", msg.clone(), None)
            }
            ServerError::ToolExecution(payload) => (
                StatusCode::BAD_GATEWAY,
                "TOOL_EXECUTION_ERROR",
                "The backend reported a tool execution failure".into(),
                Some(payload.clone()),
            ),
            ServerError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg.clone(), None)
            }
        };

        let response = ErrorResponse {
            success: false,
            error: ErrorDetails { code: code.to_string(), message, details },
            metadata: super::dto::ResponseMeta::new(request_id),
        };

        (status, Json(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_execution_carries_backend_payload() {
        let err = ServerError::ToolExecution(json!({"status": 422, "detail": "bad field"}));
        let (status, Json(body)) = err.to_http_response("req-1".into());
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "TOOL_EXECUTION_ERROR");
        assert_eq!(body.error.details.unwrap()["status"], 422);
    }

    #[test]
    fn client_errors_map_to_gateway_codes() {
        let err: ServerError = ClientError::Unavailable("connect refused".into()).into();
        assert!(matches!(err, ServerError::UpstreamUnavailable(_)));

        let err: ServerError = ClientError::ToolError(json!({"code": -32000})).into();
        assert!(matches!(err, ServerError::ToolExecution(_)));
    }
}
