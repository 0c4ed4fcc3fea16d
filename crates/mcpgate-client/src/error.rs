use serde_json::Value as JsonValue;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend unreachable or timed out. Never retried at this layer.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The backend executed the tool and reported a failure. The original
    /// payload is preserved so callers can tell tool failures from gateway
    /// failures.
    #[error("tool execution failed")]
    ToolError(JsonValue),

    /// Backend answered with something the transport cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Classify a reqwest transport error.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ClientError::Unavailable(err.to_string())
        } else {
            ClientError::Protocol(err.to_string())
        }
    }
}
