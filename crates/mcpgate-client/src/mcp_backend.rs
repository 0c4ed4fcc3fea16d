//! Native MCP streamable-HTTP backend client
//!
//! JSON-RPC 2.0 over HTTP for servers that speak MCP directly (Linear,
//! Notion, ...). The handshake captures an `Mcp-Session-Id` header which
//! must accompany subsequent requests; responses arrive either as plain JSON
//! or SSE-framed (`data:` lines).

use crate::backend::{BackendClient, ToolDescriptor};
use crate::error::{ClientError, ClientResult};
use serde_json::{json, Value as JsonValue};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const PROTOCOL_VERSION: &str = "2025-03-26";
const SESSION_TTL: Duration = Duration::from_secs(3600);

pub struct McpStreamableBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    list_timeout: Duration,
    invoke_timeout: Duration,
    session: RwLock<Option<(String, Instant)>>,
}

impl McpStreamableBackend {
    pub fn new(
        http: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        list_timeout: Duration,
        invoke_timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            list_timeout,
            invoke_timeout,
            session: RwLock::new(None),
        }
    }

    fn base_request(&self, timeout: Duration) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .post(&self.endpoint)
            .timeout(timeout)
            .header("Accept", "application/json, text/event-stream");
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Extract the JSON-RPC payload from a plain-JSON or SSE-framed body.
    fn parse_frame(text: &str) -> Option<JsonValue> {
        let text = text.trim();
        if text.starts_with('{') {
            if let Ok(value) = serde_json::from_str(text) {
                return Some(value);
            }
        }

        let mut last_data = None;
        for line in text.lines() {
            let line = line.trim();
            if let Some(data) = line.strip_prefix("data:") {
                if let Ok(value) = serde_json::from_str::<JsonValue>(data.trim()) {
                    last_data = Some(value);
                }
            }
        }
        last_data
    }

    async fn cached_session(&self) -> Option<String> {
        let session = self.session.read().await;
        match &*session {
            Some((id, created)) if created.elapsed() < SESSION_TTL => Some(id.clone()),
            _ => None,
        }
    }

    async fn invalidate_session(&self) {
        *self.session.write().await = None;
    }

    /// Perform the initialize handshake and cache the session id.
    async fn initialize(&self) -> ClientResult<String> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "mcpgate", "version": env!("CARGO_PKG_VERSION")}
            }
        });

        let response = self
            .base_request(self.list_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Unavailable(format!(
                "mcp initialize returned {status} from {}",
                self.endpoint
            )));
        }

        // Header casing varies between servers.
        let session_id = response
            .headers()
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if session_id.is_empty() {
            tracing::warn!(endpoint = %self.endpoint, "no session id in initialize response");
        } else {
            *self.session.write().await = Some((session_id.clone(), Instant::now()));
        }

        // The initialized notification is best-effort.
        let notify = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let mut builder = self.base_request(self.list_timeout).json(&notify);
        if !session_id.is_empty() {
            builder = builder.header("mcp-session-id", &session_id);
        }
        if let Err(e) = builder.send().await {
            tracing::debug!(error = %e, "initialized notification failed");
        }

        Ok(session_id)
    }

    async fn ensure_session(&self) -> ClientResult<String> {
        match self.cached_session().await {
            Some(id) => Ok(id),
            None => self.initialize().await,
        }
    }

    /// Send a JSON-RPC request, re-initializing the session once on a
    /// session-level 4xx.
    async fn request(
        &self,
        method: &str,
        params: Option<JsonValue>,
        timeout: Duration,
    ) -> ClientResult<JsonValue> {
        let mut retry_on_auth = true;
        loop {
            let session_id = self.ensure_session().await?;

            let mut payload = json!({"jsonrpc": "2.0", "id": 2, "method": method});
            if let Some(params) = &params {
                payload["params"] = params.clone();
            }

            let mut builder = self.base_request(timeout).json(&payload);
            if !session_id.is_empty() {
                builder = builder.header("mcp-session-id", &session_id);
            }

            let response = builder.send().await.map_err(ClientError::from_reqwest)?;
            let status = response.status();

            if matches!(status.as_u16(), 401 | 403 | 404 | 409) && retry_on_auth {
                tracing::debug!(%status, "session rejected, re-initializing");
                self.invalidate_session().await;
                retry_on_auth = false;
                continue;
            }

            if !status.is_success() {
                return Err(ClientError::Unavailable(format!(
                    "mcp {method} returned {status} from {}",
                    self.endpoint
                )));
            }

            let text = response.text().await.map_err(ClientError::from_reqwest)?;
            let frame = Self::parse_frame(&text).ok_or_else(|| {
                ClientError::Protocol(format!("unparseable mcp response for {method}"))
            })?;

            if let Some(error) = frame.get("error") {
                return Err(ClientError::ToolError(error.clone()));
            }
            return Ok(frame);
        }
    }
}

#[async_trait::async_trait]
impl BackendClient for McpStreamableBackend {
    async fn list_tools(&self) -> ClientResult<Vec<ToolDescriptor>> {
        let frame = self.request("tools/list", None, self.list_timeout).await?;
        let tools = frame
            .pointer("/result/tools")
            .and_then(|t| t.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(tools
            .iter()
            .filter_map(|tool| {
                let name = tool.get("name")?.as_str()?.to_string();
                Some(ToolDescriptor {
                    description: tool
                        .get("description")
                        .and_then(|d| d.as_str())
                        .unwrap_or(&name)
                        .to_string(),
                    input_schema: tool
                        .get("inputSchema")
                        .cloned()
                        .unwrap_or_else(|| json!({"type": "object"})),
                    name,
                })
            })
            .collect())
    }

    async fn invoke_tool(&self, tool: &str, arguments: &JsonValue) -> ClientResult<JsonValue> {
        let params = json!({"name": tool, "arguments": arguments});
        let frame = self.request("tools/call", Some(params), self.invoke_timeout).await?;
        Ok(frame.get("result").cloned().unwrap_or(frame))
    }
}
