//! Backend client capability
//!
//! The aggregator and router depend only on [`BackendClient`]; the transport
//! tier decides which implementation the factory hands out. `Http` servers
//! speak the MCP streamable protocol natively, while `Sse`/`Stdio`/`Local`
//! servers sit behind an OpenAPI bridge.

use crate::error::ClientResult;
use crate::mcp_backend::McpStreamableBackend;
use crate::openapi_backend::OpenApiBackend;
use mcpgate_core::{ServerDescriptor, ServerTier};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// One tool as reported by a backend, before namespacing.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
}

#[async_trait::async_trait]
pub trait BackendClient: Send + Sync {
    /// Discover the backend's tool catalog.
    async fn list_tools(&self) -> ClientResult<Vec<ToolDescriptor>>;

    /// Invoke one tool with JSON arguments, returning the backend result
    /// verbatim.
    async fn invoke_tool(&self, tool: &str, arguments: &JsonValue) -> ClientResult<JsonValue>;
}

/// Builds transport clients per server, sharing one reqwest client.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    http: reqwest::Client,
    list_timeout: Duration,
    invoke_timeout: Duration,
}

impl ClientFactory {
    pub fn new(list_timeout: Duration, invoke_timeout: Duration) -> Self {
        Self { http: reqwest::Client::new(), list_timeout, invoke_timeout }
    }

    /// Client for a server, honoring tenant endpoint/credential overrides.
    ///
    /// The default bearer key comes from the environment variable named in
    /// the descriptor; an explicit override wins over both.
    pub fn for_server(
        &self,
        descriptor: &ServerDescriptor,
        endpoint_override: Option<String>,
        api_key_override: Option<String>,
    ) -> Arc<dyn BackendClient> {
        let endpoint = endpoint_override.unwrap_or_else(|| descriptor.endpoint.clone());
        let api_key = api_key_override.or_else(|| {
            descriptor.api_key_env.as_deref().and_then(|var| std::env::var(var).ok())
        });

        match descriptor.tier {
            ServerTier::Http => Arc::new(McpStreamableBackend::new(
                self.http.clone(),
                endpoint,
                api_key,
                self.list_timeout,
                self.invoke_timeout,
            )),
            ServerTier::Sse | ServerTier::Stdio | ServerTier::Local => Arc::new(
                OpenApiBackend::new(
                    self.http.clone(),
                    endpoint,
                    api_key,
                    self.list_timeout,
                    self.invoke_timeout,
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpgate_core::ServerId;

    fn descriptor(tier: ServerTier) -> ServerDescriptor {
        ServerDescriptor {
            id: ServerId::new("github"),
            display_name: "GitHub".into(),
            tier,
            endpoint: "http://mcp-github:8000".into(),
            api_key_env: None,
            enabled: true,
            description: String::new(),
        }
    }

    #[test]
    fn factory_builds_a_client_per_tier() {
        let factory = ClientFactory::new(Duration::from_secs(10), Duration::from_secs(30));
        for tier in [ServerTier::Http, ServerTier::Sse, ServerTier::Stdio, ServerTier::Local] {
            // Construction must not touch the network.
            let _client = factory.for_server(&descriptor(tier), None, None);
        }
    }
}
