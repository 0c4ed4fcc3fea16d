//! OpenAPI-bridged backend client
//!
//! Serves the `sse`/`stdio`/`local` tiers, where an mcpo-style proxy (or an
//! in-cluster container) exposes each tool as a POST endpoint and publishes
//! the catalog at `GET /openapi.json`.

use crate::backend::{BackendClient, ToolDescriptor};
use crate::error::{ClientError, ClientResult};
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

/// Paths in a backend's OpenAPI document that are not tools.
const NON_TOOL_PATHS: &[&str] = &["/health", "/docs", "/openapi.json", "/redoc", "/"];

pub struct OpenApiBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    list_timeout: Duration,
    invoke_timeout: Duration,
}

impl OpenApiBackend {
    pub fn new(
        http: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        list_timeout: Duration,
        invoke_timeout: Duration,
    ) -> Self {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        Self { http, endpoint, api_key, list_timeout, invoke_timeout }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// One tool per POST path; the request body schema becomes the tool's
    /// input schema.
    fn extract_tools(openapi: &JsonValue) -> Vec<ToolDescriptor> {
        let Some(paths) = openapi.get("paths").and_then(|p| p.as_object()) else {
            return vec![];
        };

        let mut tools = Vec::new();
        for (path, methods) in paths {
            if NON_TOOL_PATHS.contains(&path.as_str()) {
                continue;
            }
            let Some(spec) = methods.get("post") else {
                continue;
            };

            let name = path.trim_matches('/').to_string();
            if name.is_empty() {
                continue;
            }

            let description = spec
                .get("summary")
                .or_else(|| spec.get("description"))
                .and_then(|v| v.as_str())
                .unwrap_or(&name)
                .to_string();

            let input_schema = spec
                .pointer("/requestBody/content/application~1json/schema")
                .cloned()
                .unwrap_or_else(|| json!({"type": "object", "additionalProperties": true}));

            tools.push(ToolDescriptor { name, description, input_schema });
        }
        tools
    }
}

#[async_trait::async_trait]
impl BackendClient for OpenApiBackend {
    async fn list_tools(&self) -> ClientResult<Vec<ToolDescriptor>> {
        let url = format!("{}/openapi.json", self.endpoint);
        let response = self
            .authorize(self.http.get(&url))
            .timeout(self.list_timeout)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ClientError::Unavailable(format!(
                "openapi discovery returned {} from {}",
                response.status(),
                url
            )));
        }

        let openapi: JsonValue = response
            .json()
            .await
            .map_err(|e| ClientError::Protocol(format!("invalid openapi document: {e}")))?;

        Ok(Self::extract_tools(&openapi))
    }

    async fn invoke_tool(&self, tool: &str, arguments: &JsonValue) -> ClientResult<JsonValue> {
        let url = format!("{}/{}", self.endpoint, tool.trim_matches('/'));
        tracing::debug!(%url, "invoking tool via openapi bridge");

        let response = self
            .authorize(self.http.post(&url))
            .timeout(self.invoke_timeout)
            .json(arguments)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ClientError::Protocol(format!("invalid tool response: {e}")));
        }

        // Pass the backend's failure payload through untouched.
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<JsonValue>(&body).unwrap_or(JsonValue::String(body));
        Err(ClientError::ToolError(json!({
            "status": status.as_u16(),
            "detail": detail,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn backend(server: &MockServer) -> OpenApiBackend {
        OpenApiBackend::new(
            reqwest::Client::new(),
            server.base_url(),
            Some("test-key".into()),
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    async fn discovers_post_paths_as_tools() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/openapi.json").header("authorization", "Bearer test-key");
            then.status(200).json_body(serde_json::json!({
                "openapi": "3.1.0",
                "paths": {
                    "/health": {"get": {"summary": "Health"}},
                    "/search_repositories": {
                        "post": {
                            "summary": "Search repositories",
                            "requestBody": {"content": {"application/json": {"schema": {
                                "type": "object",
                                "properties": {"query": {"type": "string"}}
                            }}}}
                        }
                    },
                    "/list_stars": {"get": {"summary": "Not a tool"}}
                }
            }));
        });

        let tools = backend(&server).list_tools().await.unwrap();
        mock.assert();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "search_repositories");
        assert_eq!(tools[0].description, "Search repositories");
        assert_eq!(tools[0].input_schema["properties"]["query"]["type"], "string");
    }

    #[tokio::test]
    async fn invoke_posts_arguments_and_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/search_repositories")
                .json_body(serde_json::json!({"query": "mcp"}));
            then.status(200).json_body(serde_json::json!({"items": [1, 2]}));
        });

        let result = backend(&server)
            .invoke_tool("search_repositories", &serde_json::json!({"query": "mcp"}))
            .await
            .unwrap();
        mock.assert();
        assert_eq!(result["items"][0], 1);
    }

    #[tokio::test]
    async fn backend_error_payload_passes_through() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/read_file");
            then.status(500).json_body(serde_json::json!({"detail": "permission denied"}));
        });

        let err = backend(&server)
            .invoke_tool("read_file", &serde_json::json!({"path": "/etc/shadow"}))
            .await
            .unwrap_err();
        match err {
            ClientError::ToolError(payload) => {
                assert_eq!(payload["status"], 500);
                assert_eq!(payload["detail"]["detail"], "permission denied");
            }
            other => panic!("expected ToolError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        // Nothing listens on this port.
        let backend = OpenApiBackend::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9".into(),
            None,
            Duration::from_millis(300),
            Duration::from_millis(300),
        );
        let err = backend.list_tools().await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable(_)), "got {err:?}");
    }
}
