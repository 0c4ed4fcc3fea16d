//! Dynamic OpenAPI document generation
//!
//! The document is rebuilt per request over exactly the servers and tools
//! the caller is authorized to see, so it doubles as a capability listing
//! for OpenAPI-driven clients.

use crate::catalog::CatalogSnapshot;
use mcpgate_core::ServerDescriptor;
use serde_json::{json, Map, Value as JsonValue};

pub fn build_document(
    user_email: &str,
    servers: &[&ServerDescriptor],
    snapshot: &CatalogSnapshot,
) -> JsonValue {
    let mut paths = Map::new();

    paths.insert("/health".into(), json!({
        "get": {
            "operationId": "health",
            "summary": "Gateway liveness and store connectivity",
            "responses": {"200": {"description": "Health report"}}
        }
    }));
    paths.insert("/servers".into(), json!({
        "get": {
            "operationId": "list_servers",
            "summary": "Backend servers visible to the caller, grouped by tier",
            "responses": {"200": {"description": "Server listing"}}
        }
    }));
    paths.insert("/tools".into(), json!({
        "get": {
            "operationId": "list_tools",
            "summary": "Namespaced tool catalog across authorized servers",
            "responses": {"200": {"description": "Tool listing"}}
        }
    }));
    paths.insert("/refresh".into(), json!({
        "post": {
            "operationId": "refresh_catalog",
            "summary": "Invalidate cached tool catalogs",
            "responses": {"200": {"description": "Caches invalidated"}}
        }
    }));

    for server in servers {
        paths.insert(format!("/{}", server.id), json!({
            "get": {
                "operationId": format!("list_{}_tools", server.id),
                "summary": format!("Tools exposed by {}", server.display_name),
                "tags": [server.id.as_str()],
                "responses": {"200": {"description": "Tool listing"}}
            }
        }));
    }

    for entry in &snapshot.entries {
        let operation_id = entry.qualified_name().replace('/', "_");
        paths.insert(format!("/{}/{}", entry.server_id, entry.tool_name), json!({
            "post": {
                "operationId": operation_id,
                "summary": entry.description,
                "tags": [entry.server_id.as_str()],
                "requestBody": {
                    "required": true,
                    "content": {"application/json": {"schema": entry.input_schema}}
                },
                "responses": {
                    "200": {"description": "Tool result"},
                    "403": {"description": "Not authorized for this server"},
                    "502": {"description": "Backend unavailable or tool failed"}
                }
            }
        }));
    }

    let description = if user_email.is_empty() {
        format!("{} tools available", snapshot.entries.len())
    } else {
        format!("{} tools available to {}", snapshot.entries.len(), user_email)
    };

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "MCP Proxy Gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "description": description
        },
        "paths": JsonValue::Object(paths)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpgate_core::{ServerId, ServerTier, ToolCatalogEntry};

    #[test]
    fn document_covers_servers_and_tools() {
        let github = ServerDescriptor {
            id: ServerId::new("github"),
            display_name: "GitHub".into(),
            tier: ServerTier::Local,
            endpoint: "http://mcp-github:8000".into(),
            api_key_env: None,
            enabled: true,
            description: String::new(),
        };
        let snapshot = CatalogSnapshot {
            entries: vec![ToolCatalogEntry {
                server_id: ServerId::new("github"),
                tool_name: "search_repositories".into(),
                description: "Search repositories".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }],
            degraded: vec![],
        };

        let doc = build_document("dev@example.com", &[&github], &snapshot);
        let paths = doc["paths"].as_object().unwrap();

        assert!(paths.contains_key("/health"));
        assert!(paths.contains_key("/github"));
        assert!(paths.contains_key("/github/search_repositories"));
        assert_eq!(
            paths["/github/search_repositories"]["post"]["operationId"],
            "github_search_repositories"
        );
        assert!(doc["info"]["description"].as_str().unwrap().contains("dev@example.com"));
    }
}
