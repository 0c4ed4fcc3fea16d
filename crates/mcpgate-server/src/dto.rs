//! HTTP response DTOs

use mcpgate_core::{ServerDescriptor, ToolCatalogEntry};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Response envelope wrapper
#[derive(Serialize)]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    pub data: T,
    pub metadata: ResponseMeta,
}

/// Response metadata
#[derive(Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ResponseMeta {
    pub fn new(request_id: String) -> Self {
        Self { request_id, user: None, warnings: None }
    }

    pub fn with_user(request_id: String, email: &str) -> Self {
        let user = if email.is_empty() { None } else { Some(email.to_string()) };
        Self { request_id, user, warnings: None }
    }
}

/// One backend server as shown to callers. Endpoint and credentials stay
/// internal.
#[derive(Serialize)]
pub struct ServerSummary {
    pub id: String,
    pub display_name: String,
    pub tier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl From<&ServerDescriptor> for ServerSummary {
    fn from(descriptor: &ServerDescriptor) -> Self {
        Self {
            id: descriptor.id.to_string(),
            display_name: descriptor.display_name.clone(),
            tier: descriptor.tier.as_str().to_string(),
            description: descriptor.description.clone(),
        }
    }
}

/// Servers grouped by transport tier.
#[derive(Serialize)]
pub struct ServerListing {
    pub servers: BTreeMap<String, Vec<ServerSummary>>,
    pub total: usize,
}

/// One tool in the namespaced catalog.
#[derive(Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub server_id: String,
    pub description: String,
    pub input_schema: Value,
}

impl From<&ToolCatalogEntry> for ToolSummary {
    fn from(entry: &ToolCatalogEntry) -> Self {
        Self {
            name: entry.qualified_name(),
            server_id: entry.server_id.to_string(),
            description: entry.description.clone(),
            input_schema: entry.input_schema.clone(),
        }
    }
}

/// Catalog listing across authorized servers.
#[derive(Serialize)]
pub struct ToolListing {
    pub tools: Vec<ToolSummary>,
    pub count: usize,
    /// Servers whose backend failed during this aggregation; their tools are
    /// stale or missing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_servers: Vec<String>,
}
