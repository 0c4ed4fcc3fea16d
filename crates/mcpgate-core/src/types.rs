//! Domain types shared across the gateway

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;

/// Unique slug identifying a backend MCP server (e.g. "github").
/// Doubles as the URL path segment in hierarchical routing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerId(pub String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authorization group name (e.g. "MCP-Admin", "Tenant-Google"). Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupName(pub String);

impl GroupName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport tier of a backend MCP server.
///
/// `Http` servers speak the MCP streamable-HTTP protocol directly; `Sse` and
/// `Stdio` servers are reached through an OpenAPI-bridging proxy; `Local`
/// servers are in-cluster containers exposing plain OpenAPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerTier {
    Http,
    Sse,
    Stdio,
    Local,
}

impl ServerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerTier::Http => "http",
            ServerTier::Sse => "sse",
            ServerTier::Stdio => "stdio",
            ServerTier::Local => "local",
        }
    }
}

/// Configuration describing one backend MCP tool server.
///
/// Created from configuration at startup; never deleted at runtime, only
/// disabled. Tool discovery results live in the catalog cache, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub id: ServerId,
    pub display_name: String,
    pub tier: ServerTier,
    /// Base URL for discovery and invocation.
    pub endpoint: String,
    /// Environment variable holding the bearer key for this backend, if any.
    #[serde(default)]
    pub api_key_env: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

/// An authorization group mapping callers to a set of backend servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantGroup {
    pub name: GroupName,
    pub allowed_server_ids: BTreeSet<ServerId>,
    /// Grants access to all enabled servers regardless of the allow-list.
    #[serde(default)]
    pub is_superuser: bool,
}

/// Which trust channel produced an identity. Used for auditing and for the
/// strict priority order in resolution: token claims beat gateway headers,
/// which beat direct database lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentitySource {
    OauthToken,
    Header,
    DirectLookup,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::OauthToken => "oauth-token",
            IdentitySource::Header => "header",
            IdentitySource::DirectLookup => "direct-lookup",
        }
    }
}

/// Resolved caller identity, ephemeral per request.
///
/// `groups` comes from exactly one trust channel; sources are never merged,
/// so a spoofable header cannot add privileges on top of a verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// May be empty for anonymous callers admitted via a public-group policy.
    pub email: String,
    pub groups: Vec<GroupName>,
    pub source: IdentitySource,
}

impl Identity {
    pub fn new(email: impl Into<String>, groups: Vec<GroupName>, source: IdentitySource) -> Self {
        Self { email: email.into(), groups, source }
    }
}

/// The set of servers visible to an identity for one request.
///
/// Invariant: always a subset of the currently enabled server ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedAccess {
    pub server_ids: BTreeSet<ServerId>,
}

impl AuthorizedAccess {
    pub fn contains(&self, server_id: &ServerId) -> bool {
        self.server_ids.contains(server_id)
    }

    pub fn is_empty(&self) -> bool {
        self.server_ids.is_empty()
    }
}

/// One discoverable tool, namespaced by its owning server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCatalogEntry {
    pub server_id: ServerId,
    pub tool_name: String,
    #[serde(default)]
    pub description: String,
    pub input_schema: JsonValue,
}

impl ToolCatalogEntry {
    /// Externally exposed name, unique by construction across backends.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.server_id, self.tool_name)
    }
}
