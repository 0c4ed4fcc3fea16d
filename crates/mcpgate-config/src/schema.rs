//! Gateway configuration schema

use mcpgate_core::{
    GroupName, ServerDescriptor, ServerId, ServerTier, TenantGroup, TenantRegistry,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the gateway does for callers with no resolvable identity.
///
/// This is an explicit deployment decision: deny everything (default), or
/// grant the access of a fixed public group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", tag = "policy")]
pub enum AnonymousPolicy {
    #[default]
    Deny,
    PublicGroup { group: String },
}

/// One backend MCP server entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub id: String,
    pub display_name: String,
    pub tier: ServerTier,
    pub endpoint: String,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

/// One statically configured authorization group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub allowed_servers: Vec<String>,
    #[serde(default)]
    pub is_superuser: bool,
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub database_url: String,
    /// Trust X-User-Email / X-User-Groups from an upstream gateway. Off by
    /// default: raw headers are spoofable.
    #[serde(default)]
    pub trust_gateway_headers: bool,
    #[serde(default)]
    pub anonymous: AnonymousPolicy,
    #[serde(default = "default_superuser_group")]
    pub superuser_group: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_list_timeout_secs")]
    pub list_timeout_secs: u64,
    #[serde(default = "default_invoke_timeout_secs")]
    pub invoke_timeout_secs: u64,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_superuser_group() -> String {
    "MCP-Admin".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_list_timeout_secs() -> u64 {
    10
}

fn default_invoke_timeout_secs() -> u64 {
    30
}

impl GatewayConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }

    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_secs(self.invoke_timeout_secs)
    }

    /// Build the core registry from this configuration.
    ///
    /// The configured superuser group exists even without an explicit
    /// `[[groups]]` entry, mirroring the admin-group bypass.
    pub fn build_registry(&self) -> TenantRegistry {
        let servers = self
            .servers
            .iter()
            .map(|s| ServerDescriptor {
                id: ServerId::new(&s.id),
                display_name: s.display_name.clone(),
                tier: s.tier,
                endpoint: s.endpoint.clone(),
                api_key_env: s.api_key_env.clone(),
                enabled: s.enabled,
                description: s.description.clone(),
            })
            .collect();

        let mut groups: Vec<TenantGroup> = self
            .groups
            .iter()
            .map(|g| TenantGroup {
                name: GroupName::new(&g.name),
                allowed_server_ids: g.allowed_servers.iter().map(ServerId::new).collect(),
                is_superuser: g.is_superuser || g.name == self.superuser_group,
            })
            .collect();

        if !groups.iter().any(|g| g.name.as_str() == self.superuser_group) {
            groups.push(TenantGroup {
                name: GroupName::new(&self.superuser_group),
                allowed_server_ids: Default::default(),
                is_superuser: true,
            });
        }

        TenantRegistry::new(servers, groups)
    }
}
