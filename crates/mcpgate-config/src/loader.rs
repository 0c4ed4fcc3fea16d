//! Configuration loading: file formats, env overrides, validation

use crate::error::{ConfigError, ConfigResult};
use crate::schema::GatewayConfig;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(FileFormat::Toml),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Load, apply env overrides, and validate a gateway configuration file.
pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    let raw = std::fs::read_to_string(path)?;
    load_from_str(&raw, format)
}

pub fn load_from_str(raw: &str, format: FileFormat) -> ConfigResult<GatewayConfig> {
    let mut config: GatewayConfig = match format {
        FileFormat::Toml => toml::from_str(raw)?,
        FileFormat::Yaml => serde_yaml::from_str(raw)?,
    };
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Environment variables win over file values, matching how the gateway is
/// deployed in containers.
fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(url) = std::env::var("MCPGATE_DATABASE_URL") {
        config.database_url = url;
    }
    if let Ok(addr) = std::env::var("MCPGATE_LISTEN_ADDR") {
        config.listen_addr = addr;
    }
    if let Ok(trust) = std::env::var("MCPGATE_TRUST_GATEWAY_HEADERS") {
        config.trust_gateway_headers = matches!(trust.as_str(), "1" | "true" | "yes");
    }
    for (var, target) in [
        ("MCPGATE_CACHE_TTL_SECS", &mut config.cache_ttl_secs),
        ("MCPGATE_LIST_TIMEOUT_SECS", &mut config.list_timeout_secs),
        ("MCPGATE_INVOKE_TIMEOUT_SECS", &mut config.invoke_timeout_secs),
    ] {
        if let Some(secs) = std::env::var(var).ok().and_then(|v| v.parse().ok()) {
            *target = secs;
        }
    }
}

/// Path segments claimed by the gateway's own endpoints; a server with one of
/// these ids would be unreachable behind the static route.
const RESERVED_SERVER_IDS: [&str; 5] = ["health", "servers", "tools", "refresh", "openapi.json"];

fn validate(config: &GatewayConfig) -> ConfigResult<()> {
    if config.database_url.is_empty() {
        return Err(ConfigError::Validation("database_url must be set".into()));
    }

    let mut seen_servers = HashSet::new();
    for server in &config.servers {
        if server.id.is_empty() {
            return Err(ConfigError::Validation("server id must not be empty".into()));
        }
        if server.id.contains('/') {
            return Err(ConfigError::Validation(format!(
                "server id '{}' must not contain '/'",
                server.id
            )));
        }
        if RESERVED_SERVER_IDS.contains(&server.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "server id '{}' collides with a reserved gateway route",
                server.id
            )));
        }
        if !seen_servers.insert(server.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate server id '{}'",
                server.id
            )));
        }
        if server.endpoint.is_empty() {
            return Err(ConfigError::Validation(format!(
                "server '{}' has an empty endpoint",
                server.id
            )));
        }
    }

    let mut seen_groups = HashSet::new();
    for group in &config.groups {
        if group.name.is_empty() {
            return Err(ConfigError::Validation("group name must not be empty".into()));
        }
        if !seen_groups.insert(group.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate group name '{}'",
                group.name
            )));
        }
        // Unknown server ids in allow-lists are tolerated; the registry
        // warns about them at build time.
        for id in &group.allowed_servers {
            if !seen_servers.contains(id.as_str()) {
                tracing::warn!(group = %group.name, server = %id, "allow-list names unknown server");
            }
        }
    }

    Ok(())
}
