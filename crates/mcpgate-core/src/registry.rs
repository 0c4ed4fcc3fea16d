//! Tenant registry: servers and groups known to the gateway
//!
//! The registry is an immutable snapshot built from configuration. Handlers
//! read it through a [`RegistryHandle`], which swaps the whole snapshot
//! atomically on reload so concurrent readers never observe partial updates.

use crate::types::{GroupName, ServerDescriptor, ServerId, TenantGroup};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

/// Immutable view of configured servers and groups.
#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    servers: BTreeMap<ServerId, ServerDescriptor>,
    groups: BTreeMap<GroupName, TenantGroup>,
}

impl TenantRegistry {
    /// Build a registry from descriptors and groups.
    ///
    /// Server ids referenced by a group but absent from the server table are
    /// kept and logged as a warning: they may belong to servers not yet
    /// deployed, and must not fail startup.
    pub fn new(servers: Vec<ServerDescriptor>, groups: Vec<TenantGroup>) -> Self {
        let servers: BTreeMap<ServerId, ServerDescriptor> =
            servers.into_iter().map(|s| (s.id.clone(), s)).collect();

        for group in &groups {
            for id in &group.allowed_server_ids {
                if !servers.contains_key(id) {
                    tracing::warn!(
                        group = %group.name,
                        server_id = %id,
                        "group allow-list references unknown server"
                    );
                }
            }
        }

        let groups = groups.into_iter().map(|g| (g.name.clone(), g)).collect();
        Self { servers, groups }
    }

    pub fn get_server(&self, id: &ServerId) -> Option<&ServerDescriptor> {
        self.servers.get(id)
    }

    pub fn get_group(&self, name: &GroupName) -> Option<&TenantGroup> {
        self.groups.get(name)
    }

    /// Enabled servers in stable id order.
    pub fn list_enabled_servers(&self) -> Vec<&ServerDescriptor> {
        self.servers.values().filter(|s| s.enabled).collect()
    }

    /// Ids of all enabled servers.
    pub fn enabled_ids(&self) -> BTreeSet<ServerId> {
        self.servers
            .values()
            .filter(|s| s.enabled)
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }
}

/// Shared, reloadable handle to the registry, owned by the composition root.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    inner: Arc<RwLock<Arc<TenantRegistry>>>,
}

impl RegistryHandle {
    pub fn new(registry: TenantRegistry) -> Self {
        Self { inner: Arc::new(RwLock::new(Arc::new(registry))) }
    }

    /// Current snapshot. Cheap; clones only the Arc.
    pub fn load(&self) -> Arc<TenantRegistry> {
        // Lock poisoning can only come from a panic inside replace(), which
        // holds the guard for a single pointer store.
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Atomically replace the registry. In-flight readers keep their old
    /// snapshot; new readers see the replacement in full.
    pub fn replace(&self, registry: TenantRegistry) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(registry);
        tracing::info!(servers = guard.server_count(), "tenant registry reloaded");
    }
}
