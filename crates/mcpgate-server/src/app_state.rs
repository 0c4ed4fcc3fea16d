//! Shared application state

use crate::catalog::ToolCatalog;
use crate::identity::IdentityResolver;
use crate::invoker::ToolInvoker;
use mcpgate_client::ClientFactory;
use mcpgate_config::GatewayConfig;
use mcpgate_core::{authorize, AuthorizedAccess, Identity, RegistryHandle};
use mcpgate_store::{AccessStore, SqlStore};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: RegistryHandle,
    pub store: Arc<dyn AccessStore>,
    pub catalog: Arc<ToolCatalog>,
    pub invoker: Arc<ToolInvoker>,
    pub resolver: Arc<IdentityResolver>,
}

impl AppState {
    /// Create app state from a loaded configuration.
    pub async fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn AccessStore> = Arc::new(SqlStore::new(&config.database_url).await?);
        Ok(Self::with_store(config, store))
    }

    /// Variant taking an externally built store; tests inject `MemoryStore`
    /// through this.
    pub fn with_store(config: &GatewayConfig, store: Arc<dyn AccessStore>) -> Self {
        let registry = RegistryHandle::new(config.build_registry());
        let factory = ClientFactory::new(config.list_timeout(), config.invoke_timeout());
        let catalog = Arc::new(ToolCatalog::new(factory.clone(), config.cache_ttl()));
        let invoker = Arc::new(ToolInvoker::new(factory, store.clone()));
        let resolver = Arc::new(IdentityResolver::new(
            config.trust_gateway_headers,
            config.anonymous.clone(),
            config.superuser_group.clone(),
            store.clone(),
        ));

        Self { registry, store, catalog, invoker, resolver }
    }

    /// The caller's authorized server set for this request.
    ///
    /// Statically configured allow-lists and the database's group-to-server
    /// grants both apply, whichever trust channel produced the groups: the
    /// single-source rule governs where the *groups* come from, not where
    /// their server grants are stored. Every grant is still intersected with
    /// the enabled set.
    pub async fn effective_access(&self, identity: &Identity) -> AuthorizedAccess {
        let registry = self.registry.load();
        let mut access = authorize(&registry, identity);

        match self.store.servers_for_groups(&identity.groups).await {
            Ok(ids) => {
                for id in ids {
                    if registry.get_server(&id).map(|s| s.enabled).unwrap_or(false) {
                        access.server_ids.insert(id);
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "group-to-server lookup failed");
            }
        }
        access
    }
}
