//! Tool catalog aggregation with per-server TTL caching
//!
//! Each backend server gets its own cache cell; a refresh locks only that
//! cell, so concurrent refreshes of one server collapse into a single
//! backend call and no lock ever spans two servers. A failing backend is
//! served from stale cache when one exists, flagged as degraded.

use mcpgate_client::{ClientFactory, ClientResult};
use mcpgate_core::{AuthorizedAccess, ServerDescriptor, ServerId, TenantRegistry, ToolCatalogEntry};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Default)]
struct CellState {
    entries: Vec<ToolCatalogEntry>,
    fetched_at: Option<Instant>,
}

/// Discovery state for one server. The mutex is held across a refresh to
/// give single-flight semantics.
struct CacheCell {
    state: Mutex<CellState>,
}

/// Aggregated listing across the caller's authorized servers.
pub struct CatalogSnapshot {
    pub entries: Vec<ToolCatalogEntry>,
    /// Servers whose backend failed this round; entries may be stale or
    /// absent for these.
    pub degraded: Vec<ServerId>,
}

pub struct ToolCatalog {
    factory: ClientFactory,
    ttl: Duration,
    cells: std::sync::RwLock<HashMap<ServerId, Arc<CacheCell>>>,
}

impl ToolCatalog {
    pub fn new(factory: ClientFactory, ttl: Duration) -> Self {
        Self { factory, ttl, cells: std::sync::RwLock::new(HashMap::new()) }
    }

    fn cell(&self, server_id: &ServerId) -> Arc<CacheCell> {
        if let Some(cell) = self.cells.read().unwrap_or_else(|e| e.into_inner()).get(server_id) {
            return cell.clone();
        }
        let mut cells = self.cells.write().unwrap_or_else(|e| e.into_inner());
        cells
            .entry(server_id.clone())
            .or_insert_with(|| Arc::new(CacheCell { state: Mutex::new(CellState::default()) }))
            .clone()
    }

    /// Tools for one server, refreshing when the cache is stale. Returns the
    /// entries and whether they came from a degraded (stale-on-error) read.
    pub async fn tools_for_server(
        &self,
        descriptor: &ServerDescriptor,
    ) -> ClientResult<(Vec<ToolCatalogEntry>, bool)> {
        let cell = self.cell(&descriptor.id);
        let mut state = cell.state.lock().await;

        // Another caller may have refreshed while we waited on the lock.
        if let Some(fetched_at) = state.fetched_at {
            if fetched_at.elapsed() < self.ttl {
                return Ok((state.entries.clone(), false));
            }
        }

        let client = self.factory.for_server(descriptor, None, None);
        match client.list_tools().await {
            Ok(tools) => {
                let entries: Vec<ToolCatalogEntry> = tools
                    .into_iter()
                    .map(|tool| ToolCatalogEntry {
                        server_id: descriptor.id.clone(),
                        tool_name: tool.name,
                        description: tool.description,
                        input_schema: tool.input_schema,
                    })
                    .collect();
                state.entries = entries.clone();
                state.fetched_at = Some(Instant::now());
                tracing::debug!(server = %descriptor.id, count = entries.len(), "catalog refreshed");
                Ok((entries, false))
            }
            Err(err) if state.fetched_at.is_some() => {
                tracing::warn!(server = %descriptor.id, error = %err, "refresh failed, serving stale catalog");
                Ok((state.entries.clone(), true))
            }
            Err(err) => {
                tracing::warn!(server = %descriptor.id, error = %err, "discovery failed, no cache to fall back on");
                Err(err)
            }
        }
    }

    /// Concurrent fan-out over the authorized servers. A failing backend
    /// never fails the whole listing; it only lands in `degraded`.
    pub async fn list_tools(
        &self,
        registry: &TenantRegistry,
        access: &AuthorizedAccess,
    ) -> CatalogSnapshot {
        let descriptors: Vec<&ServerDescriptor> = access
            .server_ids
            .iter()
            .filter_map(|id| registry.get_server(id))
            .filter(|s| s.enabled)
            .collect();

        let results = futures::future::join_all(
            descriptors.iter().map(|descriptor| self.tools_for_server(descriptor)),
        )
        .await;

        let mut snapshot = CatalogSnapshot { entries: Vec::new(), degraded: Vec::new() };
        for (descriptor, result) in descriptors.iter().zip(results) {
            match result {
                Ok((entries, degraded)) => {
                    if degraded {
                        snapshot.degraded.push(descriptor.id.clone());
                    }
                    snapshot.entries.extend(entries);
                }
                Err(_) => snapshot.degraded.push(descriptor.id.clone()),
            }
        }
        snapshot
    }

    /// Number of currently cached tools, for the health endpoint.
    pub async fn cached_count(&self) -> usize {
        let cells: Vec<Arc<CacheCell>> = {
            let map = self.cells.read().unwrap_or_else(|e| e.into_inner());
            map.values().cloned().collect()
        };
        let mut count = 0;
        for cell in cells {
            let state = cell.state.lock().await;
            if state.fetched_at.is_some() {
                count += state.entries.len();
            }
        }
        count
    }

    pub async fn invalidate(&self, server_id: &ServerId) {
        let cell = {
            let map = self.cells.read().unwrap_or_else(|e| e.into_inner());
            map.get(server_id).cloned()
        };
        if let Some(cell) = cell {
            let mut state = cell.state.lock().await;
            state.fetched_at = None;
            state.entries.clear();
        }
    }

    pub async fn invalidate_all(&self) {
        let cells: Vec<Arc<CacheCell>> = {
            let map = self.cells.read().unwrap_or_else(|e| e.into_inner());
            map.values().cloned().collect()
        };
        for cell in cells {
            let mut state = cell.state.lock().await;
            state.fetched_at = None;
            state.entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use mcpgate_core::ServerTier;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn factory() -> ClientFactory {
        ClientFactory::new(Duration::from_secs(2), Duration::from_secs(2))
    }

    fn local_descriptor(id: &str, endpoint: String) -> ServerDescriptor {
        ServerDescriptor {
            id: ServerId::new(id),
            display_name: id.to_string(),
            tier: ServerTier::Local,
            endpoint,
            api_key_env: None,
            enabled: true,
            description: String::new(),
        }
    }

    fn mock_openapi(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(GET).path("/openapi.json");
            then.status(200).json_body(json!({
                "paths": {
                    "/get_weather": {
                        "post": {
                            "summary": "Get weather",
                            "requestBody": {"content": {"application/json": {
                                "schema": {"type": "object", "properties": {"city": {"type": "string"}}}
                            }}}
                        }
                    }
                }
            }));
        })
    }

    #[tokio::test]
    async fn cache_hit_within_ttl_skips_backend() {
        let server = MockServer::start();
        let mock = mock_openapi(&server);
        let catalog = ToolCatalog::new(factory(), Duration::from_secs(300));
        let descriptor = local_descriptor("weather", server.base_url());

        let (first, _) = catalog.tools_for_server(&descriptor).await.unwrap();
        let (second, _) = catalog.tools_for_server(&descriptor).await.unwrap();

        mock.assert_hits(1);
        assert_eq!(first.len(), 1);
        assert_eq!(second[0].qualified_name(), "weather/get_weather");
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let server = MockServer::start();
        let mock = mock_openapi(&server);
        let catalog = ToolCatalog::new(factory(), Duration::from_secs(300));
        let descriptor = local_descriptor("weather", server.base_url());

        catalog.tools_for_server(&descriptor).await.unwrap();
        catalog.invalidate(&descriptor.id).await;
        catalog.tools_for_server(&descriptor).await.unwrap();

        mock.assert_hits(2);
    }

    #[tokio::test]
    async fn stale_cache_served_when_backend_fails() {
        let server = MockServer::start();
        let mut mock = mock_openapi(&server);
        // Zero TTL: every read is a refresh attempt.
        let catalog = ToolCatalog::new(factory(), Duration::ZERO);
        let descriptor = local_descriptor("weather", server.base_url());

        let (entries, degraded) = catalog.tools_for_server(&descriptor).await.unwrap();
        assert!(!degraded);
        assert_eq!(entries.len(), 1);

        mock.delete();
        let (entries, degraded) = catalog.tools_for_server(&descriptor).await.unwrap();
        assert!(degraded);
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn aggregation_tolerates_a_dead_backend() {
        let server = MockServer::start();
        mock_openapi(&server);
        let good = local_descriptor("weather", server.base_url());
        // Port 9 (discard) refuses connections.
        let bad = local_descriptor("broken", "http://127.0.0.1:9".to_string());

        let registry = TenantRegistry::new(vec![good.clone(), bad.clone()], vec![]);
        let access = AuthorizedAccess {
            server_ids: BTreeSet::from([good.id.clone(), bad.id.clone()]),
        };

        let catalog = ToolCatalog::new(factory(), Duration::from_secs(300));
        let snapshot = catalog.list_tools(&registry, &access).await;

        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].server_id, good.id);
        assert_eq!(snapshot.degraded, vec![bad.id]);
    }
}
