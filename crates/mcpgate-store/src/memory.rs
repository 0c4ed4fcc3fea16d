//! In-memory access store for tests and ephemeral deployments

use crate::access_store::{AccessStore, CredentialOverride};
use crate::error::StoreResult;
use async_trait::async_trait;
use mcpgate_core::{GroupName, ServerId};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    /// lowercased email -> groups
    memberships: HashMap<String, BTreeSet<GroupName>>,
    group_servers: HashMap<GroupName, BTreeSet<ServerId>>,
    /// lowercased emails with the admin flag
    admins: HashSet<String>,
    overrides: HashMap<(GroupName, ServerId), CredentialOverride>,
}

/// In-memory implementation of [`AccessStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_group_membership(&self, email: &str, group: GroupName) {
        let mut inner = self.inner.write().await;
        inner.memberships.entry(email.to_lowercase()).or_default().insert(group);
    }

    pub async fn add_group_server_mapping(&self, group: GroupName, server: ServerId) {
        let mut inner = self.inner.write().await;
        inner.group_servers.entry(group).or_default().insert(server);
    }

    pub async fn set_admin(&self, email: &str, is_admin: bool) {
        let mut inner = self.inner.write().await;
        if is_admin {
            inner.admins.insert(email.to_lowercase());
        } else {
            inner.admins.remove(&email.to_lowercase());
        }
    }

    pub async fn set_credential_override(
        &self,
        tenant: GroupName,
        server: ServerId,
        override_: CredentialOverride,
    ) {
        let mut inner = self.inner.write().await;
        inner.overrides.insert((tenant, server), override_);
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn groups_for_user(&self, email: &str) -> StoreResult<Vec<GroupName>> {
        let inner = self.inner.read().await;
        Ok(inner
            .memberships
            .get(&email.to_lowercase())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn servers_for_groups(&self, groups: &[GroupName]) -> StoreResult<Vec<ServerId>> {
        let inner = self.inner.read().await;
        let mut servers = BTreeSet::new();
        for group in groups {
            if let Some(ids) = inner.group_servers.get(group) {
                servers.extend(ids.iter().cloned());
            }
        }
        Ok(servers.into_iter().collect())
    }

    async fn is_admin(&self, email: &str) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.admins.contains(&email.to_lowercase()))
    }

    async fn credential_override(
        &self,
        tenant: &GroupName,
        server: &ServerId,
    ) -> StoreResult<Option<CredentialOverride>> {
        let inner = self.inner.read().await;
        Ok(inner.overrides.get(&(tenant.clone(), server.clone())).cloned())
    }

    async fn healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_mirrors_sql_contract() {
        let store = MemoryStore::new();
        store.add_group_membership("User@Example.com", GroupName::new("Test-Tenant")).await;
        store
            .add_group_server_mapping(GroupName::new("Test-Tenant"), ServerId::new("github"))
            .await;

        let groups = store.groups_for_user("user@example.com").await.unwrap();
        assert_eq!(groups, vec![GroupName::new("Test-Tenant")]);

        let servers = store.servers_for_groups(&groups).await.unwrap();
        assert_eq!(servers, vec![ServerId::new("github")]);

        assert!(!store.is_admin("user@example.com").await.unwrap());
        assert!(store.healthy().await);
    }
}
