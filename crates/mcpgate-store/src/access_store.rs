//! Query contract against the external access-control database
//!
//! The gateway does not own this data; admin tooling writes it. The trait
//! covers exactly the lookups the identity resolver and router need:
//! group membership by email, group-to-server grants, the admin flag, and
//! per-tenant credential overrides.

use crate::error::StoreResult;
use mcpgate_core::{GroupName, ServerId};

/// Tenant-specific override applied before a server's default credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialOverride {
    pub api_key: Option<String>,
    pub endpoint_url: Option<String>,
}

#[async_trait::async_trait]
pub trait AccessStore: Send + Sync {
    /// Group names the user belongs to. Emails match case-insensitively.
    async fn groups_for_user(&self, email: &str) -> StoreResult<Vec<GroupName>>;

    /// Distinct server ids granted to any of the given groups.
    async fn servers_for_groups(&self, groups: &[GroupName]) -> StoreResult<Vec<ServerId>>;

    /// Whether the user carries the persisted admin flag.
    async fn is_admin(&self, email: &str) -> StoreResult<bool>;

    /// Credential/endpoint override for a (tenant group, server) pair.
    async fn credential_override(
        &self,
        tenant: &GroupName,
        server: &ServerId,
    ) -> StoreResult<Option<CredentialOverride>>;

    /// Connectivity probe for the health endpoint.
    async fn healthy(&self) -> bool;
}
