//! Tool invocation routing
//!
//! Authorization is re-evaluated on every call and rejections happen before
//! any backend I/O. Tenant credential overrides from the access store win
//! over the server's default endpoint and key. One hop, no retries.

use crate::error::{ServerError, ServerResult};
use mcpgate_client::ClientFactory;
use mcpgate_core::{AuthorizedAccess, Identity, ServerId, TenantRegistry};
use mcpgate_store::{AccessStore, CredentialOverride};
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub struct ToolInvoker {
    factory: ClientFactory,
    store: Arc<dyn AccessStore>,
}

impl ToolInvoker {
    pub fn new(factory: ClientFactory, store: Arc<dyn AccessStore>) -> Self {
        Self { factory, store }
    }

    /// Route one tool call to its backend.
    ///
    /// Unknown and disabled servers are indistinguishable to callers
    /// (`NotFound`), and the authorization check precedes any network call.
    pub async fn invoke(
        &self,
        registry: &TenantRegistry,
        identity: &Identity,
        access: &AuthorizedAccess,
        server_id: &ServerId,
        tool_name: &str,
        arguments: &JsonValue,
    ) -> ServerResult<JsonValue> {
        let descriptor = registry
            .get_server(server_id)
            .filter(|s| s.enabled)
            .ok_or_else(|| ServerError::NotFound(format!("Unknown server '{server_id}'")))?;

        if !access.contains(server_id) {
            tracing::info!(user = %identity.email, server = %server_id, "invocation denied");
            return Err(ServerError::Forbidden(format!(
                "Access to server '{server_id}' is not granted by your groups"
            )));
        }

        let override_ = self.resolve_override(identity, server_id).await;
        let (endpoint, api_key) = match override_ {
            Some(o) => (o.endpoint_url, o.api_key),
            None => (None, None),
        };

        let client = self.factory.for_server(descriptor, endpoint, api_key);
        tracing::info!(user = %identity.email, server = %server_id, tool = %tool_name, "invoking tool");
        let result = client.invoke_tool(tool_name, arguments).await?;
        Ok(result)
    }

    /// First override found across the caller's groups wins. A store failure
    /// degrades to default credentials rather than failing the call.
    async fn resolve_override(
        &self,
        identity: &Identity,
        server_id: &ServerId,
    ) -> Option<CredentialOverride> {
        for group in &identity.groups {
            match self.store.credential_override(group, server_id).await {
                Ok(Some(override_)) => {
                    tracing::debug!(tenant = %group, server = %server_id, "applying credential override");
                    return Some(override_);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(error = %err, tenant = %group, "credential override lookup failed");
                }
            }
        }
        None
    }
}
