//! Caller identity resolution
//!
//! Three trust channels in strict priority order: OAuth token claims, then
//! gateway-injected headers (only in trust-gateway mode), then a direct
//! database lookup for callers whose channel produced an email but no
//! groups. Exactly one channel wins; groups are never merged across
//! channels, so a spoofable header cannot add privileges on top of a
//! verified token.
//!
//! Token payloads are decoded without signature re-verification: the
//! upstream identity provider already validated the token before forwarding
//! it, and this layer has no key material.

use crate::error::ServerResult;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use mcpgate_config::AnonymousPolicy;
use mcpgate_core::{GroupName, Identity, IdentitySource};
use mcpgate_store::AccessStore;
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub struct IdentityResolver {
    trust_gateway_headers: bool,
    anonymous: AnonymousPolicy,
    superuser_group: GroupName,
    store: Arc<dyn AccessStore>,
}

impl IdentityResolver {
    pub fn new(
        trust_gateway_headers: bool,
        anonymous: AnonymousPolicy,
        superuser_group: impl Into<String>,
        store: Arc<dyn AccessStore>,
    ) -> Self {
        Self {
            trust_gateway_headers,
            anonymous,
            superuser_group: GroupName::new(superuser_group),
            store,
        }
    }

    /// Resolve the caller, `Ok(None)` meaning anonymous under a Deny policy.
    pub async fn resolve(&self, headers: &HeaderMap) -> ServerResult<Option<Identity>> {
        // Channel 1: decoded OAuth token claims.
        if header_str(headers, "x-auth-source") == Some("oauth-token") {
            if let Some(claims) = bearer_token(headers).and_then(decode_claims) {
                if let Some(email) = claim_email(&claims) {
                    let groups = claim_groups(&claims);
                    if !groups.is_empty() {
                        tracing::debug!(email = %email, count = groups.len(), "token auth");
                        return Ok(Some(Identity::new(email, groups, IdentitySource::OauthToken)));
                    }
                    // Email without a groups claim: the database decides.
                    return self.direct_lookup(&email).await.map(Some);
                }
            }
            tracing::debug!("oauth-token auth requested but token unusable");
        }

        // Channel 2: gateway-injected headers, only when explicitly trusted.
        if self.trust_gateway_headers {
            if let Some(email) = header_str(headers, "x-user-email") {
                let raw = header_str(headers, "x-user-groups")
                    .or_else(|| header_str(headers, "x-entra-groups"))
                    .unwrap_or("");
                let mut groups: Vec<GroupName> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(GroupName::new)
                    .collect();
                if header_str(headers, "x-user-admin") == Some("true")
                    && !groups.contains(&self.superuser_group)
                {
                    groups.push(self.superuser_group.clone());
                }
                if !groups.is_empty() {
                    tracing::debug!(email = %email, count = groups.len(), "gateway header auth");
                    return Ok(Some(Identity::new(email, groups, IdentitySource::Header)));
                }
                return self.direct_lookup(email).await.map(Some);
            }
        }

        // No channel produced an email: anonymous.
        match &self.anonymous {
            AnonymousPolicy::Deny => Ok(None),
            AnonymousPolicy::PublicGroup { group } => Ok(Some(Identity::new(
                "",
                vec![GroupName::new(group)],
                IdentitySource::DirectLookup,
            ))),
        }
    }

    async fn direct_lookup(&self, email: &str) -> ServerResult<Identity> {
        let mut groups = self.store.groups_for_user(email).await?;
        if self.store.is_admin(email).await? && !groups.contains(&self.superuser_group) {
            groups.push(self.superuser_group.clone());
        }
        tracing::debug!(email = %email, count = groups.len(), "database lookup auth");
        Ok(Identity::new(email, groups, IdentitySource::DirectLookup))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).filter(|v| !v.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, "authorization")?.strip_prefix("Bearer ")
}

/// Decode the payload segment of a JWT without verifying the signature.
fn decode_claims(token: &str) -> Option<JsonValue> {
    let payload = token.split('.').nth(1)?.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn claim_email(claims: &JsonValue) -> Option<String> {
    ["email", "preferred_username", "upn"]
        .iter()
        .find_map(|key| claims.get(key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

fn claim_groups(claims: &JsonValue) -> Vec<GroupName> {
    claims
        .get("groups")
        .and_then(|g| g.as_array())
        .map(|groups| {
            groups.iter().filter_map(|g| g.as_str()).map(GroupName::new).collect()
        })
        .unwrap_or_default()
}
