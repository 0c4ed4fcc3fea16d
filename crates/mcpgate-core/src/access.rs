//! Access-control evaluation
//!
//! Pure policy: given a resolved identity and the registry snapshot, compute
//! the set of servers the caller may see. Database-sourced group grants are
//! merged in by the server layer before calling into here.

use crate::registry::TenantRegistry;
use crate::types::{AuthorizedAccess, Identity, ServerId};

/// Compute the servers visible to `identity`.
///
/// Unknown group names are ignored. Any resolved group flagged superuser
/// grants every enabled server; otherwise the result is the union of the
/// groups' allow-lists intersected with the enabled set. An empty result is
/// access denial by omission, not an error.
pub fn authorize(registry: &TenantRegistry, identity: &Identity) -> AuthorizedAccess {
    let enabled = registry.enabled_ids();

    let mut server_ids = std::collections::BTreeSet::new();
    for name in &identity.groups {
        let Some(group) = registry.get_group(name) else {
            continue;
        };
        if group.is_superuser {
            return AuthorizedAccess { server_ids: enabled };
        }
        server_ids.extend(group.allowed_server_ids.iter().filter(|id| enabled.contains(*id)).cloned());
    }

    AuthorizedAccess { server_ids }
}

/// Per-invocation check used by the router. Defined as membership in
/// [`authorize`]'s result so the two paths cannot diverge.
pub fn can_access(registry: &TenantRegistry, identity: &Identity, server_id: &ServerId) -> bool {
    authorize(registry, identity).contains(server_id)
}
