pub mod access;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use access::{authorize, can_access};
pub use registry::{RegistryHandle, TenantRegistry};
pub use types::{
    AuthorizedAccess, GroupName, Identity, IdentitySource, ServerDescriptor, ServerId, ServerTier,
    TenantGroup, ToolCatalogEntry,
};
