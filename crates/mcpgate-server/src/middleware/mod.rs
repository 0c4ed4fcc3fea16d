//! Tower middleware stack

pub mod identity;
pub mod request_id;

pub use identity::{CallerIdentity, IdentityLayer};
pub use request_id::{RequestId, RequestIdLayer};
