pub mod access_store;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod sql_store;

pub use access_store::{AccessStore, CredentialOverride};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sql_store::SqlStore;
