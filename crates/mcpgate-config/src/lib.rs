pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_from_file, load_from_str, FileFormat};
pub use schema::{AnonymousPolicy, GatewayConfig, GroupConfig, ServerConfig};
