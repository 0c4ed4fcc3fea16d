pub mod backend;
pub mod error;
pub mod mcp_backend;
pub mod openapi_backend;

pub use backend::{BackendClient, ClientFactory, ToolDescriptor};
pub use error::{ClientError, ClientResult};
pub use mcp_backend::McpStreamableBackend;
pub use openapi_backend::OpenApiBackend;
