//! CLI error types

use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] mcpgate_config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] mcpgate_store::StoreError),

    #[error("Server error: {0}")]
    Server(#[from] mcpgate_server::ServerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
