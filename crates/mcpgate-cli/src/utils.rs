//! Shared CLI helpers

use crate::error::CliResult;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with RUST_LOG support, defaulting to info.
pub fn init_tracing() -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

pub struct ColoredOutput;

impl ColoredOutput {
    pub fn error(text: &str) -> String {
        text.red().bold().to_string()
    }

    pub fn success(text: &str) -> String {
        text.green().bold().to_string()
    }
}
