//! mcpgate CLI library

pub mod cli;
pub mod error;
pub mod utils;

pub use error::{CliError, CliResult};
