//! CLI argument definitions

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mcpgate", about = "Multi-tenant MCP proxy gateway", version)]
pub struct Cli {
    /// Path to the gateway configuration file (TOML or YAML)
    #[arg(short, long, env = "MCPGATE_CONFIG", default_value = "mcpgate.toml")]
    pub config: String,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway
    Serve {
        /// Override the listen address from the config file
        #[arg(long)]
        addr: Option<String>,
    },

    /// Load and validate the configuration, then print a summary
    CheckConfig,

    /// Apply pending database migrations and exit
    Migrate,
}
