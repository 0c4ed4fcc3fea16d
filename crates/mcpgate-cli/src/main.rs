//! mcpgate CLI main entry point

use clap::Parser;
use mcpgate_cli::{
    cli::{Cli, Commands},
    error::CliResult,
    utils::{init_tracing, ColoredOutput},
};
use tracing::info;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", ColoredOutput::error("Error:"), e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    init_tracing()?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    info!("mcpgate v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { addr } => {
            let config = mcpgate_config::load_from_file(&cli.config)?;
            let addr = addr.unwrap_or_else(|| config.listen_addr.clone());
            let app_state = mcpgate_server::AppState::from_config(&config).await?;
            mcpgate_server::serve(app_state, &addr).await.map_err(Into::into)
        }

        Commands::CheckConfig => {
            let config = mcpgate_config::load_from_file(&cli.config)?;
            let registry = config.build_registry();
            println!("{} {}", ColoredOutput::success("OK:"), cli.config);
            println!("  listen address:   {}", config.listen_addr);
            println!(
                "  servers:          {} configured, {} enabled",
                registry.server_count(),
                registry.list_enabled_servers().len()
            );
            println!("  groups:           {}", config.groups.len());
            println!("  trust gateway:    {}", config.trust_gateway_headers);
            println!("  cache TTL:        {}s", config.cache_ttl_secs);
            Ok(())
        }

        Commands::Migrate => {
            let config = mcpgate_config::load_from_file(&cli.config)?;
            let store = mcpgate_store::SqlStore::new(&config.database_url).await?;
            store.migrate().await?;
            println!("{} migrations applied", ColoredOutput::success("OK:"));
            Ok(())
        }
    }
}
