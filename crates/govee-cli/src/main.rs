mod cli;
mod commands;
mod config;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use govee_store::Store;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // btleplug is chatty at info level; keep it at warn unless the user
    // asks for more via RUST_LOG or --verbose.
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,btleplug=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();
    let open_store = || {
        Store::open(config.resolve_database(cli.database.clone())).context("Failed to open database")
    };

    match &cli.command {
        Commands::Scan { scan, all } => {
            commands::scan::cmd_scan(scan, &config, *all, cli.json).await
        }
        Commands::Dump { scan } => {
            let store = open_store()?;
            commands::dump::cmd_dump(scan, &config, &store, cli.json).await
        }
        Commands::History { history } => {
            let store = open_store()?;
            commands::history::cmd_history(history, &config, &store, cli.json).await
        }
        Commands::Sync {
            history,
            days,
            force,
        } => {
            let store = open_store()?;
            commands::sync::cmd_sync(history, &config, &store, *days, *force).await
        }
        Commands::Alias { action } => {
            let store = open_store()?;
            commands::alias::cmd_alias(action, &store, cli.quiet)
        }
    }
}
