//! CLI entry point for alexandria.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use alexandria_core::AppConfig;

mod cli;
mod commands;
mod progress;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = resolve_config(&args)?;
    debug!(?config, "effective configuration");

    match &args.command {
        Command::Search(search) => commands::run_search_command(&config, search).await,
        Command::Match(matching) => commands::run_match_command(&config, matching).await,
        Command::Download(download) => {
            commands::run_download_command(&config, download, !args.quiet).await
        }
        Command::Library(library) => commands::run_library_command(&config, library).await,
        Command::Open(open) => commands::run_open_command(&config, open).await,
        Command::OpenDir => commands::run_open_dir_command(&config),
    }
}

/// Defaults, then the config file, then command-line overrides.
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(storage_root) = &args.storage_root {
        config.storage_root.clone_from(storage_root);
    }
    if let Some(catalog_host) = &args.catalog_host {
        config.catalog_host.clone_from(catalog_host);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
