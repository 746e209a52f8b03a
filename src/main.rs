//! Folder Backlinks - keeps markdown notes linked to the folders above them
//!
//! Runs a small plugin host over a vault directory: a file watcher feeds
//! lifecycle events to the backlinks plugin, and the console exposes its
//! commands.

mod app;
mod backlinks;
mod cli;
mod core;
mod plugin;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::BacklinksApp;
use cli::{Cli, Commands};
use crate::core::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {:#}", e);
        AppConfig::default()
    });

    let vault_path = match cli.vault.clone().or_else(|| config.last_vault.clone()) {
        Some(path) => path,
        None => anyhow::bail!("No vault given and no previous vault recorded; pass --vault <PATH>"),
    };

    let mut app = BacklinksApp::open(vault_path, config)?;
    match cli.command {
        Commands::Watch => app.run_watch().await,
        Commands::ProcessAll { yes } => app.run_process_all(yes),
        Commands::Settings { command } => app.run_settings(command),
    }
}
