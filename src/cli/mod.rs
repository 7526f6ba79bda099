use crate::errors::AppResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Air-gapped Bitcoin custody wallet (keygen, signature and watch roles)
#[derive(Parser)]
#[command(name = "airgap-wallet")]
#[command(about = "Air-gapped Bitcoin custody wallet")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path (overrides config.toml and env vars)
    #[arg(long, global = true)]
    pub database_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Wallet roles
#[derive(Subcommand)]
pub enum Commands {
    /// Offline key generation wallet
    #[command(subcommand)]
    Keygen(commands::keygen::KeygenCommand),
    /// Offline authorization (second signature) wallet
    #[command(subcommand)]
    Sign(commands::sign::SignCommand),
    /// Online watch-only wallet
    #[command(subcommand)]
    Watch(commands::watch::WatchCommand),
}

pub fn run() -> AppResult<()> {
    // RUST_LOG overrides the default "info" filter
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.database_path)?;

    match cli.command {
        Commands::Keygen(command) => command.run(&config),
        Commands::Sign(command) => command.run(&config),
        Commands::Watch(command) => command.run(&config),
    }
}
