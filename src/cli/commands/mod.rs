pub mod keygen;
pub mod sign;
pub mod test_rpc;
pub mod watch;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::processor::{BatchStats, CreateOutcome};
use crate::rpc::BitcoinRpcClient;
use crate::types::AccountType;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load and validate configuration, applying CLI overrides
pub fn load_config(path: Option<&Path>, database_path: Option<PathBuf>) -> AppResult<AppConfig> {
    let mut config = AppConfig::load_from(path).map_err(|e| {
        warn!("Failed to load configuration: {}", e);
        AppError::Config(format!(
            "{}. Check config.toml or the WALLET_* / BITCOIN_RPC_* environment variables",
            e
        ))
    })?;
    if let Some(database_path) = database_path {
        config.database.path = database_path;
    }
    config.validate()?;
    info!(
        "Configuration loaded: {} on {}",
        config.wallet.coin, config.wallet.network
    );
    Ok(config)
}

/// Connect to the configured node and check it runs the configured chain
pub fn connect_node(config: &AppConfig) -> AppResult<BitcoinRpcClient> {
    let client = BitcoinRpcClient::new(config.bitcoin_rpc.clone())?;
    client.verify_network(config.network()?)?;
    Ok(client)
}

pub(crate) fn parse_account(value: &str) -> AppResult<AccountType> {
    value.parse()
}

pub(crate) fn print_stats(operation: &str, stats: &BatchStats) {
    println!("{}: {}", operation, stats);
}

pub(crate) fn print_created(outcome: &CreateOutcome) {
    match outcome {
        CreateOutcome::Created(created) => println!(
            "Transaction {} created: {} (fee {} sat)",
            created.tx_id,
            created.path.display(),
            created.fee
        ),
        CreateOutcome::Duplicate { tx_id } => {
            println!("Identical transaction already exists as {}", tx_id)
        }
        CreateOutcome::NothingToDo => println!("Nothing to do"),
    }
}

pub(crate) fn print_path(what: &str, path: Option<&Path>) {
    match path {
        Some(path) => println!("{} written to {}", what, path.display()),
        None => println!("No {} to write", what),
    }
}
