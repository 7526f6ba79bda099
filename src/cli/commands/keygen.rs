use super::{connect_node, parse_account, print_path, print_stats};
use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::wallet::{open_database, KeygenWallet};
use clap::Subcommand;
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand)]
pub enum KeygenCommand {
    /// Generate the master seed (or store a known one)
    CreateSeed {
        /// Hex seed to store instead of generating one (development only)
        #[arg(long)]
        seed: Option<String>,
    },
    /// Derive the next keys of an account
    CreateKey {
        /// Account: client, deposit, payment, fee or stored
        #[arg(long)]
        account: String,
        #[arg(long, default_value_t = 10)]
        count: u32,
    },
    /// Import generated private keys into the offline node
    ImportPrivkey {
        #[arg(long)]
        account: String,
    },
    /// Export pubkeys of a multisig account for the signature wallet
    ExportPubkey {
        #[arg(long)]
        account: String,
    },
    /// Import authorization pubkeys exported by the signature wallet
    ImportAuthPubkey {
        #[arg(long)]
        file: PathBuf,
    },
    /// Register multisig addresses for exported account pubkeys
    CreateMultisig {
        #[arg(long)]
        account: String,
    },
    /// Import multisig addresses resolved by the signature wallet
    ImportMultisig {
        #[arg(long)]
        file: PathBuf,
    },
    /// Export receive addresses for the watch wallet
    ExportAddress {
        #[arg(long)]
        account: String,
    },
    /// Sign an unsigned transaction file (first round)
    Sign {
        #[arg(long)]
        file: PathBuf,
    },
}

impl KeygenCommand {
    pub fn run(&self, config: &AppConfig) -> AppResult<()> {
        info!("=== Keygen wallet ===");
        let mut wallet = KeygenWallet::new(open_database(config)?, config)?;

        match self {
            Self::CreateSeed { seed } => {
                let fingerprint = match seed {
                    Some(seed) => wallet.store_seed(seed)?,
                    None => wallet.create_seed()?,
                };
                println!("Seed fingerprint: {}", fingerprint);
            }
            Self::CreateKey { account, count } => {
                let keys = wallet.create_keys(parse_account(account)?, *count)?;
                for key in &keys {
                    println!("{} {} {}", key.account, key.index, key.full_public_key);
                }
            }
            Self::ImportPrivkey { account } => {
                let node = connect_node(config)?;
                let stats = wallet.import_privkeys(&node, parse_account(account)?)?;
                print_stats("Private key import", &stats);
            }
            Self::ExportPubkey { account } => {
                let path = wallet.export_pubkeys(parse_account(account)?)?;
                print_path("Pubkey file", path.as_deref());
            }
            Self::ImportAuthPubkey { file } => {
                let stats = wallet.import_auth_pubkeys(file)?;
                print_stats("Authorization pubkey import", &stats);
            }
            Self::CreateMultisig { account } => {
                let node = connect_node(config)?;
                let stats = wallet.create_multisig(&node, parse_account(account)?)?;
                print_stats("Multisig registration", &stats);
            }
            Self::ImportMultisig { file } => {
                let stats = wallet.import_multisig(file)?;
                print_stats("Multisig import", &stats);
            }
            Self::ExportAddress { account } => {
                let path = wallet.export_addresses(parse_account(account)?)?;
                print_path("Address file", path.as_deref());
            }
            Self::Sign { file } => {
                let node = connect_node(config)?;
                let outcome = wallet.sign(&node, file)?;
                println!(
                    "{} file written to {}",
                    if outcome.is_signed { "Signed" } else { "Partially signed" },
                    outcome.path.display()
                );
            }
        }
        Ok(())
    }
}
