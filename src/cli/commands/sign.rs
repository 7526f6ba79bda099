use super::{connect_node, parse_account, print_path, print_stats};
use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::wallet::{open_database, SignatureWallet};
use clap::Subcommand;
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand)]
pub enum SignCommand {
    /// Generate the seed (or store a known one)
    CreateSeed {
        /// Hex seed to store instead of generating one (development only)
        #[arg(long)]
        seed: Option<String>,
    },
    /// Derive the authorization key configured as wallet.auth_type
    CreateKey,
    /// Import the authorization private key into the offline node
    ImportPrivkey,
    /// Export the authorization pubkey
    ExportAuthPubkey,
    /// Import pubkeys of other authorization accounts
    ImportAuthPubkey {
        #[arg(long)]
        file: PathBuf,
    },
    /// Import account pubkeys exported by the keygen wallet
    ImportPubkey {
        #[arg(long)]
        file: PathBuf,
    },
    /// Register multisig addresses for imported account pubkeys
    CreateMultisig,
    /// Export resolved multisig addresses for the keygen wallet
    ExportMultisig {
        #[arg(long)]
        account: String,
    },
    /// Sign a partially signed transaction file
    Sign {
        #[arg(long)]
        file: PathBuf,
    },
}

impl SignCommand {
    pub fn run(&self, config: &AppConfig) -> AppResult<()> {
        info!("=== Signature wallet ===");
        let mut wallet = SignatureWallet::new(open_database(config)?, config)?;

        match self {
            Self::CreateSeed { seed } => {
                let fingerprint = match seed {
                    Some(seed) => wallet.store_seed(seed)?,
                    None => wallet.create_seed()?,
                };
                println!("Seed fingerprint: {}", fingerprint);
            }
            Self::CreateKey => {
                let key = wallet.create_key()?;
                println!("{} {}", key.account, key.full_public_key);
            }
            Self::ImportPrivkey => {
                let node = connect_node(config)?;
                let stats = wallet.import_privkey(&node)?;
                print_stats("Private key import", &stats);
            }
            Self::ExportAuthPubkey => {
                let path = wallet.export_auth_pubkey()?;
                print_path("Authorization pubkey file", Some(&path));
            }
            Self::ImportAuthPubkey { file } => {
                let stats = wallet.import_auth_pubkeys(file)?;
                print_stats("Authorization pubkey import", &stats);
            }
            Self::ImportPubkey { file } => {
                let stats = wallet.import_pubkeys(file)?;
                print_stats("Pubkey import", &stats);
            }
            Self::CreateMultisig => {
                let node = connect_node(config)?;
                let stats = wallet.create_multisig(&node)?;
                print_stats("Multisig registration", &stats);
            }
            Self::ExportMultisig { account } => {
                let path = wallet.export_multisig(parse_account(account)?)?;
                print_path("Multisig file", path.as_deref());
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
