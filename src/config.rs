use crate::errors::{AppError, AppResult};
use crate::types::{parse_network, AccountPolicy, AccountType, AddrType, MultisigPolicy};
use bitcoin::Network;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

/// Wallet configuration loaded from config.toml and environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub wallet: WalletConfig,
    pub database: DatabaseConfig,
    pub bitcoin_rpc: BitcoinRpcConfig,
    pub fee: FeeConfig,
    pub block: BlockConfig,
    pub file_path: FilePathConfig,
    /// Multisig policy per account name, e.g. `[multisig.deposit]`
    #[serde(default)]
    pub multisig: BTreeMap<String, MultisigPolicyConfig>,
    pub accounts: AccountsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Coin code written into every handoff file line
    pub coin: String,
    pub network: String,
    /// Address type for multisig registration and Watch imports
    pub address_type: String,
    /// Authorization account owned by the Signature wallet
    pub auth_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Bitcoin node RPC configuration
///
/// Watch talks to an online node; the cold roles talk to their own offline node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinRpcConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_seconds: u64,
}

impl Default for BitcoinRpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:18443".to_string(),
            username: "bitcoin".to_string(),
            password: "password".to_string(),
            max_retries: 5,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    pub adjustment_min: f64,
    pub adjustment_max: f64,
    /// Blocks passed to estimatesmartfee
    pub confirmation_target: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockConfig {
    /// Confirmations before a sent transaction counts as done
    pub confirmation_num: u64,
}

/// Default directories for handoff files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePathConfig {
    pub tx: PathBuf,
    pub address: PathBuf,
    pub pubkey: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultisigPolicyConfig {
    pub required: usize,
    pub auth_accounts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Account that receives client deposits
    pub deposit_receiver: String,
    /// Account that funds payment requests
    pub payment_sender: String,
}

impl AppConfig {
    /// Load configuration from config.toml file and environment variables
    /// Environment variables take precedence over file configuration
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Same as [`AppConfig::load`] but reads an explicit file instead of `config.toml`
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let rpc = BitcoinRpcConfig::default();
        let mut builder = Config::builder()
            .set_default("wallet.coin", "btc")?
            .set_default("wallet.network", "regtest")?
            .set_default("wallet.address_type", "p2sh-segwit")?
            .set_default("wallet.auth_type", "auth1")?
            .set_default("database.path", "./data/wallet.db")?
            .set_default("bitcoin_rpc.url", rpc.url)?
            .set_default("bitcoin_rpc.username", rpc.username)?
            .set_default("bitcoin_rpc.password", rpc.password)?
            .set_default("bitcoin_rpc.max_retries", rpc.max_retries as i64)?
            .set_default("bitcoin_rpc.initial_backoff_ms", rpc.initial_backoff_ms)?
            .set_default("bitcoin_rpc.backoff_multiplier", rpc.backoff_multiplier)?
            .set_default("bitcoin_rpc.max_backoff_seconds", rpc.max_backoff_seconds)?
            .set_default("fee.adjustment_min", 0.5)?
            .set_default("fee.adjustment_max", 3.0)?
            .set_default("fee.confirmation_target", 6)?
            .set_default("block.confirmation_num", 6)?
            .set_default("file_path.tx", "./data/tx")?
            .set_default("file_path.address", "./data/address")?
            .set_default("file_path.pubkey", "./data/pubkey")?
            .set_default("accounts.deposit_receiver", "deposit")?
            .set_default("accounts.payment_sender", "payment")?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // WALLET_FEE__ADJUSTMENT_MAX=1.5 overrides fee.adjustment_max
        let config = builder
            .add_source(
                Environment::with_prefix("WALLET")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        if let Ok(db_path) = env::var("WALLET_DATABASE_PATH") {
            app_config.database.path = PathBuf::from(db_path);
        }
        if let Ok(url) = env::var("BITCOIN_RPC_URL") {
            app_config.bitcoin_rpc.url = url;
        }
        if let Ok(username) = env::var("BITCOIN_RPC_USERNAME") {
            app_config.bitcoin_rpc.username = username;
        }
        if let Ok(password) = env::var("BITCOIN_RPC_PASSWORD") {
            app_config.bitcoin_rpc.password = password;
        }

        Ok(app_config)
    }

    /// Check cross-field constraints the deserialiser cannot express
    pub fn validate(&self) -> AppResult<()> {
        self.network()?;
        self.address_type()?;
        let auth = self.auth_account()?;
        if !auth.is_authorization() {
            return Err(AppError::Config(format!(
                "wallet.auth_type must be an authorization account, got {}",
                auth
            )));
        }
        if self.fee.adjustment_min <= 0.0 || self.fee.adjustment_min > self.fee.adjustment_max {
            return Err(AppError::Config(format!(
                "invalid fee adjustment range [{}, {}]",
                self.fee.adjustment_min, self.fee.adjustment_max
            )));
        }
        if self.fee.confirmation_target == 0 {
            return Err(AppError::Config(
                "fee.confirmation_target must be at least 1".to_string(),
            ));
        }
        self.account_policy()?;
        self.deposit_receiver()?;
        self.payment_sender()?;
        Ok(())
    }

    pub fn network(&self) -> AppResult<Network> {
        parse_network(&self.wallet.network)
    }

    pub fn address_type(&self) -> AppResult<AddrType> {
        self.wallet.address_type.parse()
    }

    pub fn auth_account(&self) -> AppResult<AccountType> {
        self.wallet.auth_type.parse()
    }

    pub fn deposit_receiver(&self) -> AppResult<AccountType> {
        self.accounts.deposit_receiver.parse()
    }

    pub fn payment_sender(&self) -> AppResult<AccountType> {
        self.accounts.payment_sender.parse()
    }

    /// Typed and validated multisig policies
    pub fn account_policy(&self) -> AppResult<AccountPolicy> {
        let mut policies = BTreeMap::new();
        for (name, raw) in &self.multisig {
            let account: AccountType = name.parse()?;
            let auth_accounts = raw
                .auth_accounts
                .iter()
                .map(|a| a.parse())
                .collect::<AppResult<Vec<AccountType>>>()?;
            policies.insert(
                account,
                MultisigPolicy {
                    required: raw.required,
                    auth_accounts,
                },
            );
        }
        AccountPolicy::new(policies)
    }

    /// Get default config values for CLI argument defaults
    pub fn get_defaults() -> Result<Self, ConfigError> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(_) => Ok(Self {
                wallet: WalletConfig {
                    coin: "btc".to_string(),
                    network: "regtest".to_string(),
                    address_type: "p2sh-segwit".to_string(),
                    auth_type: "auth1".to_string(),
                },
                database: DatabaseConfig {
                    path: PathBuf::from("./data/wallet.db"),
                },
                bitcoin_rpc: BitcoinRpcConfig::default(),
                fee: FeeConfig {
                    adjustment_min: 0.5,
                    adjustment_max: 3.0,
                    confirmation_target: 6,
                },
                block: BlockConfig {
                    confirmation_num: 6,
                },
                file_path: FilePathConfig {
                    tx: PathBuf::from("./data/tx"),
                    address: PathBuf::from("./data/address"),
                    pubkey: PathBuf::from("./data/pubkey"),
                },
                multisig: BTreeMap::new(),
                accounts: AccountsConfig {
                    deposit_receiver: "deposit".to_string(),
                    payment_sender: "payment".to_string(),
                },
            }),
        }
    }
}
