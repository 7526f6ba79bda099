use super::test_rpc::TestRpcCommand;
use super::{connect_node, parse_account, print_created, print_stats};
use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::wallet::{open_database, WatchWallet};
use clap::Subcommand;
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand)]
pub enum WatchCommand {
    /// Import an address file exported by the keygen or signature wallet
    ImportAddress {
        #[arg(long)]
        file: PathBuf,
    },
    /// Sweep client outputs into the deposit receiver account
    CreateDeposit {
        /// Fee multiplier, clamped to the configured range
        #[arg(long, default_value_t = 1.0)]
        fee: f64,
    },
    /// Pay all open payment requests
    CreatePayment {
        #[arg(long, default_value_t = 1.0)]
        fee: f64,
    },
    /// Move funds between internal accounts
    CreateTransfer {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        receiver: String,
        /// Satoshis; 0 transfers everything
        #[arg(long, default_value_t = 0)]
        amount: u64,
        #[arg(long, default_value_t = 1.0)]
        fee: f64,
    },
    /// Queue a payment to an external address
    AddPaymentRequest {
        #[arg(long)]
        receiver: String,
        /// Satoshis
        #[arg(long)]
        amount: u64,
        /// Client address the request is attributed to
        #[arg(long)]
        sender: Option<String>,
    },
    /// Broadcast a signed transaction file, or every unsent one in the tx directory
    Send {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Update confirmations of sent transactions
    Monitor,
    /// Test Bitcoin RPC connectivity
    TestRpc(TestRpcCommand),
}

impl WatchCommand {
    pub fn run(&self, config: &AppConfig) -> AppResult<()> {
        if let Self::TestRpc(command) = self {
            return command.run(config);
        }

        info!("=== Watch wallet ===");
        let mut wallet = WatchWallet::new(open_database(config)?, config)?;

        match self {
            Self::ImportAddress { file } => {
                let node = connect_node(config)?;
                let stats = wallet.import_addresses(&node, file)?;
                print_stats("Address import", &stats);
            }
            Self::CreateDeposit { fee } => {
                let node = connect_node(config)?;
                print_created(&wallet.create_deposit(&node, *fee)?);
            }
            Self::CreatePayment { fee } => {
                let node = connect_node(config)?;
                print_created(&wallet.create_payment(&node, *fee)?);
            }
            Self::CreateTransfer {
                sender,
                receiver,
                amount,
                fee,
            } => {
                let node = connect_node(config)?;
                let outcome = wallet.create_transfer(
                    &node,
                    parse_account(sender)?,
                    parse_account(receiver)?,
                    *amount,
                    *fee,
                )?;
                print_created(&outcome);
            }
            Self::AddPaymentRequest {
                receiver,
                amount,
                sender,
            } => {
                let id = wallet.add_payment_request(sender.as_deref(), receiver, *amount)?;
                println!("Payment request {} queued", id);
            }
            Self::Send { file } => {
                let node = connect_node(config)?;
                match file {
                    Some(file) => {
                        let sent = wallet.send(&node, file)?;
                        println!("Transaction {} sent: {}", sent.tx_id, sent.sent_hash);
                    }
                    None => print_stats("Broadcast", &wallet.send_pending(&node)?),
                }
            }
            Self::Monitor => {
                let node = connect_node(config)?;
                let (confirmed, notified) = wallet.monitor(&node)?;
                print_stats("Confirmed", &confirmed);
                print_stats("Notified", &notified);
            }
            Self::TestRpc(_) => {}
        }
        Ok(())
    }
}
