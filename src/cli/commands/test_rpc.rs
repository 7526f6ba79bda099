use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::rpc::{BitcoinRpcClient, ChainNode};
use clap::Args;
use tracing::{error, info};

/// Test Bitcoin RPC connectivity
#[derive(Args)]
pub struct TestRpcCommand {
    /// Bitcoin RPC URL
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Bitcoin RPC username
    #[arg(long)]
    pub rpc_username: Option<String>,

    /// Bitcoin RPC password
    #[arg(long)]
    pub rpc_password: Option<String>,
}

impl TestRpcCommand {
    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        info!("=== Testing Bitcoin RPC Connection ===");
        let mut rpc_config = app_config.bitcoin_rpc.clone();

        // Override with CLI arguments
        if let Some(url) = &self.rpc_url {
            rpc_config.url = url.clone();
        }
        if let Some(username) = &self.rpc_username {
            rpc_config.username = username.clone();
        }
        if let Some(password) = &self.rpc_password {
            rpc_config.password = password.clone();
        }

        info!("Testing connection to: {}", rpc_config.url);
        info!("Username: {}", rpc_config.username);

        let client = match BitcoinRpcClient::new(rpc_config) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create RPC client: {}", e);
                println!("Bitcoin RPC connection test FAILED");
                println!("Error: {}", e);
                println!("\nTroubleshooting tips:");
                println!("1. Check that Bitcoin Core is running");
                println!("2. Verify the RPC URL is correct");
                println!("3. Ensure RPC credentials are valid");
                println!("4. Check that RPC server is enabled in bitcoin.conf");
                return Err(AppError::Config(format!(
                    "RPC client creation failed: {}",
                    e
                )));
            }
        };

        client.verify_network(app_config.network()?)?;
        let relay_fee = client.relay_fee()?;
        println!("Bitcoin RPC connection test PASSED");
        println!("Chain: {} (relay fee {} sat/kvB)", client.chain()?, relay_fee);
        Ok(())
    }
}
