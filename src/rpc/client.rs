use crate::config::BitcoinRpcConfig;
use crate::errors::{AppError, AppResult, RpcError, RpcResult};
use crate::rpc::node::{
    btc_to_sat, sat_to_btc, AddressInfo, ChainNode, MultisigAddress, SignedTx, UnspentOutput,
};
use crate::rpc::retry::retry_with_backoff;
use crate::types::{AddrType, PrevTx};
use bitcoin::Network;
use corepc_client::client_sync::{v28::Client, Auth};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

/// `listunspent` upper bound on confirmations
const MAX_CONFIRMATIONS: u64 = 9_999_999;

#[derive(Deserialize)]
struct BlockchainInfoResponse {
    chain: String,
    blocks: u64,
}

#[derive(Deserialize)]
struct UnspentResponse {
    txid: String,
    vout: u32,
    #[serde(default)]
    address: String,
    #[serde(default)]
    label: String,
    #[serde(rename = "scriptPubKey")]
    script_pub_key: String,
    #[serde(rename = "redeemScript")]
    redeem_script: Option<String>,
    amount: f64,
    confirmations: u64,
}

#[derive(Deserialize)]
struct EstimateSmartFeeResponse {
    feerate: Option<f64>,
}

#[derive(Deserialize)]
struct NetworkInfoResponse {
    relayfee: f64,
}

#[derive(Deserialize)]
struct SignRawResponse {
    hex: String,
    complete: bool,
}

#[derive(Deserialize)]
struct MultisigResponse {
    address: String,
    #[serde(rename = "redeemScript")]
    redeem_script: String,
}

#[derive(Deserialize)]
struct AddressInfoResponse {
    address: String,
    pubkey: Option<String>,
    #[serde(default)]
    iswatchonly: bool,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct WalletTransactionResponse {
    confirmations: i64,
}

/// Bitcoin Core JSON-RPC client
///
/// Read-only calls are retried with exponential backoff; calls that change
/// node or wallet state are sent once and any failure is returned as-is.
pub struct BitcoinRpcClient {
    client: Client,
    config: BitcoinRpcConfig,
}

impl BitcoinRpcClient {
    /// Create a client and check the node answers
    pub fn new(config: BitcoinRpcConfig) -> RpcResult<Self> {
        let auth = Auth::UserPass(config.username.clone(), config.password.clone());
        let client = Client::new_with_auth(&config.url, auth).map_err(|e| {
            RpcError::ConnectionFailed(format!("Failed to create Bitcoin RPC client: {}", e))
        })?;

        let rpc = Self { client, config };
        let info: BlockchainInfoResponse = rpc.call_once("getblockchaininfo", &[]).map_err(|e| {
            RpcError::ConnectionFailed(format!(
                "Failed to connect to Bitcoin RPC - check URL, credentials, and that Bitcoin Core is running: {}",
                e
            ))
        })?;
        info!(
            "Bitcoin RPC connection established - chain: {}, blocks: {}",
            info.chain, info.blocks
        );
        Ok(rpc)
    }

    /// Fail when the node runs a different chain than the wallet is configured for
    pub fn verify_network(&self, expected: Network) -> AppResult<()> {
        let chain = self.chain()?;
        let wanted = core_chain_name(expected);
        if chain != wanted {
            return Err(AppError::NetworkMismatch {
                expected: wanted.to_string(),
                found: chain,
            });
        }
        debug!("Node chain {} matches configuration", chain);
        Ok(())
    }

    fn call_once<T: DeserializeOwned>(&self, method: &str, args: &[Value]) -> RpcResult<T> {
        self.client.call::<T>(method, args).map_err(|e| {
            let message = e.to_string();
            if message.contains("No such mempool or blockchain transaction")
                || message.contains("Invalid or non-wallet transaction id")
            {
                let txid = args
                    .first()
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                return RpcError::TransactionNotFound { txid };
            }
            RpcError::CallFailed {
                method: method.to_string(),
                message,
            }
        })
    }

    fn call_with_retry<T: DeserializeOwned>(&self, method: &str, args: &[Value]) -> RpcResult<T> {
        retry_with_backoff(&self.config, method, || self.call_once(method, args))
    }
}

impl ChainNode for BitcoinRpcClient {
    fn chain(&self) -> RpcResult<String> {
        let info: BlockchainInfoResponse = self.call_with_retry("getblockchaininfo", &[])?;
        Ok(info.chain)
    }

    fn list_unspent(&self, min_confirmations: u64) -> RpcResult<Vec<UnspentOutput>> {
        let unspent: Vec<UnspentResponse> = self.call_with_retry(
            "listunspent",
            &[json!(min_confirmations), json!(MAX_CONFIRMATIONS)],
        )?;
        unspent
            .into_iter()
            .map(|u| {
                Ok(UnspentOutput {
                    amount: btc_to_sat(u.amount)?,
                    txid: u.txid,
                    vout: u.vout,
                    address: u.address,
                    label: u.label,
                    script_pub_key: u.script_pub_key,
                    redeem_script: u.redeem_script,
                    confirmations: u.confirmations,
                })
            })
            .collect()
    }

    fn create_raw_transaction(
        &self,
        inputs: &[(String, u32)],
        outputs: &[(String, u64)],
    ) -> RpcResult<String> {
        let inputs: Vec<Value> = inputs
            .iter()
            .map(|(txid, vout)| json!({ "txid": txid, "vout": vout }))
            .collect();
        // Array form keeps output order stable
        let outputs: Vec<Value> = outputs
            .iter()
            .map(|(address, amount)| {
                let mut output = Map::new();
                output.insert(address.clone(), json!(sat_to_btc(*amount)));
                Value::Object(output)
            })
            .collect();
        self.call_with_retry(
            "createrawtransaction",
            &[Value::Array(inputs), Value::Array(outputs)],
        )
    }

    fn estimate_smart_fee(&self, confirmation_target: u16) -> RpcResult<Option<u64>> {
        let estimate: EstimateSmartFeeResponse =
            self.call_with_retry("estimatesmartfee", &[json!(confirmation_target)])?;
        estimate.feerate.map(btc_to_sat).transpose()
    }

    fn relay_fee(&self) -> RpcResult<u64> {
        let info: NetworkInfoResponse = self.call_with_retry("getnetworkinfo", &[])?;
        btc_to_sat(info.relayfee)
    }

    fn sign_raw_transaction_with_key(
        &self,
        hex: &str,
        wifs: &[String],
        prev_txs: &[PrevTx],
    ) -> RpcResult<SignedTx> {
        let prev_txs: Vec<Value> = prev_txs
            .iter()
            .map(|p| {
                let mut prev = json!({
                    "txid": p.txid,
                    "vout": p.vout,
                    "scriptPubKey": p.script_pub_key,
                    "amount": sat_to_btc(p.amount),
                });
                if !p.redeem_script.is_empty() {
                    prev["redeemScript"] = json!(p.redeem_script);
                }
                prev
            })
            .collect();
        let signed: SignRawResponse = self.call_with_retry(
            "signrawtransactionwithkey",
            &[json!(hex), json!(wifs), Value::Array(prev_txs)],
        )?;
        Ok(SignedTx {
            hex: signed.hex,
            complete: signed.complete,
        })
    }

    fn add_multisig_address(
        &self,
        required: usize,
        pubkeys: &[String],
        label: &str,
        address_type: AddrType,
    ) -> RpcResult<MultisigAddress> {
        let result: MultisigResponse = self.call_once(
            "addmultisigaddress",
            &[
                json!(required),
                json!(pubkeys),
                json!(label),
                json!(address_type.as_str()),
            ],
        )?;
        Ok(MultisigAddress {
            address: result.address,
            redeem_script: result.redeem_script,
        })
    }

    fn send_raw_transaction(&self, hex: &str) -> RpcResult<String> {
        self.call_once("sendrawtransaction", &[json!(hex)])
    }

    fn import_priv_key(&self, wif: &str, label: &str, rescan: bool) -> RpcResult<()> {
        let _: Value = self.call_once("importprivkey", &[json!(wif), json!(label), json!(rescan)])?;
        Ok(())
    }

    fn import_address(&self, address: &str, label: &str, rescan: bool) -> RpcResult<()> {
        let _: Value =
            self.call_once("importaddress", &[json!(address), json!(label), json!(rescan)])?;
        Ok(())
    }

    fn get_address_info(&self, address: &str) -> RpcResult<AddressInfo> {
        let info: AddressInfoResponse = self.call_with_retry("getaddressinfo", &[json!(address)])?;
        Ok(AddressInfo {
            address: info.address,
            pubkey: info.pubkey,
            is_watch_only: info.iswatchonly,
            labels: info.labels,
        })
    }

    fn get_transaction_confirmations(&self, txid: &str) -> RpcResult<u64> {
        let tx: WalletTransactionResponse = self.call_with_retry("gettransaction", &[json!(txid)])?;
        // Negative confirmations mean the transaction conflicts with the chain
        Ok(tx.confirmations.max(0) as u64)
    }
}

/// Chain name as Bitcoin Core reports it
pub fn core_chain_name(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => "main",
        Network::Testnet => "test",
        Network::Signet => "signet",
        Network::Regtest => "regtest",
        _ => "unknown",
    }
}
