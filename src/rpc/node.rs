//! The node seen as an opaque UTXO-chain API
//!
//! Processors depend on [`ChainNode`] only, so the same code runs against
//! Bitcoin Core over JSON-RPC and against in-process doubles in tests.
//! Amounts crossing this boundary are satoshis; fee rates are sat/kvB.

use crate::errors::{RpcError, RpcResult};
use crate::types::{AddrType, PrevTx};
use bitcoin::Amount;

/// Spendable output as reported by `listunspent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentOutput {
    pub txid: String,
    pub vout: u32,
    pub address: String,
    /// Label the address was imported with (the account name)
    pub label: String,
    pub script_pub_key: String,
    pub redeem_script: Option<String>,
    pub amount: u64,
    pub confirmations: u64,
}

/// Result of `signrawtransactionwithkey`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub hex: String,
    /// True when every input carries enough signatures
    pub complete: bool,
}

/// Result of `addmultisigaddress`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigAddress {
    pub address: String,
    pub redeem_script: String,
}

/// Subset of `getaddressinfo`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressInfo {
    pub address: String,
    pub pubkey: Option<String>,
    pub is_watch_only: bool,
    pub labels: Vec<String>,
}

/// Operations every wallet role may need from a node
pub trait ChainNode {
    /// Chain name as reported by `getblockchaininfo` (`main`, `test`, `regtest`, ...)
    fn chain(&self) -> RpcResult<String>;

    fn list_unspent(&self, min_confirmations: u64) -> RpcResult<Vec<UnspentOutput>>;

    /// Build an unsigned transaction; `outputs` keep their order
    fn create_raw_transaction(
        &self,
        inputs: &[(String, u32)],
        outputs: &[(String, u64)],
    ) -> RpcResult<String>;

    /// Estimated rate in sat/kvB, `None` when the node has no estimate yet
    fn estimate_smart_fee(&self, confirmation_target: u16) -> RpcResult<Option<u64>>;

    /// Minimum relay rate in sat/kvB
    fn relay_fee(&self) -> RpcResult<u64>;

    fn sign_raw_transaction_with_key(
        &self,
        hex: &str,
        wifs: &[String],
        prev_txs: &[PrevTx],
    ) -> RpcResult<SignedTx>;

    fn add_multisig_address(
        &self,
        required: usize,
        pubkeys: &[String],
        label: &str,
        address_type: AddrType,
    ) -> RpcResult<MultisigAddress>;

    /// Broadcast; returns the transaction hash
    fn send_raw_transaction(&self, hex: &str) -> RpcResult<String>;

    fn import_priv_key(&self, wif: &str, label: &str, rescan: bool) -> RpcResult<()>;

    fn import_address(&self, address: &str, label: &str, rescan: bool) -> RpcResult<()>;

    fn get_address_info(&self, address: &str) -> RpcResult<AddressInfo>;

    /// Confirmations of a wallet transaction
    fn get_transaction_confirmations(&self, txid: &str) -> RpcResult<u64>;
}

/// Convert a node BTC amount to satoshis
///
/// Negative, non-finite and sub-satoshi values are rejected.
pub fn btc_to_sat(btc: f64) -> RpcResult<u64> {
    Amount::from_btc(btc)
        .map(Amount::to_sat)
        .map_err(|e| RpcError::InvalidResponse(format!("invalid BTC amount {}: {}", btc, e)))
}

pub fn sat_to_btc(sat: u64) -> f64 {
    Amount::from_sat(sat).to_btc()
}
