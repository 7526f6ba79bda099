//! Previous-output context carried next to unsigned transaction hex
//!
//! Offline signers have no UTXO set, so every handoff of an unsigned
//! transaction carries the scriptPubKey and amount of each spent output,
//! plus the redeem script once Keygen has filled it in.

use super::account::AccountType;
use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// One spent output, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevTx {
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: String,
    /// Empty until injected by the Keygen signing round
    #[serde(rename = "redeemScript", default)]
    pub redeem_script: String,
    /// Satoshis
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevTxContext {
    #[serde(rename = "senderAccount")]
    pub sender_account: AccountType,
    #[serde(rename = "prevTxs")]
    pub prev_txs: Vec<PrevTx>,
    /// Input addresses, same order as `prev_txs`
    pub addrs: Vec<String>,
}

impl PrevTxContext {
    /// Serialise as base64 of the JSON document
    pub fn encode(&self) -> AppResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(encoded: &str) -> AppResult<Self> {
        let bytes = STANDARD.decode(encoded.trim())?;
        let context: PrevTxContext = serde_json::from_slice(&bytes)?;
        if context.prev_txs.len() != context.addrs.len() {
            return Err(AppError::InvalidData(format!(
                "prev tx context has {} outputs but {} addresses",
                context.prev_txs.len(),
                context.addrs.len()
            )));
        }
        Ok(context)
    }

    /// True when every input has a redeem script attached
    pub fn has_all_redeem_scripts(&self) -> bool {
        self.prev_txs.iter().all(|p| !p.redeem_script.is_empty())
    }
}
