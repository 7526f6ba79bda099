//! Air-gapped wallet - Type System
//!
//! - `account`: Account buckets, multisig policy and transfer rules
//! - `address`: Address lifecycle status and address types
//! - `keys`: Derived keys, stored key records and multisig handoff records
//! - `transaction`: Transaction envelopes, inputs/outputs and payment requests
//! - `prev_tx`: Previous-output context carried alongside transaction hex

pub mod account;
pub mod address;
pub mod keys;
pub mod prev_tx;
pub mod transaction;

pub use account::{AccountPolicy, AccountType, MultisigPolicy};
pub use address::{AddrStatus, AddrType};
pub use keys::{AuthPubkey, DerivedKey, KeyRecord, MultisigHandoff};
pub use prev_tx::{PrevTx, PrevTxContext};
pub use transaction::{
    ActionType, PaymentRequest, TxEnvelope, TxInputRecord, TxOutputRecord, TxType, WatchAddress,
};

use crate::errors::{AppError, AppResult};
use bitcoin::Network;

/// Parse a configured network name into chain parameters
///
/// Accepts the names used in wallet configuration files (`mainnet`, `testnet`,
/// `testnet3`, `signet`, `regtest`) as well as Bitcoin Core's chain names.
pub fn parse_network(name: &str) -> AppResult<Network> {
    match name.to_ascii_lowercase().as_str() {
        "mainnet" | "main" | "bitcoin" => Ok(Network::Bitcoin),
        "testnet" | "testnet3" | "test" => Ok(Network::Testnet),
        "signet" => Ok(Network::Signet),
        "regtest" => Ok(Network::Regtest),
        other => Err(AppError::Config(format!("unknown network: {}", other))),
    }
}
