use super::account::AccountType;
use super::address::{AddrStatus, AddrType};
use serde::{Deserialize, Serialize};

/// Output of HD derivation for one index, before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    pub account: AccountType,
    pub index: u32,
    pub p2pkh_address: String,
    pub p2sh_segwit_address: String,
    pub bech32_address: String,
    /// Compressed public key, hex encoded
    pub full_public_key: String,
    pub wif: String,
}

/// Stored key row, one per (coin, account, index)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub id: i64,
    pub coin: String,
    pub account: AccountType,
    pub index: u32,
    pub p2pkh_address: String,
    pub p2sh_segwit_address: String,
    pub bech32_address: String,
    pub full_public_key: String,
    pub wif: String,
    pub multisig_address: Option<String>,
    pub redeem_script: Option<String>,
    pub status: AddrStatus,
}

impl KeyRecord {
    /// Address that receives funds for this record
    ///
    /// Multisig accounts receive on the multisig address once it exists.
    pub fn receive_address(&self, addr_type: AddrType) -> &str {
        if let Some(multisig) = self.multisig_address.as_deref() {
            return multisig;
        }
        self.single_key_address(addr_type)
    }

    pub fn single_key_address(&self, addr_type: AddrType) -> &str {
        match addr_type {
            AddrType::Legacy => &self.p2pkh_address,
            AddrType::P2shSegwit => &self.p2sh_segwit_address,
            AddrType::Bech32 => &self.bech32_address,
        }
    }

    /// True when `address` is any of the addresses owned by this record
    pub fn owns_address(&self, address: &str) -> bool {
        self.p2pkh_address == address
            || self.p2sh_segwit_address == address
            || self.bech32_address == address
            || self.multisig_address.as_deref() == Some(address)
    }
}

/// Public key of an authorization account, shared between the cold roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPubkey {
    pub coin: String,
    pub auth_account: AccountType,
    pub full_public_key: String,
}

/// Account public key travelling from Keygen to Signature and back
///
/// Created unresolved; `multisig_address` and `redeem_script` are filled
/// once `addmultisigaddress` succeeds, `is_exported` once handed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigHandoff {
    pub id: i64,
    pub coin: String,
    pub account: AccountType,
    pub full_public_key: String,
    pub auth_accounts: Vec<AccountType>,
    pub multisig_address: Option<String>,
    pub redeem_script: Option<String>,
    pub index: u32,
    pub is_exported: bool,
}

impl MultisigHandoff {
    pub fn is_resolved(&self) -> bool {
        self.multisig_address.is_some() && self.redeem_script.is_some()
    }
}
