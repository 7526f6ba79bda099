use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle position of a key record
///
/// Stored as an integer so each status doubles as a work queue for the
/// next stage. Multisig accounts pass through `PubkeyExported` and
/// `MultisigImported`; everything else jumps from `PrivKeyImported`
/// straight to `AddressExported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddrStatus {
    Generated = 0,
    PrivKeyImported = 1,
    PubkeyExported = 2,
    MultisigImported = 3,
    AddressExported = 4,
}

impl AddrStatus {
    /// The single legal successor for this status, if any
    pub fn next(self, is_multisig: bool) -> Option<AddrStatus> {
        match (self, is_multisig) {
            (AddrStatus::Generated, _) => Some(AddrStatus::PrivKeyImported),
            (AddrStatus::PrivKeyImported, true) => Some(AddrStatus::PubkeyExported),
            (AddrStatus::PrivKeyImported, false) => Some(AddrStatus::AddressExported),
            (AddrStatus::PubkeyExported, true) => Some(AddrStatus::MultisigImported),
            (AddrStatus::MultisigImported, true) => Some(AddrStatus::AddressExported),
            (AddrStatus::PubkeyExported | AddrStatus::MultisigImported, false) => None,
            (AddrStatus::AddressExported, _) => None,
        }
    }

    pub fn can_advance(self, to: AddrStatus, is_multisig: bool) -> bool {
        self.next(is_multisig) == Some(to)
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(value: i64) -> AppResult<Self> {
        match value {
            0 => Ok(AddrStatus::Generated),
            1 => Ok(AddrStatus::PrivKeyImported),
            2 => Ok(AddrStatus::PubkeyExported),
            3 => Ok(AddrStatus::MultisigImported),
            4 => Ok(AddrStatus::AddressExported),
            other => Err(AppError::InvalidData(format!(
                "unknown address status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for AddrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddrStatus::Generated => "generated",
            AddrStatus::PrivKeyImported => "privkey_imported",
            AddrStatus::PubkeyExported => "pubkey_exported",
            AddrStatus::MultisigImported => "multisig_imported",
            AddrStatus::AddressExported => "address_exported",
        };
        f.write_str(name)
    }
}

/// Script type requested from the node for multisig addresses and used
/// when picking which derived address Watch imports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddrType {
    Legacy,
    P2shSegwit,
    Bech32,
}

impl AddrType {
    /// Name understood by `addmultisigaddress`
    pub fn as_str(&self) -> &'static str {
        match self {
            AddrType::Legacy => "legacy",
            AddrType::P2shSegwit => "p2sh-segwit",
            AddrType::Bech32 => "bech32",
        }
    }
}

impl fmt::Display for AddrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddrType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" | "p2pkh" => Ok(AddrType::Legacy),
            "p2sh-segwit" | "p2sh_segwit" => Ok(AddrType::P2shSegwit),
            "bech32" | "p2wpkh" => Ok(AddrType::Bech32),
            other => Err(AppError::Config(format!("unknown address type: {}", other))),
        }
    }
}
