//! CSV exports exchanged between the roles
//!
//! Files are named `<kind>_<account>_<nanos>.csv` and have no header row;
//! columns are positional:
//! - address: `coin,account,p2pkh,p2sh_segwit,bech32,full_pubkey,multisig_address,index`
//! - pubkey: `coin,account,full_pubkey,index`
//! - authorization pubkey: `coin,authN,full_pubkey`
//! - multisig: `coin,account,full_pubkey,multisig_address,redeem_script,index`
//!
//! A reader rejects a file whose name is of another kind, or whose lines
//! carry another coin or another account than the name.

use crate::errors::{AppError, AppResult};
use crate::handoff::timestamp_nanos;
use crate::types::AccountType;
use csv::{ReaderBuilder, WriterBuilder};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

lazy_static! {
    static ref CSV_FILE_NAME: Regex =
        Regex::new(r"^(address|pubkey|auth_pubkey|multisig)_([a-z]+\d*)_(\d+)\.csv$")
            .unwrap_or_else(|e| panic!("invalid csv file name pattern: {}", e));
}

/// What a CSV handoff file carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvKind {
    Address,
    Pubkey,
    AuthPubkey,
    Multisig,
}

impl CsvKind {
    pub fn name(&self) -> &'static str {
        match self {
            CsvKind::Address => "address",
            CsvKind::Pubkey => "pubkey",
            CsvKind::AuthPubkey => "auth_pubkey",
            CsvKind::Multisig => "multisig",
        }
    }
}

impl fmt::Display for CsvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CsvKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(CsvKind::Address),
            "pubkey" => Ok(CsvKind::Pubkey),
            "auth_pubkey" => Ok(CsvKind::AuthPubkey),
            "multisig" => Ok(CsvKind::Multisig),
            other => Err(AppError::InvalidData(format!("unknown csv file kind: {}", other))),
        }
    }
}

/// Parsed `<kind>_<account>_<unixNanos>.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFileName {
    pub kind: CsvKind,
    pub account: AccountType,
    pub timestamp: i64,
}

impl CsvFileName {
    pub fn new(kind: CsvKind, account: AccountType) -> Self {
        Self {
            kind,
            account,
            timestamp: timestamp_nanos(),
        }
    }

    pub fn parse(path: &Path) -> AppResult<Self> {
        let invalid = |reason: &str| AppError::InvalidHandoffFile {
            file: path.display().to_string(),
            reason: reason.to_string(),
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| invalid("no file name"))?;
        let caps = CSV_FILE_NAME
            .captures(file_name)
            .ok_or_else(|| invalid("name does not match <kind>_<account>_<nanos>.csv"))?;

        Ok(Self {
            kind: caps[1].parse().map_err(|_| invalid("unknown kind"))?,
            account: caps[2].parse().map_err(|_| invalid("unknown account"))?,
            timestamp: caps[3].parse().map_err(|_| invalid("bad timestamp"))?,
        })
    }
}

impl fmt::Display for CsvFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}.csv", self.kind, self.account, self.timestamp)
    }
}

/// A line of one kind of CSV handoff file
pub trait HandoffRecord: Serialize + DeserializeOwned {
    const KIND: CsvKind;

    fn coin(&self) -> &str;

    /// Account the line belongs to; must match the file name
    fn account(&self) -> AccountType;
}

/// Address export consumed by Watch; never carries private key material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLine {
    pub coin: String,
    pub account: AccountType,
    pub p2pkh_address: String,
    pub p2sh_segwit_address: String,
    pub bech32_address: String,
    pub full_public_key: String,
    pub multisig_address: Option<String>,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubkeyLine {
    pub coin: String,
    pub account: AccountType,
    pub full_public_key: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPubkeyLine {
    pub coin: String,
    pub auth_account: AccountType,
    pub full_public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigLine {
    pub coin: String,
    pub account: AccountType,
    pub full_public_key: String,
    pub multisig_address: String,
    pub redeem_script: String,
    pub index: u32,
}

impl HandoffRecord for AddressLine {
    const KIND: CsvKind = CsvKind::Address;

    fn coin(&self) -> &str {
        &self.coin
    }

    fn account(&self) -> AccountType {
        self.account
    }
}

impl HandoffRecord for PubkeyLine {
    const KIND: CsvKind = CsvKind::Pubkey;

    fn coin(&self) -> &str {
        &self.coin
    }

    fn account(&self) -> AccountType {
        self.account
    }
}

impl HandoffRecord for AuthPubkeyLine {
    const KIND: CsvKind = CsvKind::AuthPubkey;

    fn coin(&self) -> &str {
        &self.coin
    }

    fn account(&self) -> AccountType {
        self.auth_account
    }
}

impl HandoffRecord for MultisigLine {
    const KIND: CsvKind = CsvKind::Multisig;

    fn coin(&self) -> &str {
        &self.coin
    }

    fn account(&self) -> AccountType {
        self.account
    }
}

/// `<dir>/<kind>_<account>_<nanos>.csv`
pub fn csv_file_path(dir: &Path, kind: CsvKind, account: AccountType) -> PathBuf {
    dir.join(CsvFileName::new(kind, account).to_string())
}

/// Write records to a new file; fails if `path` already exists
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read every record, failing on the first malformed line
pub fn read_records<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let records = reader
        .deserialize::<T>()
        .collect::<Result<Vec<T>, csv::Error>>()?;
    if records.is_empty() {
        return Err(AppError::InvalidHandoffFile {
            file: path.display().to_string(),
            reason: "file contains no records".to_string(),
        });
    }
    Ok(records)
}

/// Read a handoff file of `T::KIND` written for `coin`
///
/// The file name must name `T::KIND`, and every line must carry `coin`
/// and the account from the file name.
pub fn read_handoff_file<T: HandoffRecord>(path: &Path, coin: &str) -> AppResult<Vec<T>> {
    let invalid = |reason: String| AppError::InvalidHandoffFile {
        file: path.display().to_string(),
        reason,
    };

    let name = CsvFileName::parse(path)?;
    if name.kind != T::KIND {
        return Err(invalid(format!(
            "expected a {} file, found a {} file",
            T::KIND,
            name.kind
        )));
    }

    let records: Vec<T> = read_records(path)?;
    for (line, record) in records.iter().enumerate() {
        if record.coin() != coin {
            return Err(invalid(format!(
                "line {}: coin {} does not match {}",
                line + 1,
                record.coin(),
                coin
            )));
        }
        if record.account() != name.account {
            return Err(invalid(format!(
                "line {}: account {} does not match file account {}",
                line + 1,
                record.account(),
                name.account
            )));
        }
    }
    Ok(records)
}
