//! Flat-file transport between the air-gapped roles
//!
//! - `tx_file`: transaction files `<action>_<id>_<txType>_<round>_<nanos>`
//!   holding `<hex>[,<context>]`
//! - `csv_file`: address, pubkey, authorization pubkey and multisig exports
//!
//! Every write creates a new file and refuses to overwrite an existing one.

pub mod csv_file;
pub mod tx_file;

pub use csv_file::{
    csv_file_path, read_handoff_file, read_records, write_records, AddressLine, AuthPubkeyLine,
    CsvFileName, CsvKind, HandoffRecord, MultisigLine, PubkeyLine,
};
pub use tx_file::{find_tx_files, read_tx_file, write_tx_file, TxFile, TxFileName};

use chrono::Utc;

/// Nanosecond timestamp used to keep file names unique
pub(crate) fn timestamp_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
