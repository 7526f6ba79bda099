use crate::errors::{AppError, AppResult};
use crate::handoff::timestamp_nanos;
use crate::types::{ActionType, PrevTxContext, TxType};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

lazy_static! {
    static ref TX_FILE_NAME: Regex =
        Regex::new(r"^([a-z]+)_(\d+)_([a-z]+)_(\d+)_(\d+)$").unwrap_or_else(|e| {
            panic!("invalid tx file name pattern: {}", e)
        });
}

/// Parsed `<action>_<envelopeId>_<txType>_<round>_<unixNanos>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFileName {
    pub action: ActionType,
    pub tx_id: i64,
    pub tx_type: TxType,
    /// Number of completed signing rounds, 0 for a fresh unsigned file
    pub round: u32,
    pub timestamp: i64,
}

impl TxFileName {
    pub fn new(action: ActionType, tx_id: i64, tx_type: TxType, round: u32) -> Self {
        Self {
            action,
            tx_id,
            tx_type,
            round,
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
        let caps = TX_FILE_NAME
            .captures(file_name)
            .ok_or_else(|| invalid("name does not match <action>_<id>_<type>_<round>_<nanos>"))?;

        let action: ActionType = caps[1].parse().map_err(|_| invalid("unknown action"))?;
        let tx_type: TxType = caps[3].parse().map_err(|_| invalid("unknown tx type"))?;
        if !matches!(tx_type, TxType::Unsigned | TxType::Signed) {
            return Err(invalid("only unsigned and signed files are exchanged"));
        }
        Ok(Self {
            action,
            tx_id: caps[2].parse().map_err(|_| invalid("bad envelope id"))?,
            tx_type,
            round: caps[4].parse().map_err(|_| invalid("bad round"))?,
            timestamp: caps[5].parse().map_err(|_| invalid("bad timestamp"))?,
        })
    }
}

impl fmt::Display for TxFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.action, self.tx_id, self.tx_type, self.round, self.timestamp
        )
    }
}

/// Contents of a transaction handoff file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFile {
    pub name: TxFileName,
    pub path: PathBuf,
    pub hex: String,
    pub context: Option<PrevTxContext>,
}

/// Write `<hex>[,<context>]` to a new file in `dir`
pub fn write_tx_file(
    dir: &Path,
    name: &TxFileName,
    hex: &str,
    context: Option<&PrevTxContext>,
) -> AppResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name.to_string());

    let body = match context {
        Some(context) => format!("{},{}", hex, context.encode()?),
        None => hex.to_string(),
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)?;
    file.write_all(body.as_bytes())?;

    info!("Wrote {} transaction file {}", name.tx_type, path.display());
    Ok(path)
}

/// Read a transaction file, checking its name carries `expected` type
pub fn read_tx_file(path: &Path, expected: TxType) -> AppResult<TxFile> {
    let name = TxFileName::parse(path)?;
    let invalid = |reason: String| AppError::InvalidHandoffFile {
        file: path.display().to_string(),
        reason,
    };
    if name.tx_type != expected {
        return Err(invalid(format!(
            "expected {} file, got {}",
            expected, name.tx_type
        )));
    }

    let body = fs::read_to_string(path)?;
    let body = body.trim();
    let (hex_part, context_part) = match body.split_once(',') {
        Some((hex_part, context_part)) => (hex_part, Some(context_part)),
        None => (body, None),
    };

    if hex_part.is_empty() || hex::decode(hex_part).is_err() {
        return Err(invalid("body does not start with transaction hex".to_string()));
    }
    let context = context_part.map(PrevTxContext::decode).transpose()?;
    if name.tx_type == TxType::Signed && context.is_some() {
        return Err(invalid("signed file must not carry a context".to_string()));
    }

    Ok(TxFile {
        name,
        path: path.to_path_buf(),
        hex: hex_part.to_string(),
        context,
    })
}

/// Transaction files of `tx_type` in `dir`, oldest first
pub fn find_tx_files(dir: &Path, tx_type: TxType) -> AppResult<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*_*_{}_*_*",
        glob::Pattern::escape(&dir.to_string_lossy()),
        tx_type
    );
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        match TxFileName::parse(&path) {
            Ok(name) => files.push((name.timestamp, path)),
            Err(e) => debug!("Ignoring {}: {}", path.display(), e),
        }
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}
