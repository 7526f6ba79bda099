//! Broadcast of signed transaction files (Watch)

use crate::database::traits::{TxOperations, WatchAddressOperations};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::handoff::{find_tx_files, read_tx_file, TxFileName};
use crate::processor::base::BatchStats;
use crate::processor::tx_creator::decode_transaction;
use crate::rpc::ChainNode;
use crate::types::{ActionType, TxType};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTx {
    pub tx_id: i64,
    pub sent_hash: String,
}

pub struct TxSender<'a> {
    coin: &'a str,
}

impl<'a> TxSender<'a> {
    pub fn new(coin: &'a str) -> Self {
        Self { coin }
    }

    /// Broadcast a signed file and move its envelope to `sent`
    ///
    /// The envelope is claimed (`unsigned -> signed`) in the same database
    /// transaction as the broadcast, so a rejected broadcast leaves it
    /// untouched and a second send of the same file is refused.
    pub fn send_file(
        &self,
        db: &mut Database,
        node: &dyn ChainNode,
        path: &Path,
    ) -> AppResult<SentTx> {
        let file = read_tx_file(path, TxType::Signed)?;
        let tx_id = file.name.tx_id;
        let invalid = |reason: String| AppError::InvalidHandoffFile {
            file: path.display().to_string(),
            reason,
        };

        let envelope = db
            .connection()
            .tx_by_id(tx_id)?
            .ok_or_else(|| invalid(format!("no transaction with id {}", tx_id)))?;
        if envelope.coin != self.coin {
            return Err(invalid(format!("transaction {} is for {}", tx_id, envelope.coin)));
        }
        if envelope.action != file.name.action {
            return Err(invalid(format!(
                "file action {} but transaction {} is a {}",
                file.name.action, tx_id, envelope.action
            )));
        }
        if envelope.tx_type != TxType::Unsigned {
            return Err(AppError::Validation(format!(
                "transaction {} is already {}",
                tx_id, envelope.tx_type
            )));
        }

        let signed = decode_transaction(&file.hex)?;
        let unsigned = decode_transaction(&envelope.unsigned_hex)?;
        let stored_inputs: BTreeSet<(String, u32)> = db
            .connection()
            .tx_inputs(tx_id)?
            .into_iter()
            .map(|i| (i.input_txid, i.input_vout))
            .collect();
        let signed_inputs: BTreeSet<(String, u32)> = signed
            .input
            .iter()
            .map(|i| (i.previous_output.txid.to_string(), i.previous_output.vout))
            .collect();
        if signed_inputs != stored_inputs || signed.output != unsigned.output {
            return Err(invalid(format!(
                "signed transaction does not match stored transaction {}",
                tx_id
            )));
        }

        let outputs = db.connection().tx_outputs(tx_id)?;
        let coin = self.coin;
        let sent_hash = db.execute_transaction(|tx| {
            if !tx.update_tx_type(tx_id, TxType::Unsigned, TxType::Signed)? {
                return Err(AppError::Validation(format!(
                    "transaction {} changed while sending",
                    tx_id
                )));
            }
            let sent_hash = node.send_raw_transaction(&file.hex)?;
            tx.update_tx_sent(tx_id, &file.hex, &sent_hash)?;

            // Payment outputs go to external receivers
            if envelope.action != ActionType::Payment {
                for output in outputs.iter().filter(|o| !o.is_change) {
                    if tx.mark_address_allocated(coin, &output.output_address)? {
                        debug!("Allocated {}", output.output_address);
                    }
                }
            }
            Ok(sent_hash)
        })?;

        info!("Sent {} transaction {}: {}", envelope.action, tx_id, sent_hash);
        Ok(SentTx { tx_id, sent_hash })
    }

    /// Send every signed file in `dir` whose transaction is still unsent
    ///
    /// A failed broadcast is logged and the next file is tried.
    pub fn send_pending(
        &self,
        db: &mut Database,
        node: &dyn ChainNode,
        dir: &Path,
    ) -> AppResult<BatchStats> {
        let mut stats = BatchStats::new();
        for path in find_tx_files(dir, TxType::Signed)? {
            let name = TxFileName::parse(&path)?;
            let pending = db
                .connection()
                .tx_by_id(name.tx_id)?
                .is_some_and(|tx| tx.coin == self.coin && tx.tx_type == TxType::Unsigned);
            if !pending {
                stats.record_skipped();
                continue;
            }
            match self.send_file(db, node, &path) {
                Ok(_) => stats.record_processed(),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Failed to send {}: {}", path.display(), e);
                    stats.record_failed();
                }
            }
        }
        stats.log_summary("Broadcast");
        Ok(stats)
    }
}
