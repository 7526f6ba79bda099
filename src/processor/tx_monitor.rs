//! Confirmation tracking for broadcast transactions (Watch)

use crate::database::traits::{PaymentRequestOperations, TxOperations};
use crate::database::Database;
use crate::errors::AppResult;
use crate::processor::base::BatchStats;
use crate::rpc::ChainNode;
use crate::types::{ActionType, TxType};
use tracing::{debug, info, warn};

pub struct TxMonitor<'a> {
    coin: &'a str,
    confirmation_num: u64,
}

impl<'a> TxMonitor<'a> {
    pub fn new(coin: &'a str, confirmation_num: u64) -> Self {
        Self {
            coin,
            confirmation_num,
        }
    }

    /// `sent -> done` once a transaction reaches the configured depth
    ///
    /// A payment's requests are completed together with the envelope.
    pub fn update_confirmed(&self, db: &mut Database, node: &dyn ChainNode) -> AppResult<BatchStats> {
        let mut stats = BatchStats::new();
        let sent = db.connection().txs_by_type(self.coin, TxType::Sent)?;

        for envelope in sent {
            let Some(hash) = envelope.sent_hash.as_deref() else {
                warn!("Sent transaction {} has no hash", envelope.id);
                stats.record_failed();
                continue;
            };
            let confirmations = match node.get_transaction_confirmations(hash) {
                Ok(confirmations) => confirmations,
                Err(e) => {
                    warn!("Failed to check {}: {}", hash, e);
                    stats.record_failed();
                    continue;
                }
            };
            if confirmations < self.confirmation_num {
                debug!(
                    "{} has {}/{} confirmations",
                    hash, confirmations, self.confirmation_num
                );
                stats.record_skipped();
                continue;
            }

            let done = db.execute_transaction(|tx| {
                if !tx.update_tx_type(envelope.id, TxType::Sent, TxType::Done)? {
                    return Ok(false);
                }
                if envelope.action == ActionType::Payment {
                    let completed = tx.complete_payment_requests(envelope.id)?;
                    debug!("Completed {} payment requests", completed);
                }
                Ok(true)
            })?;
            if done {
                info!("Transaction {} confirmed: {}", envelope.id, hash);
                stats.record_processed();
            } else {
                stats.record_skipped();
            }
        }

        stats.log_summary("Confirmation check");
        Ok(stats)
    }

    /// `done -> notified`; the notification is the log line itself
    pub fn notify_done(&self, db: &Database) -> AppResult<BatchStats> {
        let mut stats = BatchStats::new();
        for envelope in db.connection().txs_by_type(self.coin, TxType::Done)? {
            info!(
                tx_id = envelope.id,
                action = %envelope.action,
                hash = envelope.sent_hash.as_deref().unwrap_or_default(),
                total_output = envelope.total_output,
                fee = envelope.fee,
                "Transaction done"
            );
            if db
                .connection()
                .update_tx_type(envelope.id, TxType::Done, TxType::Notified)?
            {
                stats.record_processed();
            } else {
                stats.record_skipped();
            }
        }
        stats.log_summary("Notification");
        Ok(stats)
    }

    pub fn run(&self, db: &mut Database, node: &dyn ChainNode) -> AppResult<(BatchStats, BatchStats)> {
        let confirmed = self.update_confirmed(db, node)?;
        let notified = self.notify_done(db)?;
        Ok((confirmed, notified))
    }
}
