//! Unsigned transaction construction (Watch)
//!
//! Inputs come from `listunspent` filtered by the sender account's label.
//! A provisional transaction is built to measure its size, the fee is
//! taken from the sweep output or the change output, and the final
//! transaction is stored and written as an unsigned handoff file in one
//! database transaction.

use crate::database::traits::{PaymentRequestOperations, TxOperations, WatchAddressOperations};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::handoff::{write_tx_file, TxFileName};
use crate::processor::fee::FeeCalculator;
use crate::rpc::{ChainNode, UnspentOutput};
use crate::types::{
    AccountType, ActionType, PrevTx, PrevTxContext, TxEnvelope, TxInputRecord, TxOutputRecord,
    TxType,
};
use bitcoin::Transaction;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTx {
    pub tx_id: i64,
    pub path: PathBuf,
    pub total_input: u64,
    pub total_output: u64,
    pub fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(CreatedTx),
    /// Identical unsigned transaction already stored; no file written
    Duplicate { tx_id: i64 },
    /// No spendable outputs or no open payment requests
    NothingToDo,
}

#[derive(Debug, Clone)]
struct Recipient {
    address: String,
    account: AccountType,
    amount: u64,
    is_change: bool,
}

pub struct TxCreator<'a> {
    coin: &'a str,
    fee: &'a FeeCalculator,
    tx_dir: &'a Path,
    min_confirmations: u64,
}

impl<'a> TxCreator<'a> {
    pub fn new(coin: &'a str, fee: &'a FeeCalculator, tx_dir: &'a Path) -> Self {
        Self {
            coin,
            fee,
            tx_dir,
            min_confirmations: 1,
        }
    }

    pub fn with_min_confirmations(mut self, min_confirmations: u64) -> Self {
        self.min_confirmations = min_confirmations;
        self
    }

    /// Sweep every client output into the next unused `receiver` address
    pub fn create_deposit(
        &self,
        db: &mut Database,
        node: &dyn ChainNode,
        receiver: AccountType,
        adjustment: f64,
    ) -> AppResult<CreateOutcome> {
        let address = self.receiver_address(db, receiver)?;
        self.build(
            db,
            node,
            ActionType::Deposit,
            AccountType::Client,
            vec![Recipient {
                address,
                account: receiver,
                amount: 0,
                is_change: false,
            }],
            true,
            adjustment,
            &[],
        )
    }

    /// Pay every open payment request from `sender`, change back to `sender`
    pub fn create_payment(
        &self,
        db: &mut Database,
        node: &dyn ChainNode,
        sender: AccountType,
        adjustment: f64,
    ) -> AppResult<CreateOutcome> {
        let requests = db.connection().open_payment_requests(self.coin)?;
        if requests.is_empty() {
            info!("No open payment requests");
            return Ok(CreateOutcome::NothingToDo);
        }
        let recipients = requests
            .iter()
            .map(|r| Recipient {
                address: r.receiver_address.clone(),
                account: AccountType::Anonymous,
                amount: r.amount,
                is_change: false,
            })
            .collect();
        let ids: Vec<i64> = requests.iter().map(|r| r.id).collect();
        self.build(
            db,
            node,
            ActionType::Payment,
            sender,
            recipients,
            false,
            adjustment,
            &ids,
        )
    }

    /// Move `amount` (0 = everything) between internal accounts
    pub fn create_transfer(
        &self,
        db: &mut Database,
        node: &dyn ChainNode,
        sender: AccountType,
        receiver: AccountType,
        amount: u64,
        adjustment: f64,
    ) -> AppResult<CreateOutcome> {
        AccountType::validate_transfer(sender, receiver)?;
        let address = self.receiver_address(db, receiver)?;
        self.build(
            db,
            node,
            ActionType::Transfer,
            sender,
            vec![Recipient {
                address,
                account: receiver,
                amount,
                is_change: false,
            }],
            amount == 0,
            adjustment,
            &[],
        )
    }

    fn receiver_address(&self, db: &Database, receiver: AccountType) -> AppResult<String> {
        db.connection()
            .unallocated_watch_address(self.coin, receiver)?
            .map(|a| a.wallet_address)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "no unallocated {} address; import more addresses first",
                    receiver
                ))
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        db: &mut Database,
        node: &dyn ChainNode,
        action: ActionType,
        sender: AccountType,
        mut recipients: Vec<Recipient>,
        sweep: bool,
        adjustment: f64,
        request_ids: &[i64],
    ) -> AppResult<CreateOutcome> {
        let label = sender.name();
        let unspent: Vec<UnspentOutput> = node
            .list_unspent(self.min_confirmations)?
            .into_iter()
            .filter(|u| u.label == label)
            .collect();
        if unspent.is_empty() {
            info!("No spendable {} outputs for {}", sender, action);
            return Ok(CreateOutcome::NothingToDo);
        }

        let target: u64 = recipients.iter().map(|r| r.amount).sum();
        let selected = select_inputs(unspent, if sweep { None } else { Some(target) })?;
        let total_input: u64 = selected.iter().map(|u| u.amount).sum();

        let fee_index = if sweep {
            recipients[0].amount = total_input;
            0
        } else {
            merge_recipients(&mut recipients);
            recipients.push(Recipient {
                address: selected[0].address.clone(),
                account: sender,
                amount: total_input - target,
                is_change: true,
            });
            recipients.len() - 1
        };

        let inputs: Vec<(String, u32)> = selected.iter().map(|u| (u.txid.clone(), u.vout)).collect();
        let provisional = node.create_raw_transaction(&inputs, &output_pairs(&recipients))?;
        let vsize = transaction_vsize(&provisional)?;
        let fee = self.fee.calculate(node, vsize, adjustment)?;

        let reduced = &mut recipients[fee_index];
        if reduced.amount <= fee {
            return Err(AppError::Amount(format!(
                "fee {} sat leaves nothing for output {} ({} sat)",
                fee, reduced.address, reduced.amount
            )));
        }
        reduced.amount -= fee;

        let unsigned_hex = node.create_raw_transaction(&inputs, &output_pairs(&recipients))?;
        if let Some(tx_id) = db.connection().tx_id_by_unsigned_hex(&unsigned_hex)? {
            info!("{} transaction already stored as {}", action, tx_id);
            return Ok(CreateOutcome::Duplicate { tx_id });
        }

        let total_output = total_input - fee;
        let envelope = TxEnvelope {
            id: 0,
            coin: self.coin.to_string(),
            action,
            unsigned_hex: unsigned_hex.clone(),
            signed_hex: None,
            sent_hash: None,
            total_input,
            total_output,
            fee,
            tx_type: TxType::Unsigned,
        };
        let input_records: Vec<TxInputRecord> = selected
            .iter()
            .map(|u| TxInputRecord {
                input_txid: u.txid.clone(),
                input_vout: u.vout,
                input_address: u.address.clone(),
                input_account: sender,
                input_amount: u.amount,
                input_confirmations: u.confirmations,
            })
            .collect();
        let output_records: Vec<TxOutputRecord> = recipients
            .iter()
            .map(|r| TxOutputRecord {
                output_address: r.address.clone(),
                output_account: r.account,
                output_amount: r.amount,
                is_change: r.is_change,
            })
            .collect();
        let context = PrevTxContext {
            sender_account: sender,
            prev_txs: selected
                .iter()
                .map(|u| PrevTx {
                    txid: u.txid.clone(),
                    vout: u.vout,
                    script_pub_key: u.script_pub_key.clone(),
                    redeem_script: u.redeem_script.clone().unwrap_or_default(),
                    amount: u.amount,
                })
                .collect(),
            addrs: selected.iter().map(|u| u.address.clone()).collect(),
        };

        let (tx_id, path) = db.execute_transaction(|tx| {
            let tx_id = tx.insert_tx(&envelope, &input_records, &output_records)?;
            tx.link_payment_requests(request_ids, tx_id)?;
            let name = TxFileName::new(action, tx_id, TxType::Unsigned, 0);
            let path = write_tx_file(self.tx_dir, &name, &unsigned_hex, Some(&context))?;
            Ok((tx_id, path))
        })?;

        info!(
            "Created {} transaction {}: {} inputs, input {} sat, output {} sat, fee {} sat",
            action,
            tx_id,
            selected.len(),
            total_input,
            total_output,
            fee
        );
        Ok(CreateOutcome::Created(CreatedTx {
            tx_id,
            path,
            total_input,
            total_output,
            fee,
        }))
    }
}

/// Take outputs in node order until their sum exceeds `target`, or all of
/// them when sweeping
fn select_inputs(unspent: Vec<UnspentOutput>, target: Option<u64>) -> AppResult<Vec<UnspentOutput>> {
    let Some(target) = target else {
        return Ok(unspent);
    };
    let mut selected = Vec::new();
    let mut total = 0u64;
    for output in unspent {
        total += output.amount;
        selected.push(output);
        if total > target {
            debug!("Selected {} inputs totalling {} sat", selected.len(), total);
            return Ok(selected);
        }
    }
    Err(AppError::Amount(format!(
        "insufficient funds: {} sat available, {} sat required",
        total, target
    )))
}

/// Sum amounts paid to the same address; the node rejects duplicate outputs
fn merge_recipients(recipients: &mut Vec<Recipient>) {
    let mut merged: Vec<Recipient> = Vec::with_capacity(recipients.len());
    for recipient in recipients.drain(..) {
        match merged.iter_mut().find(|r| r.address == recipient.address) {
            Some(existing) => existing.amount += recipient.amount,
            None => merged.push(recipient),
        }
    }
    *recipients = merged;
}

fn output_pairs(recipients: &[Recipient]) -> Vec<(String, u64)> {
    recipients
        .iter()
        .map(|r| (r.address.clone(), r.amount))
        .collect()
}

pub(crate) fn decode_transaction(hex_tx: &str) -> AppResult<Transaction> {
    let bytes = hex::decode(hex_tx)
        .map_err(|e| AppError::InvalidData(format!("transaction is not hex: {}", e)))?;
    bitcoin::consensus::deserialize(&bytes)
        .map_err(|e| AppError::InvalidData(format!("undecodable transaction: {}", e)))
}

fn transaction_vsize(hex_tx: &str) -> AppResult<usize> {
    Ok(decode_transaction(hex_tx)?.vsize())
}
