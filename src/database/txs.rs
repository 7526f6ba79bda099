//! Transaction envelope operations.
//!
//! `insert_tx` writes the envelope and all of its inputs and outputs; call
//! it inside `Database::execute_transaction` so a failure leaves nothing
//! behind.

use crate::database::traits::TxOperations;
use crate::database::{conversion_error, parse_column};
use crate::errors::AppResult;
use crate::types::{ActionType, TxEnvelope, TxInputRecord, TxOutputRecord, TxType};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

const TX_COLUMNS: &str = "id, coin, action, unsigned_hex, signed_hex, sent_hash, \
     total_input, total_output, fee, tx_type";

fn envelope_from_row(row: &Row) -> rusqlite::Result<TxEnvelope> {
    let action: i64 = row.get(2)?;
    let tx_type: i64 = row.get(9)?;
    let total_input: i64 = row.get(6)?;
    let total_output: i64 = row.get(7)?;
    let fee: i64 = row.get(8)?;
    Ok(TxEnvelope {
        id: row.get(0)?,
        coin: row.get(1)?,
        action: ActionType::from_i64(action).map_err(|e| conversion_error(2, Type::Integer, e))?,
        unsigned_hex: row.get(3)?,
        signed_hex: row.get(4)?,
        sent_hash: row.get(5)?,
        total_input: total_input as u64,
        total_output: total_output as u64,
        fee: fee as u64,
        tx_type: TxType::from_i64(tx_type).map_err(|e| conversion_error(9, Type::Integer, e))?,
    })
}

impl TxOperations for Connection {
    fn tx_id_by_unsigned_hex(&self, unsigned_hex: &str) -> AppResult<Option<i64>> {
        Ok(self
            .prepare_cached("SELECT id FROM txs WHERE unsigned_hex = ?1")?
            .query_row(params![unsigned_hex], |row| row.get(0))
            .optional()?)
    }

    fn insert_tx(
        &self,
        envelope: &TxEnvelope,
        inputs: &[TxInputRecord],
        outputs: &[TxOutputRecord],
    ) -> AppResult<i64> {
        self.prepare_cached(
            r#"INSERT INTO txs
               (coin, action, unsigned_hex, signed_hex, sent_hash,
                total_input, total_output, fee, tx_type)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
        )?
        .execute(params![
            envelope.coin,
            envelope.action.as_i64(),
            envelope.unsigned_hex,
            envelope.signed_hex,
            envelope.sent_hash,
            envelope.total_input as i64,
            envelope.total_output as i64,
            envelope.fee as i64,
            envelope.tx_type.as_i64()
        ])?;
        let tx_id = self.last_insert_rowid();

        let mut input_stmt = self.prepare_cached(
            r#"INSERT INTO tx_inputs
               (tx_id, input_txid, input_vout, input_address, input_account,
                input_amount, input_confirmations)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )?;
        for input in inputs {
            input_stmt.execute(params![
                tx_id,
                input.input_txid,
                input.input_vout,
                input.input_address,
                input.input_account.name(),
                input.input_amount as i64,
                input.input_confirmations as i64
            ])?;
        }

        let mut output_stmt = self.prepare_cached(
            r#"INSERT INTO tx_outputs
               (tx_id, output_address, output_account, output_amount, is_change)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )?;
        for output in outputs {
            output_stmt.execute(params![
                tx_id,
                output.output_address,
                output.output_account.name(),
                output.output_amount as i64,
                output.is_change
            ])?;
        }

        debug!(
            "Inserted tx {} with {} inputs and {} outputs",
            tx_id,
            inputs.len(),
            outputs.len()
        );
        Ok(tx_id)
    }

    fn tx_by_id(&self, id: i64) -> AppResult<Option<TxEnvelope>> {
        Ok(self
            .prepare_cached(&format!("SELECT {} FROM txs WHERE id = ?1", TX_COLUMNS))?
            .query_row(params![id], envelope_from_row)
            .optional()?)
    }

    fn tx_inputs(&self, tx_id: i64) -> AppResult<Vec<TxInputRecord>> {
        let mut stmt = self.prepare_cached(
            r#"SELECT input_txid, input_vout, input_address, input_account,
                      input_amount, input_confirmations
               FROM tx_inputs WHERE tx_id = ?1 ORDER BY id"#,
        )?;
        let rows = stmt.query_map(params![tx_id], |row| {
            let amount: i64 = row.get(4)?;
            let confirmations: i64 = row.get(5)?;
            Ok(TxInputRecord {
                input_txid: row.get(0)?,
                input_vout: row.get(1)?,
                input_address: row.get(2)?,
                input_account: parse_column(3, row.get(3)?)?,
                input_amount: amount as u64,
                input_confirmations: confirmations as u64,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn tx_outputs(&self, tx_id: i64) -> AppResult<Vec<TxOutputRecord>> {
        let mut stmt = self.prepare_cached(
            r#"SELECT output_address, output_account, output_amount, is_change
               FROM tx_outputs WHERE tx_id = ?1 ORDER BY id"#,
        )?;
        let rows = stmt.query_map(params![tx_id], |row| {
            let amount: i64 = row.get(2)?;
            Ok(TxOutputRecord {
                output_address: row.get(0)?,
                output_account: parse_column(1, row.get(1)?)?,
                output_amount: amount as u64,
                is_change: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn txs_by_type(&self, coin: &str, tx_type: TxType) -> AppResult<Vec<TxEnvelope>> {
        let mut stmt = self.prepare_cached(&format!(
            "SELECT {} FROM txs WHERE coin = ?1 AND tx_type = ?2 ORDER BY id",
            TX_COLUMNS
        ))?;
        let rows = stmt.query_map(params![coin, tx_type.as_i64()], envelope_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update_tx_sent(&self, id: i64, signed_hex: &str, sent_hash: &str) -> AppResult<()> {
        self.prepare_cached(
            r#"UPDATE txs
               SET signed_hex = ?1, sent_hash = ?2, tx_type = ?3, updated_at = CURRENT_TIMESTAMP
               WHERE id = ?4"#,
        )?
        .execute(params![signed_hex, sent_hash, TxType::Sent.as_i64(), id])?;
        Ok(())
    }

    fn update_tx_type(&self, id: i64, from: TxType, to: TxType) -> AppResult<bool> {
        let updated = self
            .prepare_cached(
                r#"UPDATE txs SET tx_type = ?1, updated_at = CURRENT_TIMESTAMP
                   WHERE id = ?2 AND tx_type = ?3"#,
            )?
            .execute(params![to.as_i64(), id, from.as_i64()])?;
        Ok(updated == 1)
    }
}
