use crate::database::traits::PaymentRequestOperations;
use crate::database::{parse_column, placeholders};
use crate::errors::AppResult;
use crate::types::{AccountType, PaymentRequest};
use rusqlite::{params, params_from_iter, Connection, Row};

const REQUEST_COLUMNS: &str =
    "id, coin, payment_id, sender_address, sender_account, receiver_address, amount, is_done";

fn request_from_row(row: &Row) -> rusqlite::Result<PaymentRequest> {
    let amount: i64 = row.get(6)?;
    Ok(PaymentRequest {
        id: row.get(0)?,
        coin: row.get(1)?,
        payment_id: row.get(2)?,
        sender_address: row.get(3)?,
        sender_account: parse_column(4, row.get(4)?)?,
        receiver_address: row.get(5)?,
        amount: amount as u64,
        is_done: row.get(7)?,
    })
}

impl PaymentRequestOperations for Connection {
    fn insert_payment_request(
        &self,
        coin: &str,
        sender_address: &str,
        sender_account: AccountType,
        receiver_address: &str,
        amount: u64,
    ) -> AppResult<i64> {
        self.prepare_cached(
            r#"INSERT INTO payment_requests
               (coin, sender_address, sender_account, receiver_address, amount)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )?
        .execute(params![
            coin,
            sender_address,
            sender_account.name(),
            receiver_address,
            amount as i64
        ])?;
        Ok(self.last_insert_rowid())
    }

    fn open_payment_requests(&self, coin: &str) -> AppResult<Vec<PaymentRequest>> {
        let mut stmt = self.prepare_cached(&format!(
            r#"SELECT {} FROM payment_requests
               WHERE coin = ?1 AND payment_id IS NULL AND is_done = 0
               ORDER BY id"#,
            REQUEST_COLUMNS
        ))?;
        let rows = stmt.query_map(params![coin], request_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn link_payment_requests(&self, ids: &[i64], payment_id: i64) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            r#"UPDATE payment_requests SET payment_id = ?1, updated_at = CURRENT_TIMESTAMP
               WHERE payment_id IS NULL AND id IN ({})"#,
            placeholders(2, ids.len())
        );
        let values = std::iter::once(payment_id).chain(ids.iter().copied());
        Ok(self.execute(&sql, params_from_iter(values))?)
    }

    fn payment_requests_for_tx(&self, payment_id: i64) -> AppResult<Vec<PaymentRequest>> {
        let mut stmt = self.prepare_cached(&format!(
            "SELECT {} FROM payment_requests WHERE payment_id = ?1 ORDER BY id",
            REQUEST_COLUMNS
        ))?;
        let rows = stmt.query_map(params![payment_id], request_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn complete_payment_requests(&self, payment_id: i64) -> AppResult<usize> {
        Ok(self
            .prepare_cached(
                r#"UPDATE payment_requests SET is_done = 1, updated_at = CURRENT_TIMESTAMP
                   WHERE payment_id = ?1"#,
            )?
            .execute(params![payment_id])?)
    }
}
