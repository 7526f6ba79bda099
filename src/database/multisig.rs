use crate::database::traits::MultisigHandoffOperations;
use crate::database::{conversion_error, parse_column, placeholders};
use crate::errors::AppResult;
use crate::types::{AccountType, MultisigHandoff};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row};

const HANDOFF_COLUMNS: &str = "id, coin, account, full_public_key, auth_accounts, \
     multisig_address, redeem_script, idx, is_exported";

fn handoff_from_row(row: &Row) -> rusqlite::Result<MultisigHandoff> {
    let auth_json: String = row.get(4)?;
    let auth_accounts: Vec<AccountType> = serde_json::from_str(&auth_json)
        .map_err(|e| conversion_error(4, Type::Text, e.into()))?;
    Ok(MultisigHandoff {
        id: row.get(0)?,
        coin: row.get(1)?,
        account: parse_column(2, row.get(2)?)?,
        full_public_key: row.get(3)?,
        auth_accounts,
        multisig_address: row.get(5)?,
        redeem_script: row.get(6)?,
        index: row.get(7)?,
        is_exported: row.get(8)?,
    })
}

impl MultisigHandoffOperations for Connection {
    fn insert_multisig_handoff(&self, handoff: &MultisigHandoff) -> AppResult<bool> {
        let auth_json = serde_json::to_string(&handoff.auth_accounts)?;
        let inserted = self
            .prepare_cached(
                r#"INSERT OR IGNORE INTO multisig_handoffs
                   (coin, account, full_public_key, auth_accounts, multisig_address,
                    redeem_script, idx, is_exported)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            )?
            .execute(params![
                handoff.coin,
                handoff.account.name(),
                handoff.full_public_key,
                auth_json,
                handoff.multisig_address,
                handoff.redeem_script,
                handoff.index,
                handoff.is_exported
            ])?;
        Ok(inserted == 1)
    }

    fn unresolved_multisig_handoffs(&self, coin: &str) -> AppResult<Vec<MultisigHandoff>> {
        let mut stmt = self.prepare_cached(&format!(
            r#"SELECT {} FROM multisig_handoffs
               WHERE coin = ?1 AND multisig_address IS NULL
               ORDER BY account, idx"#,
            HANDOFF_COLUMNS
        ))?;
        let rows = stmt.query_map(params![coin], handoff_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn unexported_multisig_handoffs(&self, coin: &str) -> AppResult<Vec<MultisigHandoff>> {
        let mut stmt = self.prepare_cached(&format!(
            r#"SELECT {} FROM multisig_handoffs
               WHERE coin = ?1 AND multisig_address IS NOT NULL AND is_exported = 0
               ORDER BY account, idx"#,
            HANDOFF_COLUMNS
        ))?;
        let rows = stmt.query_map(params![coin], handoff_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn resolve_multisig_handoff(
        &self,
        id: i64,
        multisig_address: &str,
        redeem_script: &str,
    ) -> AppResult<()> {
        self.prepare_cached(
            r#"UPDATE multisig_handoffs
               SET multisig_address = ?1, redeem_script = ?2, updated_at = CURRENT_TIMESTAMP
               WHERE id = ?3"#,
        )?
        .execute(params![multisig_address, redeem_script, id])?;
        Ok(())
    }

    fn mark_handoffs_exported(&self, ids: &[i64]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE multisig_handoffs SET is_exported = 1, updated_at = CURRENT_TIMESTAMP WHERE id IN ({})",
            placeholders(1, ids.len())
        );
        Ok(self.execute(&sql, params_from_iter(ids.iter()))?)
    }
}
