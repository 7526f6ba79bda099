//! Key record operations.
//!
//! Rows are only ever inserted and then moved forward through their
//! status; `update_key_status` is crate-private so the lifecycle engine
//! stays the single writer of `addr_status`.

use crate::database::traits::KeyRecordOperations;
use crate::database::{conversion_error, parse_column, placeholders};
use crate::errors::AppResult;
use crate::types::{AccountType, AddrStatus, DerivedKey, KeyRecord};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

const KEY_COLUMNS: &str = "id, coin, account, idx, p2pkh_address, p2sh_segwit_address, \
     bech32_address, full_public_key, wif, multisig_address, redeem_script, addr_status";

fn key_record_from_row(row: &Row) -> rusqlite::Result<KeyRecord> {
    let status: i64 = row.get(11)?;
    Ok(KeyRecord {
        id: row.get(0)?,
        coin: row.get(1)?,
        account: parse_column(2, row.get(2)?)?,
        index: row.get(3)?,
        p2pkh_address: row.get(4)?,
        p2sh_segwit_address: row.get(5)?,
        bech32_address: row.get(6)?,
        full_public_key: row.get(7)?,
        wif: row.get(8)?,
        multisig_address: row.get(9)?,
        redeem_script: row.get(10)?,
        status: AddrStatus::from_i64(status).map_err(|e| conversion_error(11, Type::Integer, e))?,
    })
}

/// Compare-and-set on `addr_status`; returns false if the row had moved on
pub(crate) fn update_key_status(
    conn: &Connection,
    id: i64,
    from: AddrStatus,
    to: AddrStatus,
) -> AppResult<bool> {
    let updated = conn
        .prepare_cached(
            r#"UPDATE account_keys
               SET addr_status = ?1, updated_at = CURRENT_TIMESTAMP
               WHERE id = ?2 AND addr_status = ?3"#,
        )?
        .execute(params![to.as_i64(), id, from.as_i64()])?;
    Ok(updated == 1)
}

impl KeyRecordOperations for Connection {
    fn insert_derived_keys(&self, coin: &str, keys: &[DerivedKey]) -> AppResult<usize> {
        let mut stmt = self.prepare_cached(
            r#"INSERT INTO account_keys
               (coin, account, idx, p2pkh_address, p2sh_segwit_address, bech32_address,
                full_public_key, wif, addr_status)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
        )?;

        for key in keys {
            stmt.execute(params![
                coin,
                key.account.name(),
                key.index,
                key.p2pkh_address,
                key.p2sh_segwit_address,
                key.bech32_address,
                key.full_public_key,
                key.wif,
                AddrStatus::Generated.as_i64()
            ])?;
        }

        debug!("Inserted {} key records", keys.len());
        Ok(keys.len())
    }

    fn max_key_index(&self, coin: &str, account: AccountType) -> AppResult<Option<u32>> {
        let max: Option<u32> = self
            .prepare_cached("SELECT MAX(idx) FROM account_keys WHERE coin = ?1 AND account = ?2")?
            .query_row(params![coin, account.name()], |row| row.get(0))?;
        Ok(max)
    }

    fn key_records(&self, coin: &str, account: AccountType) -> AppResult<Vec<KeyRecord>> {
        let mut stmt = self.prepare_cached(&format!(
            "SELECT {} FROM account_keys WHERE coin = ?1 AND account = ?2 ORDER BY idx",
            KEY_COLUMNS
        ))?;
        let rows = stmt.query_map(params![coin, account.name()], key_record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn key_records_by_status(
        &self,
        coin: &str,
        account: AccountType,
        status: AddrStatus,
    ) -> AppResult<Vec<KeyRecord>> {
        let mut stmt = self.prepare_cached(&format!(
            r#"SELECT {} FROM account_keys
               WHERE coin = ?1 AND account = ?2 AND addr_status = ?3
               ORDER BY idx"#,
            KEY_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![coin, account.name(), status.as_i64()],
            key_record_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn key_records_by_multisig_address(
        &self,
        coin: &str,
        addresses: &[String],
    ) -> AppResult<Vec<KeyRecord>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM account_keys WHERE coin = ?1 AND multisig_address IN ({}) ORDER BY id",
            KEY_COLUMNS,
            placeholders(2, addresses.len())
        );
        let mut stmt = self.prepare(&sql)?;
        let values = std::iter::once(coin.to_string()).chain(addresses.iter().cloned());
        let rows = stmt.query_map(params_from_iter(values), key_record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn key_records_by_address(
        &self,
        coin: &str,
        addresses: &[String],
    ) -> AppResult<Vec<KeyRecord>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let list = placeholders(2, addresses.len());
        let sql = format!(
            r#"SELECT {cols} FROM account_keys
               WHERE coin = ?1
                 AND (p2pkh_address IN ({list})
                      OR p2sh_segwit_address IN ({list})
                      OR bech32_address IN ({list}))
               ORDER BY id"#,
            cols = KEY_COLUMNS,
            list = list
        );
        let mut stmt = self.prepare(&sql)?;
        let values = std::iter::once(coin.to_string()).chain(addresses.iter().cloned());
        let rows = stmt.query_map(params_from_iter(values), key_record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn key_record_by_pubkey(
        &self,
        coin: &str,
        account: AccountType,
        full_public_key: &str,
    ) -> AppResult<Option<KeyRecord>> {
        let mut stmt = self.prepare_cached(&format!(
            r#"SELECT {} FROM account_keys
               WHERE coin = ?1 AND account = ?2 AND full_public_key = ?3"#,
            KEY_COLUMNS
        ))?;
        Ok(stmt
            .query_row(
                params![coin, account.name(), full_public_key],
                key_record_from_row,
            )
            .optional()?)
    }

    fn set_multisig_address(
        &self,
        id: i64,
        multisig_address: &str,
        redeem_script: &str,
    ) -> AppResult<()> {
        self.prepare_cached(
            r#"UPDATE account_keys
               SET multisig_address = ?1, redeem_script = ?2, updated_at = CURRENT_TIMESTAMP
               WHERE id = ?3"#,
        )?
        .execute(params![multisig_address, redeem_script, id])?;
        Ok(())
    }
}
