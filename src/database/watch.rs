use crate::database::parse_column;
use crate::database::traits::WatchAddressOperations;
use crate::errors::AppResult;
use crate::types::{AccountType, WatchAddress};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn watch_address_from_row(row: &Row) -> rusqlite::Result<WatchAddress> {
    Ok(WatchAddress {
        id: row.get(0)?,
        coin: row.get(1)?,
        account: parse_column(2, row.get(2)?)?,
        wallet_address: row.get(3)?,
        is_allocated: row.get(4)?,
    })
}

impl WatchAddressOperations for Connection {
    fn insert_watch_address(
        &self,
        coin: &str,
        account: AccountType,
        address: &str,
    ) -> AppResult<bool> {
        let inserted = self
            .prepare_cached(
                r#"INSERT OR IGNORE INTO watch_addresses (coin, account, wallet_address)
                   VALUES (?1, ?2, ?3)"#,
            )?
            .execute(params![coin, account.name(), address])?;
        Ok(inserted == 1)
    }

    fn watch_addresses(&self, coin: &str, account: AccountType) -> AppResult<Vec<WatchAddress>> {
        let mut stmt = self.prepare_cached(
            r#"SELECT id, coin, account, wallet_address, is_allocated FROM watch_addresses
               WHERE coin = ?1 AND account = ?2 ORDER BY id"#,
        )?;
        let rows = stmt.query_map(params![coin, account.name()], watch_address_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn unallocated_watch_address(
        &self,
        coin: &str,
        account: AccountType,
    ) -> AppResult<Option<WatchAddress>> {
        Ok(self
            .prepare_cached(
                r#"SELECT id, coin, account, wallet_address, is_allocated FROM watch_addresses
                   WHERE coin = ?1 AND account = ?2 AND is_allocated = 0
                   ORDER BY id LIMIT 1"#,
            )?
            .query_row(params![coin, account.name()], watch_address_from_row)
            .optional()?)
    }

    fn mark_address_allocated(&self, coin: &str, address: &str) -> AppResult<bool> {
        let updated = self
            .prepare_cached(
                r#"UPDATE watch_addresses SET is_allocated = 1, updated_at = CURRENT_TIMESTAMP
                   WHERE coin = ?1 AND wallet_address = ?2"#,
            )?
            .execute(params![coin, address])?;
        Ok(updated == 1)
    }
}
