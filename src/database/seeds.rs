use crate::database::traits::SeedOperations;
use crate::errors::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};

impl SeedOperations for Connection {
    fn get_seed(&self, coin: &str) -> AppResult<Option<Vec<u8>>> {
        let stored: Option<String> = self
            .prepare_cached("SELECT seed FROM seeds WHERE coin = ?1")?
            .query_row(params![coin], |row| row.get(0))
            .optional()?;

        stored
            .map(|hex_seed| {
                hex::decode(&hex_seed)
                    .map_err(|e| AppError::CorruptKey(format!("stored seed is not hex: {}", e)))
            })
            .transpose()
    }

    fn insert_seed(&self, coin: &str, seed: &[u8]) -> AppResult<()> {
        let inserted = self
            .prepare_cached("INSERT OR IGNORE INTO seeds (coin, seed) VALUES (?1, ?2)")?
            .execute(params![coin, hex::encode(seed)])?;
        if inserted == 0 {
            return Err(AppError::Validation(format!(
                "seed for {} already stored",
                coin
            )));
        }
        Ok(())
    }
}
