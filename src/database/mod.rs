//! SQLite storage for the wallet roles.
//!
//! ## Architecture
//!
//! Repository traits in [`traits`] are implemented for `rusqlite::Connection`,
//! one file per area:
//! - `seeds` - master seed
//! - `keys` - derived key records
//! - `auth` - authorization public keys
//! - `multisig` - multisig handoff records
//! - `watch` - watch-only addresses
//! - `txs` - transaction envelopes, inputs and outputs
//! - `payments` - payment requests

mod auth;
mod keys;
mod multisig;
mod payments;
pub mod schema;
mod seeds;
pub mod traits;
mod txs;
mod watch;

pub use schema::setup_schema;
pub use traits::*;

pub(crate) use keys::update_key_status;

use crate::errors::{AppError, AppResult};
use rusqlite::types::Type;
use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Owns the SQLite connection of one wallet role.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Open (or create) the database and make sure the schema exists
    pub fn new(database_path: &str) -> AppResult<Self> {
        if database_path != ":memory:" {
            if let Some(parent) = Path::new(database_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        let connection = Connection::open(database_path)?;

        setup_schema(&connection)?;

        info!("Database initialised at: {}", database_path);
        Ok(Self { connection })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Execute a function within a database transaction
    pub fn execute_transaction<F, R>(&mut self, f: F) -> AppResult<R>
    where
        F: FnOnce(&rusqlite::Transaction) -> AppResult<R>,
    {
        let tx = self.connection.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

/// Parse a text column through `FromStr`, surfacing failures as a
/// column conversion error
pub(crate) fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = AppError>,
{
    value
        .parse()
        .map_err(|e: AppError| conversion_error(idx, Type::Text, e))
}

pub(crate) fn conversion_error(idx: usize, ty: Type, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::from(err.to_string()))
}

/// Comma separated `?N` placeholders for an `IN (...)` clause
pub(crate) fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}
