use crate::database::parse_column;
use crate::database::traits::AuthPubkeyOperations;
use crate::errors::{AppError, AppResult};
use crate::types::{AccountType, AuthPubkey};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn auth_pubkey_from_row(row: &Row) -> rusqlite::Result<AuthPubkey> {
    Ok(AuthPubkey {
        coin: row.get(0)?,
        auth_account: parse_column(1, row.get(1)?)?,
        full_public_key: row.get(2)?,
    })
}

impl AuthPubkeyOperations for Connection {
    fn insert_auth_pubkey(&self, pubkey: &AuthPubkey) -> AppResult<bool> {
        if !pubkey.auth_account.is_authorization() {
            return Err(AppError::Validation(format!(
                "{} is not an authorization account",
                pubkey.auth_account
            )));
        }
        if let Some(existing) = self.auth_pubkey(&pubkey.coin, pubkey.auth_account)? {
            if existing.full_public_key != pubkey.full_public_key {
                return Err(AppError::Validation(format!(
                    "{} already has a different public key",
                    pubkey.auth_account
                )));
            }
            return Ok(false);
        }
        self.prepare_cached(
            "INSERT INTO auth_pubkeys (coin, auth_account, full_public_key) VALUES (?1, ?2, ?3)",
        )?
        .execute(params![
            pubkey.coin,
            pubkey.auth_account.name(),
            pubkey.full_public_key
        ])?;
        Ok(true)
    }

    fn auth_pubkey(&self, coin: &str, auth_account: AccountType) -> AppResult<Option<AuthPubkey>> {
        Ok(self
            .prepare_cached(
                r#"SELECT coin, auth_account, full_public_key FROM auth_pubkeys
                   WHERE coin = ?1 AND auth_account = ?2"#,
            )?
            .query_row(params![coin, auth_account.name()], auth_pubkey_from_row)
            .optional()?)
    }

    fn auth_pubkeys(&self, coin: &str) -> AppResult<Vec<AuthPubkey>> {
        let mut stmt = self.prepare_cached(
            r#"SELECT coin, auth_account, full_public_key FROM auth_pubkeys
               WHERE coin = ?1 ORDER BY auth_account"#,
        )?;
        let rows = stmt.query_map(params![coin], auth_pubkey_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
