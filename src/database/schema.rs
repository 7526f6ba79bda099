//! Wallet schema shared by all three roles
//!
//! Each role opens its own database file and only touches the tables it
//! needs: the cold wallets use `seeds`, `account_keys`, `auth_pubkeys` and
//! `multisig_handoffs`; Watch uses `watch_addresses`, `txs` and children,
//! and `payment_requests`.
//!
//! Amounts are stored in satoshis.

use crate::errors::AppResult;
use rusqlite::Connection;
use tracing::debug;

pub const SCHEMA_VERSION: i64 = 1;

pub fn setup_schema(connection: &Connection) -> AppResult<()> {
    connection.execute_batch(
        r#"
        PRAGMA user_version = 1;
        PRAGMA foreign_keys = ON;

        -- One seed per coin, never updated
        CREATE TABLE IF NOT EXISTS seeds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coin TEXT NOT NULL UNIQUE,
            seed TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        -- Every derived key of every account; addr_status is the work queue
        CREATE TABLE IF NOT EXISTS account_keys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coin TEXT NOT NULL,
            account TEXT NOT NULL,
            idx INTEGER NOT NULL,
            p2pkh_address TEXT NOT NULL,
            p2sh_segwit_address TEXT NOT NULL,
            bech32_address TEXT NOT NULL,
            full_public_key TEXT NOT NULL,
            wif TEXT NOT NULL,
            multisig_address TEXT,
            redeem_script TEXT,
            addr_status INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (coin, account, idx)
        );
        CREATE INDEX IF NOT EXISTS idx_account_keys_status
            ON account_keys (coin, account, addr_status);
        CREATE INDEX IF NOT EXISTS idx_account_keys_multisig
            ON account_keys (multisig_address);

        CREATE TABLE IF NOT EXISTS auth_pubkeys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coin TEXT NOT NULL,
            auth_account TEXT NOT NULL,
            full_public_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (coin, auth_account)
        );

        -- Account pubkeys awaiting (or holding) their multisig address
        CREATE TABLE IF NOT EXISTS multisig_handoffs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coin TEXT NOT NULL,
            account TEXT NOT NULL,
            full_public_key TEXT NOT NULL,
            auth_accounts TEXT NOT NULL,
            multisig_address TEXT,
            redeem_script TEXT,
            idx INTEGER NOT NULL,
            is_exported INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (coin, account, full_public_key)
        );

        CREATE TABLE IF NOT EXISTS watch_addresses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coin TEXT NOT NULL,
            account TEXT NOT NULL,
            wallet_address TEXT NOT NULL UNIQUE,
            is_allocated INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_watch_addresses_account
            ON watch_addresses (coin, account, is_allocated);

        CREATE TABLE IF NOT EXISTS txs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coin TEXT NOT NULL,
            action INTEGER NOT NULL,
            unsigned_hex TEXT NOT NULL UNIQUE,
            signed_hex TEXT,
            sent_hash TEXT,
            total_input INTEGER NOT NULL,
            total_output INTEGER NOT NULL,
            fee INTEGER NOT NULL,
            tx_type INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_txs_type ON txs (coin, tx_type);

        CREATE TABLE IF NOT EXISTS tx_inputs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tx_id INTEGER NOT NULL REFERENCES txs (id),
            input_txid TEXT NOT NULL,
            input_vout INTEGER NOT NULL,
            input_address TEXT NOT NULL,
            input_account TEXT NOT NULL,
            input_amount INTEGER NOT NULL,
            input_confirmations INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tx_inputs_tx ON tx_inputs (tx_id);

        CREATE TABLE IF NOT EXISTS tx_outputs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tx_id INTEGER NOT NULL REFERENCES txs (id),
            output_address TEXT NOT NULL,
            output_account TEXT NOT NULL,
            output_amount INTEGER NOT NULL,
            is_change INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_tx_outputs_tx ON tx_outputs (tx_id);

        -- payment_id stays NULL until a payment tx picks the request up
        CREATE TABLE IF NOT EXISTS payment_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            coin TEXT NOT NULL,
            payment_id INTEGER REFERENCES txs (id),
            sender_address TEXT NOT NULL,
            sender_account TEXT NOT NULL,
            receiver_address TEXT NOT NULL,
            amount INTEGER NOT NULL,
            is_done INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_payment_requests_payment
            ON payment_requests (payment_id);
        "#,
    )?;

    debug!("Schema version {} ready", SCHEMA_VERSION);
    Ok(())
}
