//! Public key exchange between Keygen and Signature
//!
//! Keygen exports the account pubkeys of multisig accounts; Signature turns
//! them into handoff records. Signature exports its authorization pubkey;
//! both cold roles import authorization pubkeys.

use crate::database::traits::{
    AuthPubkeyOperations, KeyRecordOperations, MultisigHandoffOperations,
};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::handoff::{csv_file_path, read_handoff_file, write_records, CsvKind};
use crate::handoff::{AuthPubkeyLine, PubkeyLine};
use crate::processor::base::BatchStats;
use crate::processor::lifecycle::AddressLifecycle;
use crate::types::{AccountType, AddrStatus, AuthPubkey, MultisigHandoff};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct PubkeyExchange<'a> {
    lifecycle: &'a AddressLifecycle,
}

impl<'a> PubkeyExchange<'a> {
    pub fn new(lifecycle: &'a AddressLifecycle) -> Self {
        Self { lifecycle }
    }

    /// Keygen: write pubkeys of imported multisig-account keys and move
    /// them to `PubkeyExported`
    pub fn export_account_pubkeys(
        &self,
        db: &mut Database,
        account: AccountType,
        dir: &Path,
    ) -> AppResult<Option<PathBuf>> {
        if !self.lifecycle.is_multisig(account) {
            return Err(AppError::Validation(format!(
                "{} is not a multisig account; its addresses are exported directly",
                account
            )));
        }
        let coin = self.lifecycle.coin().to_string();
        let records = self.lifecycle.select_by_status(
            db.connection(),
            account,
            AddrStatus::PrivKeyImported,
        )?;
        if records.is_empty() {
            info!("No {} pubkeys ready for export", account);
            return Ok(None);
        }

        let lines: Vec<PubkeyLine> = records
            .iter()
            .map(|r| PubkeyLine {
                coin: coin.clone(),
                account,
                full_public_key: r.full_public_key.clone(),
                index: r.index,
            })
            .collect();
        let path = csv_file_path(dir, CsvKind::Pubkey, account);

        db.execute_transaction(|tx| {
            for record in &records {
                self.lifecycle
                    .advance(tx, record, AddrStatus::PubkeyExported)?;
            }
            write_records(&path, &lines)
        })?;

        info!("Exported {} {} pubkeys", lines.len(), account);
        Ok(Some(path))
    }

    /// Signature: create unresolved handoff records from a Keygen pubkey file
    pub fn import_account_pubkeys(&self, db: &mut Database, path: &Path) -> AppResult<BatchStats> {
        let coin = self.lifecycle.coin().to_string();
        let lines: Vec<PubkeyLine> = read_handoff_file(path, &coin)?;
        for line in &lines {
            if self.lifecycle.policy().policy(line.account).is_none() {
                return Err(AppError::InvalidHandoffFile {
                    file: path.display().to_string(),
                    reason: format!("{} is not configured as multisig", line.account),
                });
            }
        }

        let policy = self.lifecycle.policy();
        let stats = db.execute_transaction(|tx| {
            let mut stats = BatchStats::new();
            for line in &lines {
                let auth_accounts = policy
                    .policy(line.account)
                    .map(|p| p.auth_accounts.clone())
                    .unwrap_or_default();
                let inserted = tx.insert_multisig_handoff(&MultisigHandoff {
                    id: 0,
                    coin: coin.clone(),
                    account: line.account,
                    full_public_key: line.full_public_key.clone(),
                    auth_accounts,
                    multisig_address: None,
                    redeem_script: None,
                    index: line.index,
                    is_exported: false,
                })?;
                if inserted {
                    stats.record_processed();
                } else {
                    stats.record_skipped();
                }
            }
            Ok(stats)
        })?;

        stats.log_summary("Account pubkey import");
        Ok(stats)
    }

    /// Signature: export the pubkey of its own authorization key
    pub fn export_auth_pubkey(
        &self,
        db: &Database,
        auth_account: AccountType,
        dir: &Path,
    ) -> AppResult<PathBuf> {
        let coin = self.lifecycle.coin();
        let record = db
            .connection()
            .key_records(coin, auth_account)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::Validation(format!("no key generated for {} yet", auth_account))
            })?;

        db.connection().insert_auth_pubkey(&AuthPubkey {
            coin: coin.to_string(),
            auth_account,
            full_public_key: record.full_public_key.clone(),
        })?;

        let path = csv_file_path(dir, CsvKind::AuthPubkey, auth_account);
        write_records(
            &path,
            &[AuthPubkeyLine {
                coin: coin.to_string(),
                auth_account,
                full_public_key: record.full_public_key,
            }],
        )?;
        info!("Exported {} pubkey", auth_account);
        Ok(path)
    }

    /// Keygen and Signature: import authorization pubkeys
    pub fn import_auth_pubkeys(&self, db: &mut Database, path: &Path) -> AppResult<BatchStats> {
        let coin = self.lifecycle.coin().to_string();
        let lines: Vec<AuthPubkeyLine> = read_handoff_file(path, &coin)?;

        let stats = db.execute_transaction(|tx| {
            let mut stats = BatchStats::new();
            for line in &lines {
                let inserted = tx.insert_auth_pubkey(&AuthPubkey {
                    coin: coin.clone(),
                    auth_account: line.auth_account,
                    full_public_key: line.full_public_key.clone(),
                })?;
                if inserted {
                    stats.record_processed();
                } else {
                    warn!("{} pubkey already known", line.auth_account);
                    stats.record_skipped();
                }
            }
            Ok(stats)
        })?;

        stats.log_summary("Authorization pubkey import");
        Ok(stats)
    }
}
