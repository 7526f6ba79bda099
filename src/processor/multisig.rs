//! Multisig address registrar
//!
//! Key order is always `[account_pubkey, auth pubkeys in policy order]` and
//! the threshold comes from the account's configured policy, so Keygen and
//! Signature derive the same address from the same inputs.

use crate::database::traits::{
    AuthPubkeyOperations, KeyRecordOperations, MultisigHandoffOperations,
};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::handoff::{csv_file_path, read_handoff_file, write_records, CsvKind, MultisigLine};
use crate::processor::base::BatchStats;
use crate::processor::lifecycle::AddressLifecycle;
use crate::rpc::ChainNode;
use crate::types::{AccountType, AddrStatus, AddrType, MultisigPolicy};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct MultisigRegistrar<'a> {
    lifecycle: &'a AddressLifecycle,
    address_type: AddrType,
}

/// Label the node stores multisig addresses under
pub fn multisig_label(account: AccountType) -> String {
    format!("multi_{}", account)
}

impl<'a> MultisigRegistrar<'a> {
    pub fn new(lifecycle: &'a AddressLifecycle, address_type: AddrType) -> Self {
        Self {
            lifecycle,
            address_type,
        }
    }

    fn policy(&self, account: AccountType) -> AppResult<&MultisigPolicy> {
        self.lifecycle
            .policy()
            .policy(account)
            .ok_or_else(|| AppError::Validation(format!("{} is not a multisig account", account)))
    }

    /// Authorization pubkeys for `auth_accounts`, in that order
    fn auth_pubkeys(
        &self,
        conn: &Connection,
        auth_accounts: &[AccountType],
    ) -> AppResult<Vec<String>> {
        auth_accounts
            .iter()
            .map(|auth| {
                conn.auth_pubkey(self.lifecycle.coin(), *auth)?
                    .map(|p| p.full_public_key)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "{} pubkey has not been imported; run import-auth-pubkey first",
                            auth
                        ))
                    })
            })
            .collect()
    }

    /// Keygen: register every `PubkeyExported` record of `account`
    pub fn register_account_keys(
        &self,
        db: &mut Database,
        node: &dyn ChainNode,
        account: AccountType,
    ) -> AppResult<BatchStats> {
        let policy = self.policy(account)?.clone();
        let auth_keys = self.auth_pubkeys(db.connection(), &policy.auth_accounts)?;
        let records = self.lifecycle.select_by_status(
            db.connection(),
            account,
            AddrStatus::PubkeyExported,
        )?;

        let mut stats = BatchStats::new();
        for record in &records {
            let mut keys = vec![record.full_public_key.clone()];
            keys.extend(auth_keys.iter().cloned());

            let multisig = match node.add_multisig_address(
                policy.required,
                &keys,
                &multisig_label(account),
                self.address_type,
            ) {
                Ok(multisig) => multisig,
                Err(e) => {
                    warn!(
                        "addmultisigaddress failed for {} index {}: {}",
                        account, record.index, e
                    );
                    stats.record_failed();
                    continue;
                }
            };

            db.execute_transaction(|tx| {
                tx.set_multisig_address(record.id, &multisig.address, &multisig.redeem_script)?;
                self.lifecycle
                    .advance(tx, record, AddrStatus::MultisigImported)
            })?;
            stats.record_processed();
        }

        stats.log_summary(&format!(
            "Multisig registration ({} {}-of-{})",
            account,
            policy.required,
            policy.total()
        ));
        Ok(stats)
    }

    /// Signature: resolve handoff records imported from Keygen
    pub fn register_handoffs(
        &self,
        db: &mut Database,
        node: &dyn ChainNode,
    ) -> AppResult<BatchStats> {
        let handoffs = db
            .connection()
            .unresolved_multisig_handoffs(self.lifecycle.coin())?;

        let mut stats = BatchStats::new();
        for handoff in &handoffs {
            let policy = self.policy(handoff.account)?;
            let auth_keys = self.auth_pubkeys(db.connection(), &handoff.auth_accounts)?;
            let mut keys = vec![handoff.full_public_key.clone()];
            keys.extend(auth_keys);

            match node.add_multisig_address(
                policy.required,
                &keys,
                &multisig_label(handoff.account),
                self.address_type,
            ) {
                Ok(multisig) => {
                    db.connection().resolve_multisig_handoff(
                        handoff.id,
                        &multisig.address,
                        &multisig.redeem_script,
                    )?;
                    stats.record_processed();
                }
                Err(e) => {
                    warn!(
                        "addmultisigaddress failed for {} index {}: {}",
                        handoff.account, handoff.index, e
                    );
                    stats.record_failed();
                }
            }
        }

        stats.log_summary("Multisig registration (handoffs)");
        Ok(stats)
    }

    /// Signature: write resolved, not yet exported handoffs of `account`
    pub fn export_resolved(
        &self,
        db: &mut Database,
        account: AccountType,
        dir: &Path,
    ) -> AppResult<Option<PathBuf>> {
        let coin = self.lifecycle.coin().to_string();
        let handoffs: Vec<_> = db
            .connection()
            .unexported_multisig_handoffs(&coin)?
            .into_iter()
            .filter(|h| h.account == account)
            .collect();
        if handoffs.is_empty() {
            info!("No resolved {} multisig addresses to export", account);
            return Ok(None);
        }

        let mut lines = Vec::with_capacity(handoffs.len());
        for h in &handoffs {
            let (Some(address), Some(redeem_script)) = (&h.multisig_address, &h.redeem_script)
            else {
                continue;
            };
            lines.push(MultisigLine {
                coin: coin.clone(),
                account: h.account,
                full_public_key: h.full_public_key.clone(),
                multisig_address: address.clone(),
                redeem_script: redeem_script.clone(),
                index: h.index,
            });
        }
        let ids: Vec<i64> = handoffs.iter().map(|h| h.id).collect();
        let path = csv_file_path(dir, CsvKind::Multisig, account);

        db.execute_transaction(|tx| {
            tx.mark_handoffs_exported(&ids)?;
            write_records(&path, &lines)
        })?;

        info!("Exported {} {} multisig addresses", lines.len(), account);
        Ok(Some(path))
    }

    /// Keygen: apply a multisig file from Signature
    ///
    /// Records already registered locally are skipped.
    pub fn import_resolved(&self, db: &mut Database, path: &Path) -> AppResult<BatchStats> {
        let coin = self.lifecycle.coin().to_string();
        let lines: Vec<MultisigLine> = read_handoff_file(path, &coin)?;

        let mut stats = BatchStats::new();
        for line in &lines {
            let record =
                db.connection()
                    .key_record_by_pubkey(&coin, line.account, &line.full_public_key)?;
            let Some(record) = record else {
                warn!(
                    "No {} key with pubkey {} (index {})",
                    line.account, line.full_public_key, line.index
                );
                stats.record_failed();
                continue;
            };
            if record.status != AddrStatus::PubkeyExported {
                stats.record_skipped();
                continue;
            }

            db.execute_transaction(|tx| {
                tx.set_multisig_address(record.id, &line.multisig_address, &line.redeem_script)?;
                self.lifecycle
                    .advance(tx, &record, AddrStatus::MultisigImported)
            })?;
            stats.record_processed();
        }

        stats.log_summary("Multisig address import");
        Ok(stats)
    }
}
