//! Signing rounds over unsigned transaction files (Keygen and Signature)
//!
//! Round 0 files come from Watch and are signed by Keygen. A multisig
//! input is not complete after Keygen's signature, so Keygen writes an
//! unsigned file for round 1 carrying the redeem scripts, and Signature
//! finishes it with its authorization key.

use crate::crypto::HdKeyDeriver;
use crate::database::traits::KeyRecordOperations;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::handoff::{read_tx_file, write_tx_file, TxFileName};
use crate::processor::lifecycle::AddressLifecycle;
use crate::rpc::ChainNode;
use crate::types::{AccountType, PrevTxContext, TxType};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Supplies the private keys one role contributes to a transaction
pub trait SigningKeyResolver {
    /// Whether this role signs files of the given round
    fn accepts_round(&self, round: u32) -> bool;

    /// WIFs for the inputs in `context`; may fill in redeem scripts
    fn signing_keys(&self, conn: &Connection, context: &mut PrevTxContext)
        -> AppResult<Vec<String>>;
}

/// Keys held by Keygen: every derived account key
pub struct AccountKeyResolver<'a> {
    lifecycle: &'a AddressLifecycle,
    deriver: &'a HdKeyDeriver,
}

impl<'a> AccountKeyResolver<'a> {
    pub fn new(lifecycle: &'a AddressLifecycle, deriver: &'a HdKeyDeriver) -> Self {
        Self { lifecycle, deriver }
    }
}

impl SigningKeyResolver for AccountKeyResolver<'_> {
    fn accepts_round(&self, round: u32) -> bool {
        round == 0
    }

    fn signing_keys(
        &self,
        conn: &Connection,
        context: &mut PrevTxContext,
    ) -> AppResult<Vec<String>> {
        let coin = self.lifecycle.coin();
        let mut wifs = BTreeSet::new();

        if self.lifecycle.is_multisig(context.sender_account) {
            let records = conn.key_records_by_multisig_address(coin, &context.addrs)?;
            for (prev, address) in context.prev_txs.iter_mut().zip(&context.addrs) {
                let Some(record) = records
                    .iter()
                    .find(|r| r.multisig_address.as_deref() == Some(address.as_str()))
                else {
                    warn!("No key record for multisig input address {}", address);
                    continue;
                };
                match record.redeem_script.as_deref() {
                    Some(script) if !script.is_empty() => {
                        prev.redeem_script = script.to_string();
                    }
                    _ => warn!("No redeem script stored for {}", address),
                }
                wifs.insert(record.wif.clone());
            }
        } else {
            let records = conn.key_records_by_address(coin, &context.addrs)?;
            for address in &context.addrs {
                match records.iter().find(|r| r.owns_address(address)) {
                    Some(record) => {
                        wifs.insert(record.wif.clone());
                    }
                    None => warn!("No key record for input address {}", address),
                }
            }
        }

        // A stored key that no longer decodes, or decodes for another
        // chain, aborts the round.
        for wif in &wifs {
            self.deriver.decode_wif(wif)?;
        }
        Ok(wifs.into_iter().collect())
    }
}

/// The single authorization key held by Signature
pub struct AuthKeyResolver<'a> {
    lifecycle: &'a AddressLifecycle,
    deriver: &'a HdKeyDeriver,
    auth_account: AccountType,
}

impl<'a> AuthKeyResolver<'a> {
    pub fn new(
        lifecycle: &'a AddressLifecycle,
        deriver: &'a HdKeyDeriver,
        auth_account: AccountType,
    ) -> Self {
        Self {
            lifecycle,
            deriver,
            auth_account,
        }
    }
}

impl SigningKeyResolver for AuthKeyResolver<'_> {
    fn accepts_round(&self, round: u32) -> bool {
        round >= 1
    }

    fn signing_keys(
        &self,
        conn: &Connection,
        context: &mut PrevTxContext,
    ) -> AppResult<Vec<String>> {
        let sender = context.sender_account;
        let policy = self.lifecycle.policy().policy(sender).ok_or_else(|| {
            AppError::Validation(format!("{} is not a multisig account", sender))
        })?;
        if !policy.auth_accounts.contains(&self.auth_account) {
            return Err(AppError::Validation(format!(
                "{} does not co-sign for {}",
                self.auth_account, sender
            )));
        }
        for (prev, address) in context.prev_txs.iter().zip(&context.addrs) {
            if prev.redeem_script.is_empty() {
                warn!("Input {} has no redeem script", address);
            }
        }

        let record = conn
            .key_records(self.lifecycle.coin(), self.auth_account)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::Validation(format!("no key derived for {}", self.auth_account))
            })?;
        self.deriver.decode_wif(&record.wif)?;
        Ok(vec![record.wif])
    }
}

/// Result of one signing round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    pub path: PathBuf,
    /// True when the written file is a signed file ready for broadcast
    pub is_signed: bool,
}

pub struct Signer<'a> {
    resolver: &'a dyn SigningKeyResolver,
    tx_dir: &'a Path,
}

impl<'a> Signer<'a> {
    pub fn new(resolver: &'a dyn SigningKeyResolver, tx_dir: &'a Path) -> Self {
        Self { resolver, tx_dir }
    }

    /// Sign an unsigned file and write the next file of the chain
    pub fn sign_file(
        &self,
        db: &Database,
        node: &dyn ChainNode,
        path: &Path,
    ) -> AppResult<SignOutcome> {
        let file = read_tx_file(path, TxType::Unsigned)?;
        let name = &file.name;
        if !self.resolver.accepts_round(name.round) {
            return Err(AppError::InvalidHandoffFile {
                file: path.display().to_string(),
                reason: format!("round {} is not signed by this wallet", name.round),
            });
        }
        let mut context = file.context.clone().ok_or_else(|| AppError::InvalidHandoffFile {
            file: path.display().to_string(),
            reason: "unsigned file has no previous output context".to_string(),
        })?;

        let wifs = self.resolver.signing_keys(db.connection(), &mut context)?;
        if wifs.is_empty() {
            return Err(AppError::Validation(format!(
                "no signing keys for transaction {}",
                name.tx_id
            )));
        }
        debug!("Signing transaction {} with {} keys", name.tx_id, wifs.len());

        let signed = node.sign_raw_transaction_with_key(&file.hex, &wifs, &context.prev_txs)?;

        let (next, body_context) = if signed.complete {
            (
                TxFileName::new(name.action, name.tx_id, TxType::Signed, name.round),
                None,
            )
        } else {
            (
                TxFileName::new(name.action, name.tx_id, TxType::Unsigned, name.round + 1),
                Some(&context),
            )
        };
        let out = write_tx_file(self.tx_dir, &next, &signed.hex, body_context)?;

        info!(
            "Signed {} transaction {} round {} (complete: {})",
            name.action, name.tx_id, name.round, signed.complete
        );
        Ok(SignOutcome {
            path: out,
            is_signed: signed.complete,
        })
    }
}
