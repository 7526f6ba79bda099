use crate::database::traits::WatchAddressOperations;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::handoff::{csv_file_path, read_handoff_file, write_records, AddressLine, CsvKind};
use crate::processor::base::BatchStats;
use crate::processor::lifecycle::AddressLifecycle;
use crate::rpc::ChainNode;
use crate::types::{AccountType, AddrStatus, AddrType};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Keygen: export receive addresses for Watch
///
/// Multisig accounts export once their multisig address is imported,
/// single-key accounts straight after the private key import.
pub fn export_addresses(
    lifecycle: &AddressLifecycle,
    db: &mut Database,
    account: AccountType,
    dir: &Path,
) -> AppResult<Option<PathBuf>> {
    if account.is_authorization() || account == AccountType::Anonymous {
        return Err(AppError::Validation(format!(
            "{} addresses are never handed to Watch",
            account
        )));
    }
    let ready_status = if lifecycle.is_multisig(account) {
        AddrStatus::MultisigImported
    } else {
        AddrStatus::PrivKeyImported
    };
    let records = lifecycle.select_by_status(db.connection(), account, ready_status)?;
    if records.is_empty() {
        info!("No {} addresses ready for export", account);
        return Ok(None);
    }

    let lines: Vec<AddressLine> = records
        .iter()
        .map(|r| AddressLine {
            coin: lifecycle.coin().to_string(),
            account,
            p2pkh_address: r.p2pkh_address.clone(),
            p2sh_segwit_address: r.p2sh_segwit_address.clone(),
            bech32_address: r.bech32_address.clone(),
            full_public_key: r.full_public_key.clone(),
            multisig_address: r.multisig_address.clone(),
            index: r.index,
        })
        .collect();
    let path = csv_file_path(dir, CsvKind::Address, account);

    db.execute_transaction(|tx| {
        for record in &records {
            lifecycle.advance(tx, record, AddrStatus::AddressExported)?;
        }
        write_records(&path, &lines)
    })?;

    info!("Exported {} {} addresses", lines.len(), account);
    Ok(Some(path))
}

/// Watch: import an address file into the online node as watch-only
pub struct AddressImporter<'a> {
    coin: &'a str,
    address_type: AddrType,
}

impl<'a> AddressImporter<'a> {
    pub fn new(coin: &'a str, address_type: AddrType) -> Self {
        Self { coin, address_type }
    }

    /// Address Watch tracks for a line: the multisig address when present
    pub fn watch_address<'l>(&self, line: &'l AddressLine) -> &'l str {
        if let Some(multisig) = line.multisig_address.as_deref() {
            return multisig;
        }
        match self.address_type {
            AddrType::Legacy => &line.p2pkh_address,
            AddrType::P2shSegwit => &line.p2sh_segwit_address,
            AddrType::Bech32 => &line.bech32_address,
        }
    }

    pub fn import(&self, db: &Database, node: &dyn ChainNode, path: &Path) -> AppResult<BatchStats> {
        let lines: Vec<AddressLine> = read_handoff_file(path, self.coin)?;

        let mut stats = BatchStats::new();
        for line in &lines {
            let address = self.watch_address(line);
            let label = line.account.name();

            if let Err(e) = node.import_address(address, &label, false) {
                warn!("importaddress failed for {}: {}", address, e);
                stats.record_failed();
                continue;
            }
            if db
                .connection()
                .insert_watch_address(self.coin, line.account, address)?
            {
                stats.record_processed();
            } else {
                stats.record_skipped();
            }

            match node.get_address_info(address) {
                Ok(info) if !info.is_watch_only => {
                    warn!("{} is not reported as watch-only", address)
                }
                Ok(_) => {}
                Err(e) => warn!("getaddressinfo failed for {}: {}", address, e),
            }
        }

        stats.log_summary("Address import");
        Ok(stats)
    }
}
