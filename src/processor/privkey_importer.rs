use crate::crypto::HdKeyDeriver;
use crate::database::Database;
use crate::errors::AppResult;
use crate::processor::base::BatchStats;
use crate::processor::lifecycle::AddressLifecycle;
use crate::rpc::ChainNode;
use crate::types::{AccountType, AddrStatus, AddrType};
use tracing::{info, warn};

/// Imports generated private keys into the offline node
///
/// Keys are imported without rescan; the offline node never sees funds.
pub struct PrivKeyImporter<'a> {
    lifecycle: &'a AddressLifecycle,
    deriver: &'a HdKeyDeriver,
    address_type: AddrType,
}

impl<'a> PrivKeyImporter<'a> {
    pub fn new(
        lifecycle: &'a AddressLifecycle,
        deriver: &'a HdKeyDeriver,
        address_type: AddrType,
    ) -> Self {
        Self {
            lifecycle,
            deriver,
            address_type,
        }
    }

    pub fn import(
        &self,
        db: &Database,
        node: &dyn ChainNode,
        account: AccountType,
    ) -> AppResult<BatchStats> {
        let mut stats = BatchStats::new();
        let records =
            self.lifecycle
                .select_by_status(db.connection(), account, AddrStatus::Generated)?;
        if records.is_empty() {
            info!("No generated {} keys to import", account);
            return Ok(stats);
        }

        for record in &records {
            // Stored WIFs that fail to decode abort the whole batch
            self.deriver.decode_wif(&record.wif)?;

            if let Err(e) = node.import_priv_key(&record.wif, &account.name(), false) {
                warn!(
                    "importprivkey failed for {} index {}: {}",
                    account, record.index, e
                );
                stats.record_failed();
                continue;
            }

            self.lifecycle
                .advance(db.connection(), record, AddrStatus::PrivKeyImported)?;
            stats.record_processed();

            let address = record.single_key_address(self.address_type);
            match node.get_address_info(address) {
                Ok(info) if info.pubkey.as_deref() != Some(record.full_public_key.as_str()) => {
                    warn!(
                        "Node reports pubkey {:?} for {} (expected {})",
                        info.pubkey, address, record.full_public_key
                    );
                }
                Ok(_) => {}
                Err(e) => warn!("getaddressinfo failed for {}: {}", address, e),
            }
        }

        stats.log_summary(&format!("Private key import ({})", account));
        Ok(stats)
    }
}
