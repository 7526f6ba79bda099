use crate::crypto::{generate_seed, seed_fingerprint, validate_seed, HdKeyDeriver};
use crate::database::traits::{KeyRecordOperations, SeedOperations};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::types::{AccountType, DerivedKey};
use bitcoin::Network;
use tracing::info;

/// Seed management and gap-free key derivation for the cold roles
pub struct KeyGenerator {
    coin: String,
    deriver: HdKeyDeriver,
}

impl KeyGenerator {
    pub fn new(coin: &str, network: Network) -> Self {
        Self {
            coin: coin.to_string(),
            deriver: HdKeyDeriver::new(network),
        }
    }

    pub fn deriver(&self) -> &HdKeyDeriver {
        &self.deriver
    }

    /// Return the stored seed, generating and storing one on first use
    pub fn create_seed(&self, db: &Database) -> AppResult<Vec<u8>> {
        if let Some(seed) = db.connection().get_seed(&self.coin)? {
            validate_seed(&seed)?;
            info!(
                "Seed already exists for {} (fingerprint {})",
                self.coin,
                seed_fingerprint(&seed)
            );
            return Ok(seed);
        }

        let seed = generate_seed();
        db.connection().insert_seed(&self.coin, &seed)?;
        info!(
            "Generated seed for {} (fingerprint {})",
            self.coin,
            seed_fingerprint(&seed)
        );
        Ok(seed)
    }

    /// Store a known seed (development and recovery); never replaces one
    pub fn store_seed(&self, db: &Database, seed_hex: &str) -> AppResult<Vec<u8>> {
        let seed = hex::decode(seed_hex.trim())
            .map_err(|e| AppError::Validation(format!("seed is not hex: {}", e)))?;
        validate_seed(&seed)?;
        db.connection().insert_seed(&self.coin, &seed)?;
        info!(
            "Stored seed for {} (fingerprint {})",
            self.coin,
            seed_fingerprint(&seed)
        );
        Ok(seed)
    }

    /// Derive and store `count` new keys for `account`
    ///
    /// The first key of an account has index 1; later calls continue from
    /// the highest stored index so ranges never overlap or leave gaps.
    pub fn generate_keys(
        &self,
        db: &mut Database,
        account: AccountType,
        count: u32,
    ) -> AppResult<Vec<DerivedKey>> {
        if count == 0 {
            return Err(AppError::Validation("key count must be at least 1".to_string()));
        }
        account.derivation_value()?;

        let seed = db.connection().get_seed(&self.coin)?.ok_or_else(|| {
            AppError::Validation(format!("no seed stored for {}; run create-seed first", self.coin))
        })?;

        let coin = self.coin.clone();
        let keys = db.execute_transaction(|tx| {
            let start = tx.max_key_index(&coin, account)?.unwrap_or(0) + 1;
            let keys = self.deriver.derive_range(&seed, account, start, count)?;
            tx.insert_derived_keys(&coin, &keys)?;
            Ok(keys)
        })?;

        info!(
            "Generated {} {} keys (indices {}..={})",
            keys.len(),
            account,
            keys.first().map_or(0, |k| k.index),
            keys.last().map_or(0, |k| k.index)
        );
        Ok(keys)
    }
}
