use crate::config::{AppConfig, FilePathConfig};
use crate::crypto::seed_fingerprint;
use crate::database::traits::KeyRecordOperations;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::processor::{
    AddressLifecycle, AuthKeyResolver, BatchStats, KeyGenerator, MultisigRegistrar,
    PrivKeyImporter, PubkeyExchange, SignOutcome, Signer,
};
use crate::rpc::ChainNode;
use crate::types::{AccountType, AddrType, DerivedKey};
use std::path::{Path, PathBuf};
use tracing::info;

/// Cold wallet holding a single authorization key
pub struct SignatureWallet {
    db: Database,
    generator: KeyGenerator,
    lifecycle: AddressLifecycle,
    auth_account: AccountType,
    address_type: AddrType,
    paths: FilePathConfig,
}

impl SignatureWallet {
    pub fn new(db: Database, config: &AppConfig) -> AppResult<Self> {
        let auth_account = config.auth_account()?;
        if !auth_account.is_authorization() {
            return Err(AppError::Config(format!(
                "auth_type {} is not an authorization account",
                auth_account
            )));
        }
        Ok(Self {
            db,
            generator: KeyGenerator::new(&config.wallet.coin, config.network()?),
            lifecycle: AddressLifecycle::new(&config.wallet.coin, config.account_policy()?),
            auth_account,
            address_type: config.address_type()?,
            paths: config.file_path.clone(),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn auth_account(&self) -> AccountType {
        self.auth_account
    }

    pub fn create_seed(&self) -> AppResult<String> {
        let seed = self.generator.create_seed(&self.db)?;
        Ok(seed_fingerprint(&seed))
    }

    pub fn store_seed(&self, seed_hex: &str) -> AppResult<String> {
        let seed = self.generator.store_seed(&self.db, seed_hex)?;
        Ok(seed_fingerprint(&seed))
    }

    /// Derive the authorization key; refused once it exists
    pub fn create_key(&mut self) -> AppResult<DerivedKey> {
        let existing = self
            .db
            .connection()
            .max_key_index(self.lifecycle.coin(), self.auth_account)?;
        if existing.is_some() {
            return Err(AppError::Validation(format!(
                "{} key already exists",
                self.auth_account
            )));
        }
        let key = self
            .generator
            .generate_keys(&mut self.db, self.auth_account, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InvalidData("derivation returned no key".to_string()))?;
        info!("Created {} key {}", self.auth_account, key.full_public_key);
        Ok(key)
    }

    pub fn import_privkey(&self, node: &dyn ChainNode) -> AppResult<BatchStats> {
        PrivKeyImporter::new(&self.lifecycle, self.generator.deriver(), self.address_type)
            .import(&self.db, node, self.auth_account)
    }

    pub fn export_auth_pubkey(&self) -> AppResult<PathBuf> {
        PubkeyExchange::new(&self.lifecycle).export_auth_pubkey(
            &self.db,
            self.auth_account,
            &self.paths.pubkey,
        )
    }

    /// Pubkeys of the other authorization accounts
    pub fn import_auth_pubkeys(&mut self, path: &Path) -> AppResult<BatchStats> {
        PubkeyExchange::new(&self.lifecycle).import_auth_pubkeys(&mut self.db, path)
    }

    /// Account pubkeys exported by Keygen
    pub fn import_pubkeys(&mut self, path: &Path) -> AppResult<BatchStats> {
        PubkeyExchange::new(&self.lifecycle).import_account_pubkeys(&mut self.db, path)
    }

    pub fn create_multisig(&mut self, node: &dyn ChainNode) -> AppResult<BatchStats> {
        MultisigRegistrar::new(&self.lifecycle, self.address_type)
            .register_handoffs(&mut self.db, node)
    }

    pub fn export_multisig(&mut self, account: AccountType) -> AppResult<Option<PathBuf>> {
        MultisigRegistrar::new(&self.lifecycle, self.address_type).export_resolved(
            &mut self.db,
            account,
            &self.paths.address,
        )
    }

    pub fn sign(&self, node: &dyn ChainNode, path: &Path) -> AppResult<SignOutcome> {
        let resolver =
            AuthKeyResolver::new(&self.lifecycle, self.generator.deriver(), self.auth_account);
        Signer::new(&resolver, &self.paths.tx).sign_file(&self.db, node, path)
    }
}
