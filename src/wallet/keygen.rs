use crate::config::{AppConfig, FilePathConfig};
use crate::crypto::seed_fingerprint;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::processor::{
    export_addresses, AccountKeyResolver, AddressLifecycle, BatchStats, KeyGenerator,
    MultisigRegistrar, PrivKeyImporter, PubkeyExchange, SignOutcome, Signer,
};
use crate::rpc::ChainNode;
use crate::types::{AccountType, AddrType, DerivedKey};
use std::path::{Path, PathBuf};

/// Cold wallet owning the master seed and every account key
pub struct KeygenWallet {
    db: Database,
    generator: KeyGenerator,
    lifecycle: AddressLifecycle,
    address_type: AddrType,
    paths: FilePathConfig,
}

impl KeygenWallet {
    pub fn new(db: Database, config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            db,
            generator: KeyGenerator::new(&config.wallet.coin, config.network()?),
            lifecycle: AddressLifecycle::new(&config.wallet.coin, config.account_policy()?),
            address_type: config.address_type()?,
            paths: config.file_path.clone(),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Generate the seed if missing; returns its fingerprint
    pub fn create_seed(&self) -> AppResult<String> {
        let seed = self.generator.create_seed(&self.db)?;
        Ok(seed_fingerprint(&seed))
    }

    /// Store a known seed (development setups)
    pub fn store_seed(&self, seed_hex: &str) -> AppResult<String> {
        let seed = self.generator.store_seed(&self.db, seed_hex)?;
        Ok(seed_fingerprint(&seed))
    }

    pub fn create_keys(&mut self, account: AccountType, count: u32) -> AppResult<Vec<DerivedKey>> {
        if account.is_authorization() {
            return Err(AppError::Validation(format!(
                "{} keys belong to the signature wallet",
                account
            )));
        }
        self.generator.generate_keys(&mut self.db, account, count)
    }

    pub fn import_privkeys(
        &self,
        node: &dyn ChainNode,
        account: AccountType,
    ) -> AppResult<BatchStats> {
        PrivKeyImporter::new(&self.lifecycle, self.generator.deriver(), self.address_type)
            .import(&self.db, node, account)
    }

    pub fn export_pubkeys(&mut self, account: AccountType) -> AppResult<Option<PathBuf>> {
        PubkeyExchange::new(&self.lifecycle).export_account_pubkeys(
            &mut self.db,
            account,
            &self.paths.pubkey,
        )
    }

    pub fn import_auth_pubkeys(&mut self, path: &Path) -> AppResult<BatchStats> {
        PubkeyExchange::new(&self.lifecycle).import_auth_pubkeys(&mut self.db, path)
    }

    pub fn create_multisig(
        &mut self,
        node: &dyn ChainNode,
        account: AccountType,
    ) -> AppResult<BatchStats> {
        MultisigRegistrar::new(&self.lifecycle, self.address_type).register_account_keys(
            &mut self.db,
            node,
            account,
        )
    }

    /// Take multisig addresses resolved by the signature wallet
    pub fn import_multisig(&mut self, path: &Path) -> AppResult<BatchStats> {
        MultisigRegistrar::new(&self.lifecycle, self.address_type)
            .import_resolved(&mut self.db, path)
    }

    pub fn export_addresses(&mut self, account: AccountType) -> AppResult<Option<PathBuf>> {
        export_addresses(&self.lifecycle, &mut self.db, account, &self.paths.address)
    }

    pub fn sign(&self, node: &dyn ChainNode, path: &Path) -> AppResult<SignOutcome> {
        let resolver = AccountKeyResolver::new(&self.lifecycle, self.generator.deriver());
        Signer::new(&resolver, &self.paths.tx).sign_file(&self.db, node, path)
    }
}
