use crate::config::AppConfig;
use crate::crypto::HdKeyDeriver;
use crate::database::Database;
use crate::errors::AppResult;
use crate::processor::{
    AddressImporter, BatchStats, CreateOutcome, FeeCalculator, PaymentRequestQueue, SentTx,
    TxCreator, TxMonitor, TxSender,
};
use crate::rpc::ChainNode;
use crate::types::{AccountType, AddrType};
use std::path::{Path, PathBuf};

/// Online wallet: watch-only addresses, transaction creation and broadcast
pub struct WatchWallet {
    db: Database,
    coin: String,
    deriver: HdKeyDeriver,
    address_type: AddrType,
    fee: FeeCalculator,
    tx_dir: PathBuf,
    confirmation_num: u64,
    deposit_receiver: AccountType,
    payment_sender: AccountType,
}

impl WatchWallet {
    pub fn new(db: Database, config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            db,
            coin: config.wallet.coin.clone(),
            deriver: HdKeyDeriver::new(config.network()?),
            address_type: config.address_type()?,
            fee: FeeCalculator::new(&config.fee),
            tx_dir: config.file_path.tx.clone(),
            confirmation_num: config.block.confirmation_num,
            deposit_receiver: config.deposit_receiver()?,
            payment_sender: config.payment_sender()?,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn import_addresses(&self, node: &dyn ChainNode, path: &Path) -> AppResult<BatchStats> {
        AddressImporter::new(&self.coin, self.address_type).import(&self.db, node, path)
    }

    pub fn create_deposit(&mut self, node: &dyn ChainNode, adjustment: f64) -> AppResult<CreateOutcome> {
        TxCreator::new(&self.coin, &self.fee, &self.tx_dir).create_deposit(
            &mut self.db,
            node,
            self.deposit_receiver,
            adjustment,
        )
    }

    pub fn create_payment(&mut self, node: &dyn ChainNode, adjustment: f64) -> AppResult<CreateOutcome> {
        TxCreator::new(&self.coin, &self.fee, &self.tx_dir).create_payment(
            &mut self.db,
            node,
            self.payment_sender,
            adjustment,
        )
    }

    /// `amount` of 0 moves everything the sender holds
    pub fn create_transfer(
        &mut self,
        node: &dyn ChainNode,
        sender: AccountType,
        receiver: AccountType,
        amount: u64,
        adjustment: f64,
    ) -> AppResult<CreateOutcome> {
        TxCreator::new(&self.coin, &self.fee, &self.tx_dir).create_transfer(
            &mut self.db,
            node,
            sender,
            receiver,
            amount,
            adjustment,
        )
    }

    pub fn add_payment_request(
        &self,
        sender_address: Option<&str>,
        receiver_address: &str,
        amount: u64,
    ) -> AppResult<i64> {
        PaymentRequestQueue::new(&self.coin, &self.deriver).add(
            &self.db,
            sender_address,
            receiver_address,
            amount,
        )
    }

    pub fn send(&mut self, node: &dyn ChainNode, path: &Path) -> AppResult<SentTx> {
        TxSender::new(&self.coin).send_file(&mut self.db, node, path)
    }

    pub fn send_pending(&mut self, node: &dyn ChainNode) -> AppResult<BatchStats> {
        TxSender::new(&self.coin).send_pending(&mut self.db, node, &self.tx_dir)
    }

    pub fn monitor(&mut self, node: &dyn ChainNode) -> AppResult<(BatchStats, BatchStats)> {
        TxMonitor::new(&self.coin, self.confirmation_num).run(&mut self.db, node)
    }
}
