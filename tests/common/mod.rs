//! Common Test Utilities
//!
//! Shared fixtures for the wallet tests: a configuration pointing into a
//! temporary directory, fixed seeds, and [`MockNode`], an in-process
//! `ChainNode` that builds real transactions with the `bitcoin` crate.

#![allow(dead_code)]

use airgap_wallet::config::{
    AccountsConfig, AppConfig, BitcoinRpcConfig, BlockConfig, DatabaseConfig, FeeConfig,
    FilePathConfig, MultisigPolicyConfig, WalletConfig,
};
use airgap_wallet::crypto::HdKeyDeriver;
use airgap_wallet::database::traits::WatchAddressOperations;
use airgap_wallet::database::Database;
use airgap_wallet::errors::{RpcError, RpcResult};
use airgap_wallet::rpc::{AddressInfo, ChainNode, MultisigAddress, SignedTx, UnspentOutput};
use airgap_wallet::types::{AccountType, AddrType, PrevTx};
use airgap_wallet::wallet::{KeygenWallet, SignatureWallet, WatchWallet};
use anyhow::Context;
use bitcoin::absolute::LockTime;
use bitcoin::address::NetworkUnchecked;
use bitcoin::opcodes::all::OP_CHECKMULTISIG;
use bitcoin::script::{Builder, Instruction};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, CompressedPublicKey, Network, OutPoint, PrivateKey, PublicKey, ScriptBuf,
    Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tempfile::TempDir;

pub const COIN: &str = "btc";
pub const KEYGEN_SEED: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
pub const SIGNATURE_SEED: &str = "fffcf9f6f3f0edeae7e4e1dedbd8d5d2cfccc9c6c3c0bdbab7b4b1aeaba8a5a2";
pub const EXTERNAL_SEED: &str = "5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e";

/// Test configuration: regtest, p2sh-segwit, deposit is 2-of-2 with auth1
pub fn test_config(dir: &Path) -> AppConfig {
    let mut multisig = std::collections::BTreeMap::new();
    multisig.insert(
        "deposit".to_string(),
        MultisigPolicyConfig {
            required: 2,
            auth_accounts: vec!["auth1".to_string()],
        },
    );
    AppConfig {
        wallet: WalletConfig {
            coin: COIN.to_string(),
            network: "regtest".to_string(),
            address_type: "p2sh-segwit".to_string(),
            auth_type: "auth1".to_string(),
        },
        database: DatabaseConfig {
            path: dir.join("wallet.db"),
        },
        bitcoin_rpc: BitcoinRpcConfig::default(),
        fee: FeeConfig {
            adjustment_min: 0.9,
            adjustment_max: 1.5,
            confirmation_target: 6,
        },
        block: BlockConfig {
            confirmation_num: 6,
        },
        file_path: FilePathConfig {
            tx: dir.join("tx"),
            address: dir.join("address"),
            pubkey: dir.join("pubkey"),
        },
        multisig,
        accounts: AccountsConfig {
            deposit_receiver: "deposit".to_string(),
            payment_sender: "payment".to_string(),
        },
    }
}

/// Test configuration with a `required`-of-N deposit policy over
/// `auth_accounts` (the first one is held by [`Roles::signature`])
pub fn test_config_with_deposit_policy(
    dir: &Path,
    required: usize,
    auth_accounts: &[&str],
) -> AppConfig {
    let mut config = test_config(dir);
    config.multisig.insert(
        "deposit".to_string(),
        MultisigPolicyConfig {
            required,
            auth_accounts: auth_accounts.iter().map(|a| a.to_string()).collect(),
        },
    );
    config
}

/// Database file for one role inside the test directory
pub fn role_database(dir: &Path, role: &str) -> anyhow::Result<Database> {
    let path = dir.join(format!("{}.db", role));
    Ok(Database::new(&path.to_string_lossy())?)
}

/// One instance of each wallet role sharing a temporary directory
pub struct Roles {
    pub dir: TempDir,
    pub config: AppConfig,
    pub node: MockNode,
    pub keygen: KeygenWallet,
    pub signature: SignatureWallet,
    pub watch: WatchWallet,
}

pub fn roles() -> anyhow::Result<Roles> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path());
    roles_in(dir, config)
}

/// Roles sharing a custom deposit policy, plus one extra Signature wallet
/// for every authorization account after the first
pub fn roles_with_deposit_policy(
    required: usize,
    auth_accounts: &[&str],
) -> anyhow::Result<(Roles, Vec<SignatureWallet>)> {
    let dir = tempfile::tempdir()?;
    let config = test_config_with_deposit_policy(dir.path(), required, auth_accounts);

    let mut cosigners = Vec::new();
    for auth in auth_accounts.iter().skip(1) {
        let mut cosigner_config = config.clone();
        cosigner_config.wallet.auth_type = auth.to_string();
        let db = role_database(dir.path(), &format!("signature-{}", auth))?;
        cosigners.push(SignatureWallet::new(db, &cosigner_config)?);
    }
    Ok((roles_in(dir, config)?, cosigners))
}

fn roles_in(dir: TempDir, config: AppConfig) -> anyhow::Result<Roles> {
    let keygen = KeygenWallet::new(role_database(dir.path(), "keygen")?, &config)?;
    let signature = SignatureWallet::new(role_database(dir.path(), "signature")?, &config)?;
    let watch = WatchWallet::new(role_database(dir.path(), "watch")?, &config)?;
    Ok(Roles {
        dir,
        config,
        node: MockNode::new(),
        keygen,
        signature,
        watch,
    })
}

/// Seeds, the auth1 key, `count` keys each for client, deposit and
/// payment, deposit multisig registered by Keygen, and every address
/// imported into Watch
pub fn prepare_accounts(r: &mut Roles, count: u32) -> anyhow::Result<()> {
    prepare_accounts_with_cosigners(r, &mut [], count)
}

/// [`prepare_accounts`] where further authorization legs are held by
/// `cosigners`; their pubkeys reach Keygen before multisig registration
pub fn prepare_accounts_with_cosigners(
    r: &mut Roles,
    cosigners: &mut [SignatureWallet],
    count: u32,
) -> anyhow::Result<()> {
    r.keygen.store_seed(KEYGEN_SEED)?;
    r.signature.store_seed(SIGNATURE_SEED)?;
    r.signature.create_key()?;
    r.signature.import_privkey(&r.node)?;
    let auth_file = r.signature.export_auth_pubkey()?;
    r.keygen.import_auth_pubkeys(&auth_file)?;

    for (n, cosigner) in cosigners.iter_mut().enumerate() {
        cosigner.store_seed(&format!("{:02x}", 0x21 + n).repeat(32))?;
        cosigner.create_key()?;
        cosigner.import_privkey(&r.node)?;
        let auth_file = cosigner.export_auth_pubkey()?;
        r.keygen.import_auth_pubkeys(&auth_file)?;
    }

    for account in [AccountType::Client, AccountType::Deposit, AccountType::Payment] {
        r.keygen.create_keys(account, count)?;
        r.keygen.import_privkeys(&r.node, account)?;
    }
    r.keygen
        .export_pubkeys(AccountType::Deposit)?
        .context("deposit pubkeys not exported")?;
    r.keygen.create_multisig(&r.node, AccountType::Deposit)?;

    for account in [AccountType::Client, AccountType::Deposit, AccountType::Payment] {
        let file = r
            .keygen
            .export_addresses(account)?
            .with_context(|| format!("no {} addresses exported", account))?;
        r.watch.import_addresses(&r.node, &file)?;
    }
    Ok(())
}

/// Addresses Watch knows for `account`, in import order
pub fn watch_addresses(r: &Roles, account: AccountType) -> anyhow::Result<Vec<String>> {
    Ok(r.watch
        .database()
        .connection()
        .watch_addresses(COIN, account)?
        .into_iter()
        .map(|a| a.wallet_address)
        .collect())
}

/// External receiver addresses (never known to any wallet)
pub fn external_addresses(count: u32) -> anyhow::Result<Vec<String>> {
    let deriver = HdKeyDeriver::new(Network::Regtest);
    let seed = hex::decode(EXTERNAL_SEED)?;
    Ok(deriver
        .derive_range(&seed, AccountType::Client, 0, count)?
        .into_iter()
        .map(|k| k.bech32_address)
        .collect())
}

/// In-process node double
///
/// Transactions are real consensus-encoded transactions. "Signing" adds
/// the signer's compressed pubkey to the input witness; an input counts
/// as signed once enough distinct keys from its script are present.
pub struct MockNode {
    network: Network,
    utxos: RefCell<Vec<UnspentOutput>>,
    fee_rate: Cell<Option<u64>>,
    relay_fee: Cell<u64>,
    pubkeys: RefCell<HashMap<String, String>>,
    watched: RefCell<HashMap<String, String>>,
    confirmations: RefCell<HashMap<String, u64>>,
    failing_txids: RefCell<Vec<String>>,
    pub imported_wifs: RefCell<Vec<String>>,
    pub multisig_calls: RefCell<Vec<(usize, Vec<String>, String)>>,
    pub sent: RefCell<Vec<String>>,
    funding_counter: Cell<u32>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            network: Network::Regtest,
            utxos: RefCell::new(Vec::new()),
            fee_rate: Cell::new(Some(2_000)),
            relay_fee: Cell::new(1_000),
            pubkeys: RefCell::new(HashMap::new()),
            watched: RefCell::new(HashMap::new()),
            confirmations: RefCell::new(HashMap::new()),
            failing_txids: RefCell::new(Vec::new()),
            imported_wifs: RefCell::new(Vec::new()),
            multisig_calls: RefCell::new(Vec::new()),
            sent: RefCell::new(Vec::new()),
            funding_counter: Cell::new(0),
        }
    }

    pub fn set_fee_rate(&self, rate: Option<u64>) {
        self.fee_rate.set(rate);
    }

    /// Add a confirmed output paying `amount` satoshis to `address`
    pub fn fund(&self, address: &str, label: &str, amount: u64, confirmations: u64) -> String {
        let n = self.funding_counter.get() + 1;
        self.funding_counter.set(n);
        let txid = format!("{:064x}", 0xf00d_0000u64 + n as u64);
        let script = parse_address(address, self.network).script_pubkey();
        self.utxos.borrow_mut().push(UnspentOutput {
            txid: txid.clone(),
            vout: 0,
            address: address.to_string(),
            label: label.to_string(),
            script_pub_key: hex::encode(script.as_bytes()),
            redeem_script: None,
            amount,
            confirmations,
        });
        txid
    }

    pub fn set_confirmations(&self, txid: &str, confirmations: u64) {
        self.confirmations
            .borrow_mut()
            .insert(txid.to_string(), confirmations);
    }

    /// Make `get_transaction_confirmations` fail for `txid`
    pub fn fail_lookups_for(&self, txid: &str) {
        self.failing_txids.borrow_mut().push(txid.to_string());
    }

    pub fn watched_label(&self, address: &str) -> Option<String> {
        self.watched.borrow().get(address).cloned()
    }

    fn rpc_error(method: &str, message: impl ToString) -> RpcError {
        RpcError::CallFailed {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    fn decode(hex_tx: &str) -> RpcResult<Transaction> {
        let bytes = hex::decode(hex_tx).map_err(|e| Self::rpc_error("decode", e))?;
        bitcoin::consensus::deserialize(&bytes).map_err(|e| Self::rpc_error("decode", e))
    }
}

pub fn parse_address(address: &str, network: Network) -> Address {
    let unchecked: Address<NetworkUnchecked> = address
        .parse()
        .unwrap_or_else(|e| panic!("bad test address {}: {}", address, e));
    unchecked
        .require_network(network)
        .unwrap_or_else(|e| panic!("{} is not a {} address: {}", address, network, e))
}

fn single_key_scripts(key: &CompressedPublicKey, network: Network) -> Vec<ScriptBuf> {
    vec![
        Address::p2pkh(key.pubkey_hash(), network).script_pubkey(),
        Address::p2shwpkh(key, network).script_pubkey(),
        Address::p2wpkh(key, network).script_pubkey(),
    ]
}

/// Required signature count and keys of a bare multisig script
fn parse_multisig(script: &ScriptBuf) -> Option<(usize, Vec<Vec<u8>>)> {
    let mut required = None;
    let mut keys = Vec::new();
    for instruction in script.instructions() {
        match instruction.ok()? {
            Instruction::Op(op) if required.is_none() => {
                required = Some(op.to_u8().checked_sub(0x50)? as usize);
            }
            Instruction::PushBytes(bytes) if bytes.len() == 33 => {
                keys.push(bytes.as_bytes().to_vec())
            }
            _ => {}
        }
    }
    Some((required?, keys))
}

impl ChainNode for MockNode {
    fn chain(&self) -> RpcResult<String> {
        Ok("regtest".to_string())
    }

    fn list_unspent(&self, min_confirmations: u64) -> RpcResult<Vec<UnspentOutput>> {
        Ok(self
            .utxos
            .borrow()
            .iter()
            .filter(|u| u.confirmations >= min_confirmations)
            .cloned()
            .collect())
    }

    fn create_raw_transaction(
        &self,
        inputs: &[(String, u32)],
        outputs: &[(String, u64)],
    ) -> RpcResult<String> {
        let input = inputs
            .iter()
            .map(|(txid, vout)| {
                let txid = Txid::from_str(txid).map_err(|e| Self::rpc_error("createrawtransaction", e))?;
                Ok(TxIn {
                    previous_output: OutPoint::new(txid, *vout),
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                    witness: Witness::new(),
                })
            })
            .collect::<RpcResult<Vec<_>>>()?;
        let output = outputs
            .iter()
            .map(|(address, amount)| TxOut {
                value: Amount::from_sat(*amount),
                script_pubkey: parse_address(address, self.network).script_pubkey(),
            })
            .collect();
        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input,
            output,
        };
        Ok(bitcoin::consensus::encode::serialize_hex(&tx))
    }

    fn estimate_smart_fee(&self, _confirmation_target: u16) -> RpcResult<Option<u64>> {
        Ok(self.fee_rate.get())
    }

    fn relay_fee(&self) -> RpcResult<u64> {
        Ok(self.relay_fee.get())
    }

    fn sign_raw_transaction_with_key(
        &self,
        hex_tx: &str,
        wifs: &[String],
        prev_txs: &[PrevTx],
    ) -> RpcResult<SignedTx> {
        let secp = Secp256k1::new();
        let mut tx = Self::decode(hex_tx)?;
        let keys = wifs
            .iter()
            .map(|wif| {
                let private = PrivateKey::from_wif(wif)
                    .map_err(|e| Self::rpc_error("signrawtransactionwithkey", e))?;
                CompressedPublicKey::from_private_key(&secp, &private)
                    .map_err(|e| Self::rpc_error("signrawtransactionwithkey", e))
            })
            .collect::<RpcResult<Vec<_>>>()?;

        let mut complete = true;
        for (input, prev) in tx.input.iter_mut().zip(prev_txs) {
            let mut signers: Vec<Vec<u8>> = input.witness.iter().map(<[u8]>::to_vec).collect();

            let required = if prev.redeem_script.is_empty() {
                let script_pub_key = hex::decode(&prev.script_pub_key).unwrap_or_default();
                for key in &keys {
                    let matches = single_key_scripts(key, self.network)
                        .iter()
                        .any(|s| s.as_bytes() == script_pub_key.as_slice());
                    let bytes = key.to_bytes().to_vec();
                    if matches && !signers.contains(&bytes) {
                        signers.push(bytes);
                    }
                }
                1
            } else {
                let script = ScriptBuf::from_hex(&prev.redeem_script)
                    .map_err(|e| Self::rpc_error("signrawtransactionwithkey", e))?;
                let (required, script_keys) = parse_multisig(&script).ok_or_else(|| {
                    Self::rpc_error("signrawtransactionwithkey", "not a multisig script")
                })?;
                for key in &keys {
                    let bytes = key.to_bytes().to_vec();
                    if script_keys.contains(&bytes) && !signers.contains(&bytes) {
                        signers.push(bytes);
                    }
                }
                required
            };

            complete &= signers.len() >= required;
            input.witness = Witness::from_slice(&signers);
        }
        complete &= tx.input.len() == prev_txs.len();

        Ok(SignedTx {
            hex: bitcoin::consensus::encode::serialize_hex(&tx),
            complete,
        })
    }

    fn add_multisig_address(
        &self,
        required: usize,
        pubkeys: &[String],
        label: &str,
        address_type: AddrType,
    ) -> RpcResult<MultisigAddress> {
        let mut builder = Builder::new().push_int(required as i64);
        for pubkey in pubkeys {
            let key = PublicKey::from_str(pubkey)
                .map_err(|e| Self::rpc_error("addmultisigaddress", e))?;
            builder = builder.push_key(&key);
        }
        let script = builder
            .push_int(pubkeys.len() as i64)
            .push_opcode(OP_CHECKMULTISIG)
            .into_script();
        let address = match address_type {
            AddrType::Legacy => Address::p2sh(&script, self.network)
                .map_err(|e| Self::rpc_error("addmultisigaddress", e))?,
            AddrType::P2shSegwit => Address::p2shwsh(&script, self.network),
            AddrType::Bech32 => Address::p2wsh(&script, self.network),
        };
        self.multisig_calls
            .borrow_mut()
            .push((required, pubkeys.to_vec(), label.to_string()));
        Ok(MultisigAddress {
            address: address.to_string(),
            redeem_script: hex::encode(script.as_bytes()),
        })
    }

    fn send_raw_transaction(&self, hex_tx: &str) -> RpcResult<String> {
        let tx = Self::decode(hex_tx)?;
        if tx.input.iter().any(|i| i.witness.is_empty()) {
            return Err(Self::rpc_error("sendrawtransaction", "missing signatures"));
        }
        let txid = tx.compute_txid().to_string();
        self.sent.borrow_mut().push(txid.clone());
        Ok(txid)
    }

    fn import_priv_key(&self, wif: &str, _label: &str, _rescan: bool) -> RpcResult<()> {
        let secp = Secp256k1::new();
        let private =
            PrivateKey::from_wif(wif).map_err(|e| Self::rpc_error("importprivkey", e))?;
        let key = CompressedPublicKey::from_private_key(&secp, &private)
            .map_err(|e| Self::rpc_error("importprivkey", e))?;
        let mut pubkeys = self.pubkeys.borrow_mut();
        for script in single_key_scripts(&key, self.network) {
            if let Ok(address) = Address::from_script(&script, self.network) {
                pubkeys.insert(address.to_string(), key.to_string());
            }
        }
        self.imported_wifs.borrow_mut().push(wif.to_string());
        Ok(())
    }

    fn import_address(&self, address: &str, label: &str, _rescan: bool) -> RpcResult<()> {
        self.watched
            .borrow_mut()
            .insert(address.to_string(), label.to_string());
        Ok(())
    }

    fn get_address_info(&self, address: &str) -> RpcResult<AddressInfo> {
        let label = self.watched.borrow().get(address).cloned();
        Ok(AddressInfo {
            address: address.to_string(),
            pubkey: self.pubkeys.borrow().get(address).cloned(),
            is_watch_only: label.is_some(),
            labels: label.into_iter().collect(),
        })
    }

    fn get_transaction_confirmations(&self, txid: &str) -> RpcResult<u64> {
        if self.failing_txids.borrow().iter().any(|t| t == txid) {
            return Err(RpcError::TransactionNotFound {
                txid: txid.to_string(),
            });
        }
        Ok(self.confirmations.borrow().get(txid).copied().unwrap_or(0))
    }
}
