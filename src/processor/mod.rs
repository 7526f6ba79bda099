//! Wallet engine components
//!
//! Cold roles: key generation, private key import, pubkey and multisig
//! exchange, address export, signing. Watch: address import, transaction
//! creation, broadcast, confirmation tracking.

pub mod address_exchange;
pub mod base;
pub mod fee;
pub mod key_generator;
pub mod lifecycle;
pub mod multisig;
pub mod payment_request;
pub mod privkey_importer;
pub mod pubkey_exchange;
pub mod signer;
pub mod tx_creator;
pub mod tx_monitor;
pub mod tx_sender;

pub use address_exchange::{export_addresses, AddressImporter};
pub use base::BatchStats;
pub use fee::FeeCalculator;
pub use key_generator::KeyGenerator;
pub use lifecycle::AddressLifecycle;
pub use multisig::{multisig_label, MultisigRegistrar};
pub use payment_request::PaymentRequestQueue;
pub use privkey_importer::PrivKeyImporter;
pub use pubkey_exchange::PubkeyExchange;
pub use signer::{AccountKeyResolver, AuthKeyResolver, SignOutcome, Signer, SigningKeyResolver};
pub use tx_creator::{CreateOutcome, CreatedTx, TxCreator};
pub use tx_monitor::TxMonitor;
pub use tx_sender::{SentTx, TxSender};
