//! Repository traits, implemented for [`rusqlite::Connection`]
//!
//! Implementing on the connection rather than on [`Database`](super::Database)
//! lets callers run any of these inside an open transaction (a
//! `rusqlite::Transaction` derefs to `Connection`) and commit once.

use crate::errors::AppResult;
use crate::types::{
    AccountType, AddrStatus, AuthPubkey, DerivedKey, KeyRecord, MultisigHandoff, PaymentRequest,
    TxEnvelope, TxInputRecord, TxOutputRecord, TxType, WatchAddress,
};

/// Master seed storage (cold roles)
pub trait SeedOperations {
    fn get_seed(&self, coin: &str) -> AppResult<Option<Vec<u8>>>;

    /// Store the seed for `coin`; fails if one already exists
    fn insert_seed(&self, coin: &str, seed: &[u8]) -> AppResult<()>;
}

/// Derived key records (cold roles)
///
/// Status changes are deliberately absent: they go through
/// [`AddressLifecycle`](crate::processor::lifecycle::AddressLifecycle).
pub trait KeyRecordOperations {
    fn insert_derived_keys(&self, coin: &str, keys: &[DerivedKey]) -> AppResult<usize>;

    fn max_key_index(&self, coin: &str, account: AccountType) -> AppResult<Option<u32>>;

    fn key_records(&self, coin: &str, account: AccountType) -> AppResult<Vec<KeyRecord>>;

    fn key_records_by_status(
        &self,
        coin: &str,
        account: AccountType,
        status: AddrStatus,
    ) -> AppResult<Vec<KeyRecord>>;

    /// Records whose multisig address is one of `addresses`
    fn key_records_by_multisig_address(
        &self,
        coin: &str,
        addresses: &[String],
    ) -> AppResult<Vec<KeyRecord>>;

    /// Records owning one of `addresses` as a single-key address
    fn key_records_by_address(&self, coin: &str, addresses: &[String])
        -> AppResult<Vec<KeyRecord>>;

    fn key_record_by_pubkey(
        &self,
        coin: &str,
        account: AccountType,
        full_public_key: &str,
    ) -> AppResult<Option<KeyRecord>>;

    fn set_multisig_address(
        &self,
        id: i64,
        multisig_address: &str,
        redeem_script: &str,
    ) -> AppResult<()>;
}

/// Authorization public keys known to a cold wallet
pub trait AuthPubkeyOperations {
    /// Insert, or accept a re-import of the identical key
    fn insert_auth_pubkey(&self, pubkey: &AuthPubkey) -> AppResult<bool>;

    fn auth_pubkey(&self, coin: &str, auth_account: AccountType) -> AppResult<Option<AuthPubkey>>;

    fn auth_pubkeys(&self, coin: &str) -> AppResult<Vec<AuthPubkey>>;
}

/// Multisig handoff records shared between Keygen and Signature
pub trait MultisigHandoffOperations {
    /// Returns false when the (account, pubkey) pair is already present
    fn insert_multisig_handoff(&self, handoff: &MultisigHandoff) -> AppResult<bool>;

    fn unresolved_multisig_handoffs(&self, coin: &str) -> AppResult<Vec<MultisigHandoff>>;

    fn unexported_multisig_handoffs(&self, coin: &str) -> AppResult<Vec<MultisigHandoff>>;

    fn resolve_multisig_handoff(
        &self,
        id: i64,
        multisig_address: &str,
        redeem_script: &str,
    ) -> AppResult<()>;

    fn mark_handoffs_exported(&self, ids: &[i64]) -> AppResult<usize>;
}

/// Addresses imported into the online node
pub trait WatchAddressOperations {
    fn insert_watch_address(
        &self,
        coin: &str,
        account: AccountType,
        address: &str,
    ) -> AppResult<bool>;

    fn watch_addresses(&self, coin: &str, account: AccountType) -> AppResult<Vec<WatchAddress>>;

    /// Oldest address of `account` not yet handed out as a receiver
    fn unallocated_watch_address(
        &self,
        coin: &str,
        account: AccountType,
    ) -> AppResult<Option<WatchAddress>>;

    fn mark_address_allocated(&self, coin: &str, address: &str) -> AppResult<bool>;
}

/// Transaction envelopes and their inputs/outputs
pub trait TxOperations {
    fn tx_id_by_unsigned_hex(&self, unsigned_hex: &str) -> AppResult<Option<i64>>;

    /// Insert envelope and children; the caller supplies the transaction
    fn insert_tx(
        &self,
        envelope: &TxEnvelope,
        inputs: &[TxInputRecord],
        outputs: &[TxOutputRecord],
    ) -> AppResult<i64>;

    fn tx_by_id(&self, id: i64) -> AppResult<Option<TxEnvelope>>;

    fn tx_inputs(&self, tx_id: i64) -> AppResult<Vec<TxInputRecord>>;

    fn tx_outputs(&self, tx_id: i64) -> AppResult<Vec<TxOutputRecord>>;

    fn txs_by_type(&self, coin: &str, tx_type: TxType) -> AppResult<Vec<TxEnvelope>>;

    /// Record broadcast: signed hex, hash and `sent` status in one update
    fn update_tx_sent(&self, id: i64, signed_hex: &str, sent_hash: &str) -> AppResult<()>;

    /// Compare-and-set on `tx_type`; false when the row was not in `from`
    fn update_tx_type(&self, id: i64, from: TxType, to: TxType) -> AppResult<bool>;
}

/// Queued payouts consumed by payment transactions
pub trait PaymentRequestOperations {
    fn insert_payment_request(
        &self,
        coin: &str,
        sender_address: &str,
        sender_account: AccountType,
        receiver_address: &str,
        amount: u64,
    ) -> AppResult<i64>;

    /// Requests not yet attached to a payment transaction
    fn open_payment_requests(&self, coin: &str) -> AppResult<Vec<PaymentRequest>>;

    fn link_payment_requests(&self, ids: &[i64], payment_id: i64) -> AppResult<usize>;

    fn payment_requests_for_tx(&self, payment_id: i64) -> AppResult<Vec<PaymentRequest>>;

    fn complete_payment_requests(&self, payment_id: i64) -> AppResult<usize>;
}
