//! Address lifecycle engine
//!
//! `advance` is the only code path that changes `addr_status`, and
//! `select_by_status` is how every downstream stage finds its work.

use crate::database::traits::KeyRecordOperations;
use crate::database::update_key_status;
use crate::errors::{AppError, AppResult};
use crate::types::{AccountPolicy, AccountType, AddrStatus, KeyRecord};
use rusqlite::Connection;
use tracing::debug;

pub struct AddressLifecycle {
    coin: String,
    policy: AccountPolicy,
}

impl AddressLifecycle {
    pub fn new(coin: &str, policy: AccountPolicy) -> Self {
        Self {
            coin: coin.to_string(),
            policy,
        }
    }

    pub fn coin(&self) -> &str {
        &self.coin
    }

    pub fn policy(&self) -> &AccountPolicy {
        &self.policy
    }

    pub fn is_multisig(&self, account: AccountType) -> bool {
        self.policy.is_multisig(account)
    }

    /// Move `record` to `target` if that is its single legal next status
    ///
    /// Pass the open transaction as `conn` when the status change must
    /// commit together with other writes.
    pub fn advance(
        &self,
        conn: &Connection,
        record: &KeyRecord,
        target: AddrStatus,
    ) -> AppResult<()> {
        let transition_error = |from: AddrStatus| AppError::InvalidTransition {
            account: record.account.to_string(),
            index: record.index,
            from: from.to_string(),
            to: target.to_string(),
        };

        if !record
            .status
            .can_advance(target, self.is_multisig(record.account))
        {
            return Err(transition_error(record.status));
        }

        // The row may have moved on since `record` was read
        if !update_key_status(conn, record.id, record.status, target)? {
            return Err(transition_error(record.status));
        }

        debug!(
            "{} index {}: {} -> {}",
            record.account, record.index, record.status, target
        );
        Ok(())
    }

    pub fn select_by_status(
        &self,
        conn: &Connection,
        account: AccountType,
        status: AddrStatus,
    ) -> AppResult<Vec<KeyRecord>> {
        conn.key_records_by_status(&self.coin, account, status)
    }
}
