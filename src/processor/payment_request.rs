//! Payment request queue (Watch)
//!
//! A request records a client's withdrawal: the client address it is
//! attributed to, an external receiver and an amount. `create-payment`
//! consumes every open request.

use crate::crypto::HdKeyDeriver;
use crate::database::traits::{PaymentRequestOperations, WatchAddressOperations};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::types::AccountType;
use tracing::info;

pub struct PaymentRequestQueue<'a> {
    coin: &'a str,
    deriver: &'a HdKeyDeriver,
}

impl<'a> PaymentRequestQueue<'a> {
    pub fn new(coin: &'a str, deriver: &'a HdKeyDeriver) -> Self {
        Self { coin, deriver }
    }

    /// Queue a payment of `amount` satoshis to `receiver_address`
    ///
    /// Without `sender_address` the request is attributed to the first
    /// client address known to Watch.
    pub fn add(
        &self,
        db: &Database,
        sender_address: Option<&str>,
        receiver_address: &str,
        amount: u64,
    ) -> AppResult<i64> {
        if amount == 0 {
            return Err(AppError::Validation("payment amount must be positive".to_string()));
        }
        self.deriver.check_address(receiver_address)?;

        let conn = db.connection();
        let sender_address = match sender_address {
            Some(address) => {
                self.deriver.check_address(address)?;
                address.to_string()
            }
            None => conn
                .watch_addresses(self.coin, AccountType::Client)?
                .into_iter()
                .next()
                .map(|a| a.wallet_address)
                .ok_or_else(|| {
                    AppError::Validation("no client address to attribute the request to".to_string())
                })?,
        };

        let id = conn.insert_payment_request(
            self.coin,
            &sender_address,
            AccountType::Client,
            receiver_address,
            amount,
        )?;
        info!(
            "Queued payment request {}: {} sat to {}",
            id, amount, receiver_address
        );
        Ok(id)
    }
}
