use super::account::AccountType;
use crate::errors::{AppError, AppResult};
use std::fmt;
use std::str::FromStr;

/// Envelope status; also the `txType` segment of handoff file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxType {
    Unsigned = 1,
    Signed = 2,
    Sent = 3,
    Done = 4,
    Notified = 5,
    Canceled = 6,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Unsigned => "unsigned",
            TxType::Signed => "signed",
            TxType::Sent => "sent",
            TxType::Done => "done",
            TxType::Notified => "notified",
            TxType::Canceled => "canceled",
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(value: i64) -> AppResult<Self> {
        match value {
            1 => Ok(TxType::Unsigned),
            2 => Ok(TxType::Signed),
            3 => Ok(TxType::Sent),
            4 => Ok(TxType::Done),
            5 => Ok(TxType::Notified),
            6 => Ok(TxType::Canceled),
            other => Err(AppError::InvalidData(format!("unknown tx type: {}", other))),
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsigned" => Ok(TxType::Unsigned),
            "signed" => Ok(TxType::Signed),
            "sent" => Ok(TxType::Sent),
            "done" => Ok(TxType::Done),
            "notified" => Ok(TxType::Notified),
            "canceled" | "cancelled" => Ok(TxType::Canceled),
            other => Err(AppError::InvalidData(format!("unknown tx type: {}", other))),
        }
    }
}

/// What a transaction is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Sweep client addresses into the deposit account
    Deposit,
    /// Pay out queued payment requests
    Payment,
    /// Move funds between internal accounts
    Transfer,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Deposit => "deposit",
            ActionType::Payment => "payment",
            ActionType::Transfer => "transfer",
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            ActionType::Deposit => 1,
            ActionType::Payment => 2,
            ActionType::Transfer => 3,
        }
    }

    pub fn from_i64(value: i64) -> AppResult<Self> {
        match value {
            1 => Ok(ActionType::Deposit),
            2 => Ok(ActionType::Payment),
            3 => Ok(ActionType::Transfer),
            other => Err(AppError::InvalidData(format!("unknown action: {}", other))),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" | "receipt" => Ok(ActionType::Deposit),
            "payment" => Ok(ActionType::Payment),
            "transfer" => Ok(ActionType::Transfer),
            other => Err(AppError::InvalidData(format!("unknown action: {}", other))),
        }
    }
}

/// Transaction envelope tracked by Watch (amounts in satoshis)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEnvelope {
    pub id: i64,
    pub coin: String,
    pub action: ActionType,
    pub unsigned_hex: String,
    pub signed_hex: Option<String>,
    pub sent_hash: Option<String>,
    pub total_input: u64,
    pub total_output: u64,
    pub fee: u64,
    pub tx_type: TxType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInputRecord {
    pub input_txid: String,
    pub input_vout: u32,
    pub input_address: String,
    pub input_account: AccountType,
    pub input_amount: u64,
    pub input_confirmations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutputRecord {
    pub output_address: String,
    pub output_account: AccountType,
    pub output_amount: u64,
    pub is_change: bool,
}

/// Queued payout; linked to an envelope once a payment tx consumes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub id: i64,
    pub coin: String,
    pub payment_id: Option<i64>,
    pub sender_address: String,
    pub sender_account: AccountType,
    pub receiver_address: String,
    pub amount: u64,
    pub is_done: bool,
}

/// Address imported into the online node as watch-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchAddress {
    pub id: i64,
    pub coin: String,
    pub account: AccountType,
    pub wallet_address: String,
    pub is_allocated: bool,
}
