use thiserror::Error;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operations
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Bitcoin node RPC operations
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// File I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV handoff files
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation/parsing
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Rejected request: wrong account, wrong role, bad arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// Address status transition that is not the single legal next step
    #[error("Invalid status transition for {account} index {index}: {from} -> {to}")]
    InvalidTransition {
        account: String,
        index: u32,
        from: String,
        to: String,
    },

    /// Seed shorter or longer than the supported entropy range
    #[error("Malformed seed: {len} bytes (expected 16..=32)")]
    MalformedSeed { len: usize },

    /// Derived or stored key belongs to a different chain than configured
    #[error("Network mismatch: configured {expected}, found {found}")]
    NetworkMismatch { expected: String, found: String },

    /// HD derivation failure
    #[error("Key derivation error: {0}")]
    KeyDerivation(#[from] bitcoin::bip32::Error),

    /// Previously stored key material can no longer be decoded
    #[error("Corrupt key material: {0}")]
    CorruptKey(String),

    /// Not enough funds to cover the requested amount or the fee
    #[error("Amount error: {0}")]
    Amount(String),

    /// Handoff file name or body does not match what the caller expects
    #[error("Invalid handoff file {file}: {reason}")]
    InvalidHandoffFile { file: String, reason: String },

    /// Base64 decoding
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl AppError {
    /// Errors that indicate a defect in previously trusted data.
    ///
    /// Batch loops must abort on these instead of skipping the record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::CorruptKey(_) | AppError::NetworkMismatch { .. }
        )
    }
}

/// RPC error types
#[derive(Error, Debug)]
pub enum RpcError {
    /// Failed to establish connection to the node RPC server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// RPC method call failed (covers network errors, authentication, node rejections)
    #[error("RPC call failed: {method} - {message}")]
    CallFailed { method: String, message: String },

    /// Failed to deserialise RPC response data
    #[error("Deserialisation failed: {0}")]
    DeserialisationFailed(String),

    /// Retry limit exceeded for RPC operation
    #[error("Max retries exceeded: {operation}")]
    MaxRetriesExceeded { operation: String },

    /// RPC returned unexpected or malformed response data
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Transaction not found in wallet, blockchain or mempool
    #[error("Transaction not found: {txid}")]
    TransactionNotFound { txid: String },
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidData(format!("JSON error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<glob::PatternError> for AppError {
    fn from(err: glob::PatternError) -> Self {
        AppError::Config(format!("Glob pattern error: {}", err))
    }
}

impl From<glob::GlobError> for AppError {
    fn from(err: glob::GlobError) -> Self {
        AppError::Io(err.into_error())
    }
}
