//! Retry logic utilities for RPC operations
//!
//! Only idempotent node calls go through [`retry_with_backoff`]; anything
//! that mutates node or wallet state is called exactly once.

use crate::config::BitcoinRpcConfig;
use crate::errors::{RpcError, RpcResult};
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Calculate next backoff duration using exponential backoff with a maximum cap
///
/// `new_backoff = min(current_backoff * multiplier, max_backoff)`
///
/// # Example
/// ```
/// use std::time::Duration;
/// use airgap_wallet::rpc::calculate_next_backoff;
///
/// let backoff = Duration::from_millis(100);
/// let next = calculate_next_backoff(backoff, 2.0, 30);
/// assert_eq!(next, Duration::from_millis(200));
/// ```
pub fn calculate_next_backoff(
    current_backoff: Duration,
    multiplier: f64,
    max_backoff_seconds: u64,
) -> Duration {
    Duration::from_millis((current_backoff.as_millis() as f64 * multiplier) as u64)
        .min(Duration::from_secs(max_backoff_seconds))
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `max_retries` attempts are used up
pub fn retry_with_backoff<T, F>(
    config: &BitcoinRpcConfig,
    method: &str,
    mut operation: F,
) -> RpcResult<T>
where
    F: FnMut() -> RpcResult<T>,
{
    let max_attempts = config.max_retries.max(1);
    let mut attempts = 0;
    let mut backoff = Duration::from_millis(config.initial_backoff_ms);

    loop {
        match operation() {
            Ok(value) => {
                if attempts > 0 {
                    debug!("{} succeeded after {} attempts", method, attempts + 1);
                }
                return Ok(value);
            }
            Err(e) if !is_retryable(&e) => return Err(e),
            Err(e) => {
                attempts += 1;
                if attempts >= max_attempts {
                    error!("{} failed after {} attempts: {}", method, attempts, e);
                    return Err(RpcError::MaxRetriesExceeded {
                        operation: method.to_string(),
                    });
                }
                warn!(
                    "RPC attempt {} failed for {}, retrying in {:?}: {}",
                    attempts, method, backoff, e
                );
                sleep(backoff);
                backoff = calculate_next_backoff(
                    backoff,
                    config.backoff_multiplier,
                    config.max_backoff_seconds,
                );
            }
        }
    }
}

/// Lookups that the node answered with "not found" or that returned
/// unparseable data will not improve on retry
fn is_retryable(err: &RpcError) -> bool {
    !matches!(
        err,
        RpcError::TransactionNotFound { .. }
            | RpcError::DeserialisationFailed(_)
            | RpcError::InvalidResponse(_)
    )
}
