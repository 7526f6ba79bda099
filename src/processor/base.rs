use std::fmt;
use tracing::info;

/// Outcome counters for a per-record batch
///
/// `failed` counts records skipped because of an external error; their
/// status is unchanged and a later run picks them up again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    pub fn log_summary(&self, operation: &str) {
        info!("=== {} complete ===", operation);
        info!("  {}", self);
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed: {} | skipped: {} | failed: {}",
            self.processed, self.skipped, self.failed
        )
    }
}
