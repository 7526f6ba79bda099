use crate::config::FeeConfig;
use crate::errors::AppResult;
use crate::rpc::ChainNode;
use tracing::{debug, warn};

/// Fee estimation with an operator-supplied adjustment
///
/// `fee = ceil(estimate * m)` where `m` is clamped into
/// `[adjustment_min, adjustment_max]` and `estimate` is the node's smart fee
/// rate (never below its relay rate) applied to the transaction vsize.
#[derive(Debug, Clone)]
pub struct FeeCalculator {
    adjustment_min: f64,
    adjustment_max: f64,
    confirmation_target: u16,
}

impl FeeCalculator {
    pub fn new(config: &FeeConfig) -> Self {
        Self {
            adjustment_min: config.adjustment_min,
            adjustment_max: config.adjustment_max,
            confirmation_target: config.confirmation_target,
        }
    }

    pub fn clamp_multiplier(&self, multiplier: f64) -> f64 {
        if !multiplier.is_finite() {
            return 1.0_f64.clamp(self.adjustment_min, self.adjustment_max);
        }
        let clamped = multiplier.clamp(self.adjustment_min, self.adjustment_max);
        if clamped != multiplier {
            warn!(
                "Fee adjustment {} outside [{}, {}], using {}",
                multiplier, self.adjustment_min, self.adjustment_max, clamped
            );
        }
        clamped
    }

    /// Unadjusted fee in satoshis for `vsize` virtual bytes
    pub fn estimate(&self, node: &dyn ChainNode, vsize: usize) -> AppResult<u64> {
        let relay = node.relay_fee()?;
        let rate = match node.estimate_smart_fee(self.confirmation_target)? {
            Some(rate) => rate.max(relay),
            None => {
                warn!("Node has no fee estimate, falling back to relay fee");
                relay
            }
        };
        let fee = (rate * vsize as u64).div_ceil(1000);
        debug!("Fee estimate: {} sat/kvB x {} vB = {} sat", rate, vsize, fee);
        Ok(fee)
    }

    pub fn adjust(&self, estimate: u64, multiplier: f64) -> u64 {
        (estimate as f64 * self.clamp_multiplier(multiplier)).ceil() as u64
    }

    pub fn calculate(&self, node: &dyn ChainNode, vsize: usize, multiplier: f64) -> AppResult<u64> {
        Ok(self.adjust(self.estimate(node, vsize)?, multiplier))
    }
}
