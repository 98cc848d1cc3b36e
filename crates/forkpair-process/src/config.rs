use std::ops::Range;
use std::time::Duration;

use crate::error::{OrchestratorError, Result};

/// Values each producer sends (K).
pub const DEFAULT_VALUES_PER_PAIR: usize = 5;

/// Pause after each producer send.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(100);

/// Upper bound on the pair count accepted by the multi-pair run.
pub const DEFAULT_MAX_PAIRS: usize = 10;

/// Tunables shared by the single-pair and multi-pair runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairConfig {
    /// Number of consecutive integers each producer sends.
    pub values_per_pair: usize,
    /// Delay the producer sleeps after each send.
    pub send_delay: Duration,
    /// Largest pair count `run_multiple_pairs` accepts.
    pub max_pairs: usize,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            values_per_pair: DEFAULT_VALUES_PER_PAIR,
            send_delay: DEFAULT_SEND_DELAY,
            max_pairs: DEFAULT_MAX_PAIRS,
        }
    }
}

impl PairConfig {
    pub fn with_values_per_pair(mut self, values_per_pair: usize) -> Self {
        self.values_per_pair = values_per_pair;
        self
    }

    pub fn with_send_delay(mut self, send_delay: Duration) -> Self {
        self.send_delay = send_delay;
        self
    }

    pub fn with_max_pairs(mut self, max_pairs: usize) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    /// Reject configurations no run can use.
    pub fn validate(&self) -> Result<()> {
        if self.values_per_pair == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "values per pair must be at least 1".to_string(),
            ));
        }
        if self.max_pairs == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "max pairs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check a requested pair count against `1..=max_pairs`.
    pub fn validate_pair_count(&self, pairs: usize) -> Result<()> {
        if pairs == 0 || pairs > self.max_pairs {
            return Err(OrchestratorError::InvalidPairCount {
                requested: pairs,
                max: self.max_pairs,
            });
        }
        Ok(())
    }

    /// The half-open integer range for the pair at zero-based `index`.
    ///
    /// Pair `i` covers `[i*K + 1, i*K + K]`, so ranges never overlap.
    pub fn range_for(&self, index: usize) -> Result<Range<i32>> {
        let overflow = || OrchestratorError::RangeOverflow {
            pair: u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1)),
        };

        let k = i32::try_from(self.values_per_pair).map_err(|_| overflow())?;
        let i = i32::try_from(index).map_err(|_| overflow())?;
        let start = i
            .checked_mul(k)
            .and_then(|base| base.checked_add(1))
            .ok_or_else(overflow)?;
        let end = start.checked_add(k).ok_or_else(overflow)?;
        Ok(start..end)
    }
}
