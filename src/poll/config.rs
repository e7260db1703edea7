//! Polling cadence and overall deadline.
//!
//! # Polling Strategy
//!
//! - **First pass**: immediately on entry
//! - **Poll interval**: 10 seconds between passes by default
//! - **Timeout**: 10 minutes from entry, after which the gate gives up

use std::time::Duration;

use super::runner::PollError;

/// Default time between evaluation passes (10 seconds).
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Default overall deadline (10 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Configuration for the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Interval between passes. Must be non-zero.
    pub interval: Duration,

    /// Wall-clock budget for the whole loop, including retry backoff inside
    /// passes.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    /// Creates a new `PollConfig` with default values.
    pub fn new() -> Self {
        PollConfig {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the configuration before the loop starts.
    pub fn validate(&self) -> Result<(), PollError> {
        if self.interval.is_zero() {
            return Err(PollError::InvalidInterval);
        }
        Ok(())
    }

    /// Upper bound on the number of passes before the deadline, counting the
    /// immediate first pass.
    pub fn max_passes(&self) -> u64 {
        if self.interval.is_zero() {
            return 0;
        }
        let ticks = self.timeout.as_nanos().div_ceil(self.interval.as_nanos());
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}
