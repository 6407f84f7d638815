//! Execution policy - Concurrency, timeouts, retries and abort threshold.

use std::time::Duration;

/// Knobs the executor runs a migration plan with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionPolicy {
    /// Steps in flight at once.
    pub max_concurrency: usize,
    /// Budget for one attempt of one step.
    pub step_timeout: Duration,
    /// Extra attempts after the first for retryable failures.
    pub max_step_retries: u32,
    /// Abort once `failed / total` rises above this fraction.
    pub failure_rate_threshold: f64,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            step_timeout: Duration::from_millis(5_000),
            max_step_retries: 2,
            failure_rate_threshold: 0.2,
        }
    }
}

impl ExecutionPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_step_retries + 1
    }

    /// True once failures make the run unrecoverable.
    pub fn failure_rate_exceeded(&self, failed: usize, total: usize) -> bool {
        total > 0 && (failed as f64 / total as f64) > self.failure_rate_threshold
    }
}
