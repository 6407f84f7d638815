//! Migration executor configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::migration::ExecutionPolicy;

/// Knobs for migration execution.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MigrationConfig {
    /// Subscriptions migrated concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Budget for one attempt of one step, in milliseconds
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,

    /// Retries after the first attempt for a failed step
    #[serde(default = "default_max_step_retries")]
    pub max_step_retries: u32,

    /// Abort and roll back once this fraction of steps has failed
    #[serde(default = "default_failure_rate_threshold")]
    pub failure_rate_threshold: f64,
}

impl MigrationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrency == 0 || self.max_concurrency > 64 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.step_timeout_ms == 0 || self.step_timeout_ms > 300_000 {
            return Err(ValidationError::InvalidStepTimeout);
        }
        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 1.0) {
            return Err(ValidationError::InvalidFailureThreshold);
        }
        Ok(())
    }

    pub fn policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            max_concurrency: self.max_concurrency,
            step_timeout: Duration::from_millis(self.step_timeout_ms),
            max_step_retries: self.max_step_retries,
            failure_rate_threshold: self.failure_rate_threshold,
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            step_timeout_ms: default_step_timeout_ms(),
            max_step_retries: default_max_step_retries(),
            failure_rate_threshold: default_failure_rate_threshold(),
        }
    }
}

fn default_max_concurrency() -> usize {
    4
}

fn default_step_timeout_ms() -> u64 {
    5_000
}

fn default_max_step_retries() -> u32 {
    2
}

fn default_failure_rate_threshold() -> f64 {
    0.2
}
