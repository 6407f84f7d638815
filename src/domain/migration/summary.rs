//! Execution summary reported after a migration run.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::SubscriptionId;

/// How a migration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    Completed,
    /// Completed, but some steps were skipped, failed, or need review.
    CompletedWithWarnings,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedStep {
    pub subscription_id: SubscriptionId,
    pub reason: String,
    pub attempts: u32,
}

/// Outcome and warning lists of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub outcome: MigrationOutcome,
    pub migrated: Vec<SubscriptionId>,
    pub stale_skips: Vec<SubscriptionId>,
    pub manual_review_required: Vec<SubscriptionId>,
    pub failed_steps: Vec<FailedStep>,
    pub not_attempted: Vec<SubscriptionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}
