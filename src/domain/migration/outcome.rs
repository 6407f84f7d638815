//! Per-subscription step outcomes.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, Timestamp};
use crate::domain::subscription::AssignmentSnapshot;

/// What happened to one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Repriced and reassigned.
    Migrated,
    /// Changed outside the engine since the plan was built; left untouched.
    StaleSkip,
    /// Retries exhausted.
    Failed,
    /// Never dispatched because the run was aborted or cancelled.
    NotAttempted,
    /// Migrated, then put back by a rollback.
    Restored,
    /// Migrated, but changed again before rollback reached it.
    RestoreSkipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub status: StepStatus,
    pub target_plan_id: PlanId,
    /// Assignment the executor wrote; rollback compares against it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub written: Option<AssignmentSnapshot>,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub recorded_at: Timestamp,
}

impl StepOutcome {
    pub fn migrated(target_plan_id: PlanId, written: AssignmentSnapshot, attempts: u32) -> Self {
        Self {
            status: StepStatus::Migrated,
            target_plan_id,
            written: Some(written),
            attempts,
            detail: None,
            recorded_at: Timestamp::now(),
        }
    }

    pub fn stale_skip(target_plan_id: PlanId, reason: impl Into<String>, attempts: u32) -> Self {
        Self::unapplied(StepStatus::StaleSkip, target_plan_id, reason, attempts)
    }

    pub fn failed(target_plan_id: PlanId, reason: impl Into<String>, attempts: u32) -> Self {
        Self::unapplied(StepStatus::Failed, target_plan_id, reason, attempts)
    }

    pub fn not_attempted(target_plan_id: PlanId, reason: impl Into<String>) -> Self {
        Self::unapplied(StepStatus::NotAttempted, target_plan_id, reason, 0)
    }

    fn unapplied(
        status: StepStatus,
        target_plan_id: PlanId,
        reason: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            status,
            target_plan_id,
            written: None,
            attempts,
            detail: Some(reason.into()),
            recorded_at: Timestamp::now(),
        }
    }

    pub fn is_migrated(&self) -> bool {
        self.status == StepStatus::Migrated
    }

    pub fn mark_restored(&mut self) {
        self.status = StepStatus::Restored;
        self.recorded_at = Timestamp::now();
    }

    pub fn mark_restore_skipped(&mut self, reason: impl Into<String>) {
        self.status = StepStatus::RestoreSkipped;
        self.detail = Some(reason.into());
        self.recorded_at = Timestamp::now();
    }
}
