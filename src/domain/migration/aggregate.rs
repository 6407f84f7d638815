//! MigrationPlan aggregate.
//!
//! # Design Decisions
//!
//! - **Frozen on approval**: assignments change only in `draft`
//! - **Outcome per subscription**: every step result is recorded on the
//!   plan, so rollback and reporting need no other source
//! - **Pre-migration snapshot**: captured at build time for every
//!   subscription the plan may touch and re-checked before each write

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::errors::PlanChangeError;
use crate::domain::foundation::{
    ActorId, ImpactReportId, MigrationPlanId, PlanId, StateMachine, SubscriptionId, Timestamp,
    WorkspaceId,
};
use crate::domain::impact::{ChangeType, ProposedChange};
use crate::domain::plan::Plan;
use crate::domain::subscription::AssignmentSnapshot;

use super::{ExecutionSummary, FailedStep, MigrationOutcome, MigrationStatus, StepOutcome, StepStatus};

/// Something that must be resolved before a plan can be approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<SubscriptionId>,
    pub message: String,
}

/// A subscription's state when the plan was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreMigrationEntry {
    pub workspace_id: WorkspaceId,
    #[serde(flatten)]
    pub assignment: AssignmentSnapshot,
}

/// Per-subscription reassignment plan for one plan change.
///
/// # Invariants
///
/// - every key of `target_assignments` and of `requires_manual_migration`
///   has a `pre_migration_snapshot` entry
/// - a subscription is either assigned or requires manual migration, never both
/// - `target_assignments` never changes outside `draft`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub id: MigrationPlanId,
    pub source_plan_id: PlanId,
    pub source_version: u32,
    pub impact_report_id: ImpactReportId,
    pub change: ProposedChange,
    pub target_assignments: BTreeMap<SubscriptionId, PlanId>,
    pub requires_manual_migration: BTreeSet<SubscriptionId>,
    pub blocking_issues: Vec<BlockingIssue>,
    pub pre_migration_snapshot: BTreeMap<SubscriptionId, PreMigrationEntry>,
    /// Reported as affected but no longer active on the source plan at build time.
    #[serde(default)]
    pub excluded_subscriptions: Vec<SubscriptionId>,
    pub status: MigrationStatus,
    #[serde(default)]
    pub outcomes: BTreeMap<SubscriptionId, StepOutcome>,
    /// Plan version the execution committed.
    pub applied_version: Option<u32>,
    pub failure_reason: Option<String>,
    pub created_by: ActorId,
    pub created_at: Timestamp,
    pub approved_by: Option<ActorId>,
    pub approved_at: Option<Timestamp>,
    pub executed_at: Option<Timestamp>,
    pub rolled_back_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl MigrationPlan {
    pub fn change_type(&self) -> ChangeType {
        self.change.change_type()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Checks `target` may receive subscriptions from this plan.
    ///
    /// # Errors
    ///
    /// `Validation` if the target is inactive, or is the plan being disabled.
    pub fn check_candidate(&self, target: &Plan) -> Result<(), PlanChangeError> {
        if !target.is_active() {
            return Err(PlanChangeError::validation(
                "candidates",
                format!("plan {} is {} and cannot receive subscriptions", target.id, target.config.status),
            ));
        }
        if target.id == self.source_plan_id && self.change_type() == ChangeType::PlanDisable {
            return Err(PlanChangeError::validation(
                "candidates",
                "the plan being disabled cannot be a migration target",
            ));
        }
        Ok(())
    }

    /// Assigns a subscription to `target` by hand, resolving its manual-review flag.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the plan is no longer a draft
    /// - `Validation` if the subscription is not part of the plan or the target is unusable
    pub fn assign_manually(
        &mut self,
        subscription_id: SubscriptionId,
        target: &Plan,
    ) -> Result<(), PlanChangeError> {
        if self.status != MigrationStatus::Draft {
            return Err(PlanChangeError::invalid_state(self.status.as_str(), "reassign"));
        }
        if !self.pre_migration_snapshot.contains_key(&subscription_id) {
            return Err(PlanChangeError::validation(
                "subscription_id",
                format!("subscription {} is not part of this migration plan", subscription_id),
            ));
        }
        self.check_candidate(target)?;

        self.target_assignments.insert(subscription_id, target.id);
        self.requires_manual_migration.remove(&subscription_id);
        self.blocking_issues
            .retain(|issue| issue.subscription_id != Some(subscription_id));
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Freezes the plan for execution.
    ///
    /// # Errors
    ///
    /// - `Validation` while blocking issues remain
    /// - `Conflict` if the plan is not a draft
    pub fn approve(&mut self, actor: ActorId) -> Result<(), PlanChangeError> {
        if self.status == MigrationStatus::Draft && !self.blocking_issues.is_empty() {
            return Err(PlanChangeError::validation(
                "blocking_issues",
                format!(
                    "{} blocking issue(s) must be resolved before approval",
                    self.blocking_issues.len()
                ),
            ));
        }
        self.transition(MigrationStatus::Approved, "approve")?;
        let now = Timestamp::now();
        self.approved_by = Some(actor);
        self.approved_at = Some(now);
        Ok(())
    }

    /// # Errors
    ///
    /// `Conflict` unless the plan is approved.
    pub fn begin_execution(&mut self) -> Result<(), PlanChangeError> {
        self.transition(MigrationStatus::Executing, "execute")
    }

    pub fn record_applied_version(&mut self, version: u32) {
        self.applied_version = Some(version);
        self.updated_at = Timestamp::now();
    }

    pub fn record_outcome(&mut self, subscription_id: SubscriptionId, outcome: StepOutcome) {
        self.outcomes.insert(subscription_id, outcome);
        self.updated_at = Timestamp::now();
    }

    /// # Errors
    ///
    /// `Conflict` unless the plan is executing.
    pub fn complete(&mut self) -> Result<(), PlanChangeError> {
        self.transition(MigrationStatus::Completed, "complete")?;
        self.executed_at = Some(self.updated_at);
        Ok(())
    }

    /// # Errors
    ///
    /// `Conflict` unless the plan is executing.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), PlanChangeError> {
        self.transition(MigrationStatus::Failed, "fail")?;
        self.executed_at = Some(self.updated_at);
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// # Errors
    ///
    /// `Conflict` unless the plan is completed or failed.
    pub fn mark_rolled_back(&mut self) -> Result<(), PlanChangeError> {
        self.transition(MigrationStatus::RolledBack, "roll back")?;
        self.rolled_back_at = Some(self.updated_at);
        Ok(())
    }

    fn transition(&mut self, target: MigrationStatus, action: &str) -> Result<(), PlanChangeError> {
        let current = self.status;
        self.status = current
            .transition_to(target)
            .map_err(|_| PlanChangeError::invalid_state(current.as_str(), action))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Subscriptions currently holding an assignment this plan wrote.
    pub fn migrated_subscriptions(&self) -> impl Iterator<Item = (&SubscriptionId, &StepOutcome)> {
        self.outcomes.iter().filter(|(_, o)| o.is_migrated())
    }

    pub fn count_outcomes(&self, status: StepStatus) -> usize {
        self.outcomes.values().filter(|o| o.status == status).count()
    }

    /// Result of the last execution, once the plan has left `executing`.
    pub fn execution_summary(&self) -> Option<ExecutionSummary> {
        let outcome = match self.status {
            MigrationStatus::Draft | MigrationStatus::Approved | MigrationStatus::Executing => {
                return None
            }
            MigrationStatus::Failed | MigrationStatus::RolledBack => MigrationOutcome::RolledBack,
            MigrationStatus::Completed => MigrationOutcome::Completed,
        };

        let ids_with = |status: StepStatus| -> Vec<SubscriptionId> {
            self.outcomes
                .iter()
                .filter(|(_, o)| o.status == status)
                .map(|(id, _)| *id)
                .collect()
        };

        let mut manual_review_required: Vec<SubscriptionId> =
            self.requires_manual_migration.iter().copied().collect();
        manual_review_required.extend(ids_with(StepStatus::RestoreSkipped));
        manual_review_required.sort();

        let failed_steps: Vec<FailedStep> = self
            .outcomes
            .iter()
            .filter(|(_, o)| o.status == StepStatus::Failed)
            .map(|(id, o)| FailedStep {
                subscription_id: *id,
                reason: o.detail.clone().unwrap_or_default(),
                attempts: o.attempts,
            })
            .collect();

        let mut migrated = ids_with(StepStatus::Migrated);
        migrated.extend(ids_with(StepStatus::Restored));
        migrated.sort();

        let stale_skips = ids_with(StepStatus::StaleSkip);
        let has_warnings = !stale_skips.is_empty()
            || !manual_review_required.is_empty()
            || !failed_steps.is_empty();
        let outcome = match outcome {
            MigrationOutcome::Completed if has_warnings => MigrationOutcome::CompletedWithWarnings,
            other => other,
        };

        Some(ExecutionSummary {
            outcome,
            migrated,
            stale_skips,
            manual_review_required,
            failed_steps,
            not_attempted: ids_with(StepStatus::NotAttempted),
            failure_reason: self.failure_reason.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::impact::{PlanDisable, PricingChange};
    use crate::domain::plan::{BillingPeriod, PlanSnapshot, PlanStatus, PlanVersion, Pricing};
    use crate::domain::subscription::SubscriptionStatus;

    fn active_plan(name: &str, cents: i64) -> Plan {
        let snapshot = PlanSnapshot {
            name: name.to_string(),
            status: PlanStatus::Active,
            pricing: Pricing::new(cents, "USD", BillingPeriod::Monthly).unwrap(),
            features: Default::default(),
            limits: Default::default(),
        };
        Plan::from_initial(&PlanVersion::initial(PlanId::new(), snapshot, ActorId::system()))
    }

    fn entry(plan_id: PlanId) -> PreMigrationEntry {
        PreMigrationEntry {
            workspace_id: WorkspaceId::new(),
            assignment: AssignmentSnapshot {
                plan_id,
                plan_version_at_subscribe: 1,
                status: SubscriptionStatus::Active,
            },
        }
    }

    fn draft(change: ProposedChange) -> (MigrationPlan, SubscriptionId) {
        let source = PlanId::new();
        let sub = SubscriptionId::new();
        let now = Timestamp::now();
        let plan = MigrationPlan {
            id: MigrationPlanId::new(),
            source_plan_id: source,
            source_version: 1,
            impact_report_id: ImpactReportId::new(),
            change,
            target_assignments: BTreeMap::new(),
            requires_manual_migration: [sub].into_iter().collect(),
            blocking_issues: vec![BlockingIssue {
                subscription_id: Some(sub),
                message: "no qualifying candidate".to_string(),
            }],
            pre_migration_snapshot: [(sub, entry(source))].into_iter().collect(),
            excluded_subscriptions: vec![],
            status: MigrationStatus::Draft,
            outcomes: BTreeMap::new(),
            applied_version: None,
            failure_reason: None,
            created_by: ActorId::system(),
            created_at: now,
            approved_by: None,
            approved_at: None,
            executed_at: None,
            rolled_back_at: None,
            updated_at: now,
        };
        (plan, sub)
    }

    fn disable() -> ProposedChange {
        ProposedChange::PlanDisable(PlanDisable::default())
    }

    #[test]
    fn approve_is_blocked_by_open_issues() {
        let (mut plan, _) = draft(disable());
        let err = plan.approve(ActorId::system()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(plan.status, MigrationStatus::Draft);
    }

    #[test]
    fn manual_assignment_clears_blocking_issue() {
        let (mut plan, sub) = draft(disable());
        let target = active_plan("pro", 9_900);

        plan.assign_manually(sub, &target).unwrap();

        assert_eq!(plan.target_assignments.get(&sub), Some(&target.id));
        assert!(plan.requires_manual_migration.is_empty());
        assert!(plan.blocking_issues.is_empty());
        assert!(plan.approve(ActorId::system()).is_ok());
    }

    #[test]
    fn manual_assignment_rejects_unknown_subscription() {
        let (mut plan, _) = draft(disable());
        let err = plan
            .assign_manually(SubscriptionId::new(), &active_plan("pro", 9_900))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn manual_assignment_rejects_source_plan_on_disable() {
        let (mut plan, sub) = draft(disable());
        let mut source = active_plan("creator", 3_440);
        source.id = plan.source_plan_id;
        assert!(plan.assign_manually(sub, &source).is_err());
    }

    #[test]
    fn manual_assignment_rejects_source_plan_on_disable_only() {
        let change = ProposedChange::Pricing(PricingChange {
            amount_cents: 4_900,
            currency: "USD".to_string(),
            billing_period: None,
        });
        let (mut plan, sub) = draft(change);
        let mut source = active_plan("creator", 3_440);
        source.id = plan.source_plan_id;
        assert!(plan.assign_manually(sub, &source).is_ok());
    }

    #[test]
    fn manual_assignment_after_approval_is_a_conflict() {
        let (mut plan, sub) = draft(disable());
        let target = active_plan("pro", 9_900);
        plan.assign_manually(sub, &target).unwrap();
        plan.approve(ActorId::system()).unwrap();

        let err = plan.assign_manually(sub, &target).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn execute_twice_is_a_conflict() {
        let (mut plan, sub) = draft(disable());
        plan.assign_manually(sub, &active_plan("pro", 9_900)).unwrap();
        plan.approve(ActorId::system()).unwrap();
        plan.begin_execution().unwrap();
        plan.complete().unwrap();

        let err = plan.begin_execution().unwrap_err();
        assert!(err.is_conflict());
        assert!(plan.executed_at.is_some());
    }

    #[test]
    fn draft_cannot_be_rolled_back() {
        let (mut plan, _) = draft(disable());
        assert!(plan.mark_rolled_back().unwrap_err().is_conflict());
    }

    #[test]
    fn summary_reports_warnings() {
        let (mut plan, sub) = draft(disable());
        let target = active_plan("pro", 9_900);
        plan.assign_manually(sub, &target).unwrap();
        plan.approve(ActorId::system()).unwrap();
        plan.begin_execution().unwrap();
        assert!(plan.execution_summary().is_none());

        plan.record_outcome(sub, StepOutcome::stale_skip(target.id, "plan changed", 1));
        plan.complete().unwrap();

        let summary = plan.execution_summary().unwrap();
        assert_eq!(summary.outcome, MigrationOutcome::CompletedWithWarnings);
        assert_eq!(summary.stale_skips, vec![sub]);
    }

    #[test]
    fn clean_run_is_completed() {
        let (mut plan, sub) = draft(disable());
        let target = active_plan("pro", 9_900);
        plan.assign_manually(sub, &target).unwrap();
        plan.approve(ActorId::system()).unwrap();
        plan.begin_execution().unwrap();
        let written = plan.pre_migration_snapshot[&sub].assignment.reassigned(target.id, 1);
        plan.record_outcome(sub, StepOutcome::migrated(target.id, written, 1));
        plan.complete().unwrap();

        let summary = plan.execution_summary().unwrap();
        assert_eq!(summary.outcome, MigrationOutcome::Completed);
        assert_eq!(summary.migrated, vec![sub]);
    }
}
