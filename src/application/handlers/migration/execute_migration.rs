//! ExecuteMigrationHandler - Command handler that runs an approved
//! migration plan.
//!
//! # Flow
//!
//! 1. `approved -> executing`, persisted with a status guard
//! 2. Commit the changed plan configuration (`expected_version = source_version`)
//! 3. Run one step per assignment with bounded concurrency; each step
//!    re-checks the pre-migration snapshot, reprices, then compare-and-sets
//! 4. Failure rate above threshold, cancellation, or a version conflict in
//!    step 2 fails the run and compensates everything migrated so far

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use super::compensation::MigrationCompensator;
use crate::application::notifications::spawn_notices;
use crate::application::{ExecutionGuard, ExecutionRegistry};
use crate::domain::foundation::{ActorId, ErrorCode, MigrationPlanId, PlanId, SubscriptionId};
use crate::domain::migration::{
    ExecutionPolicy, ExecutionSummary, MigrationPlan, MigrationStatus, PreMigrationEntry,
    StepOutcome, StepStatus,
};
use crate::domain::subscription::AssignmentSnapshot;
use crate::domain::PlanChangeError;
use crate::ports::{
    templates, BillingService, MigrationPlanRepository, NotificationService, PlanVersionStore,
    SubscriptionReader, SubscriptionRepository,
};

/// Command to execute an approved migration plan.
#[derive(Debug, Clone)]
pub struct ExecuteMigrationCommand {
    pub migration_plan_id: MigrationPlanId,
    pub actor: ActorId,
}

#[derive(Debug, Clone)]
pub struct ExecuteMigrationResult {
    pub plan: MigrationPlan,
    pub summary: ExecutionSummary,
}

/// Result of one attempt at one step.
enum Attempt {
    Applied,
    Stale(String),
}

/// Handler for executing migration plans.
pub struct ExecuteMigrationHandler {
    plan_store: Arc<dyn PlanVersionStore>,
    migrations: Arc<dyn MigrationPlanRepository>,
    reader: Arc<dyn SubscriptionReader>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    billing: Arc<dyn BillingService>,
    notifier: Arc<dyn NotificationService>,
    registry: Arc<ExecutionRegistry>,
    policy: ExecutionPolicy,
}

impl ExecuteMigrationHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        plan_store: Arc<dyn PlanVersionStore>,
        migrations: Arc<dyn MigrationPlanRepository>,
        reader: Arc<dyn SubscriptionReader>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        billing: Arc<dyn BillingService>,
        notifier: Arc<dyn NotificationService>,
        registry: Arc<ExecutionRegistry>,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            plan_store,
            migrations,
            reader,
            subscriptions,
            billing,
            notifier,
            registry,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: ExecuteMigrationCommand,
    ) -> Result<ExecuteMigrationResult, PlanChangeError> {
        let mut plan = self
            .migrations
            .find_by_id(cmd.migration_plan_id)
            .await?
            .ok_or_else(|| PlanChangeError::migration_plan_not_found(cmd.migration_plan_id))?;

        // 1. Claim the run
        plan.begin_execution()?;
        let guard = self.registry.register(plan.id)?;
        self.migrations.update(&plan, MigrationStatus::Approved).await?;

        tracing::info!(
            migration_plan_id = %plan.id,
            plan_id = %plan.source_plan_id,
            steps = plan.target_assignments.len(),
            actor = %cmd.actor,
            "Migration execution started"
        );

        // 2. Commit the new plan version
        let prepared = match self.commit_change(&mut plan, &cmd.actor).await {
            Ok(()) => self.target_versions(&plan).await,
            Err(e) => Err(e),
        };
        let target_versions = match prepared {
            Ok(versions) => versions,
            Err(e) => {
                if e.code() == ErrorCode::VersionConflict {
                    tracing::warn!(
                        migration_plan_id = %plan.id,
                        plan_id = %plan.source_plan_id,
                        error = %e,
                        "Plan moved before migration could commit"
                    );
                }
                drop(guard);
                return self.fail_and_compensate(plan, e.message(), &cmd.actor).await;
            }
        };

        // 3. Steps
        let failed = self.run_steps(&mut plan, &target_versions, &guard).await;
        let total = plan.target_assignments.len();

        // 4. Finish
        let reason = if guard.is_cancelled() {
            Some("cancelled by operator".to_string())
        } else if self.policy.failure_rate_exceeded(failed, total) {
            Some(format!(
                "{} of {} steps failed (threshold {:.0}%)",
                failed,
                total,
                self.policy.failure_rate_threshold * 100.0
            ))
        } else {
            None
        };
        drop(guard);

        match reason {
            Some(reason) => self.fail_and_compensate(plan, reason, &cmd.actor).await,
            None => self.complete(plan).await,
        }
    }

    async fn commit_change(
        &self,
        plan: &mut MigrationPlan,
        actor: &ActorId,
    ) -> Result<(), PlanChangeError> {
        let source = self
            .plan_store
            .get_version(plan.source_plan_id, plan.source_version)
            .await?;
        let next = plan.change.apply_to(&source.snapshot)?;
        let version = self
            .plan_store
            .commit(
                plan.source_plan_id,
                next,
                &plan.change.describe(),
                actor,
                plan.source_version,
            )
            .await?;
        plan.record_applied_version(version.version);
        self.migrations.update(plan, MigrationStatus::Executing).await?;

        tracing::info!(
            migration_plan_id = %plan.id,
            plan_id = %plan.source_plan_id,
            version = version.version,
            "Plan change committed"
        );
        Ok(())
    }

    /// Runs every step and records its outcome. Returns the failure count.
    async fn run_steps(
        &self,
        plan: &mut MigrationPlan,
        target_versions: &HashMap<PlanId, u32>,
        guard: &ExecutionGuard,
    ) -> usize {
        let total = plan.target_assignments.len();
        let steps: Vec<(SubscriptionId, PlanId, Option<PreMigrationEntry>)> = plan
            .target_assignments
            .iter()
            .map(|(sub, target)| (*sub, *target, plan.pre_migration_snapshot.get(sub).copied()))
            .collect();

        let aborted = AtomicBool::new(false);
        let mut failed = 0;
        let migration_plan_id = plan.id;

        let mut results = stream::iter(steps)
            .map(|(sub, target, entry)| {
                let aborted = &aborted;
                let target_version = target_versions.get(&target).copied();
                async move {
                    if guard.is_cancelled() {
                        return (sub, StepOutcome::not_attempted(target, "execution cancelled"));
                    }
                    if aborted.load(Ordering::SeqCst) {
                        return (sub, StepOutcome::not_attempted(target, "failure threshold exceeded"));
                    }
                    let outcome = match (entry, target_version) {
                        (Some(entry), Some(version)) => {
                            self.run_step(migration_plan_id, sub, target, version, entry.assignment)
                                .await
                        }
                        (None, _) => StepOutcome::failed(target, "no pre-migration snapshot", 0),
                        (_, None) => StepOutcome::failed(target, "target plan not found", 0),
                    };
                    (sub, outcome)
                }
            })
            .buffer_unordered(self.policy.max_concurrency.max(1));

        while let Some((sub, outcome)) = results.next().await {
            if outcome.status == StepStatus::Failed {
                failed += 1;
                if self.policy.failure_rate_exceeded(failed, total)
                    && !aborted.swap(true, Ordering::SeqCst)
                {
                    tracing::warn!(
                        migration_plan_id = %migration_plan_id,
                        failed,
                        total,
                        "Failure threshold exceeded; aborting migration"
                    );
                }
            }
            plan.record_outcome(sub, outcome);
        }

        failed
    }

    async fn target_versions(&self, plan: &MigrationPlan) -> Result<HashMap<PlanId, u32>, PlanChangeError> {
        let mut versions = HashMap::new();
        for target in plan.target_assignments.values() {
            if versions.contains_key(target) {
                continue;
            }
            if let Some(found) = self.plan_store.find_plan(*target).await? {
                versions.insert(*target, found.current_version);
            }
        }
        Ok(versions)
    }

    /// One subscription, with timeout and retries.
    async fn run_step(
        &self,
        migration_plan_id: MigrationPlanId,
        sub: SubscriptionId,
        target: PlanId,
        target_version: u32,
        expected: AssignmentSnapshot,
    ) -> StepOutcome {
        let desired = expected.reassigned(target, target_version);
        let max_attempts = self.policy.max_attempts();
        let timeout_ms = self.policy.step_timeout.as_millis() as u64;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let result = tokio::time::timeout(
                self.policy.step_timeout,
                self.attempt_step(sub, target, &expected, &desired),
            )
            .await
            .unwrap_or_else(|_| Err(PlanChangeError::step_timed_out(sub, timeout_ms)));

            match result {
                Ok(Attempt::Applied) => {
                    tracing::debug!(
                        migration_plan_id = %migration_plan_id,
                        subscription_id = %sub,
                        target_plan_id = %target,
                        attempts,
                        "Subscription migrated"
                    );
                    return StepOutcome::migrated(target, desired, attempts);
                }
                Ok(Attempt::Stale(reason)) => {
                    tracing::info!(
                        migration_plan_id = %migration_plan_id,
                        subscription_id = %sub,
                        reason = %reason,
                        "Stale subscription skipped"
                    );
                    return StepOutcome::stale_skip(target, reason, attempts);
                }
                Err(e) if e.is_retryable() && attempts < max_attempts => {
                    tracing::warn!(
                        migration_plan_id = %migration_plan_id,
                        subscription_id = %sub,
                        attempt = attempts,
                        error = %e,
                        "Migration step failed; retrying"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        migration_plan_id = %migration_plan_id,
                        subscription_id = %sub,
                        attempts,
                        error = %e,
                        "Migration step failed"
                    );
                    self.settle_failed_step(sub, &expected, &desired).await;
                    return StepOutcome::failed(target, e.message(), attempts);
                }
            }
        }
    }

    /// Re-validate, reprice, compare-and-set.
    ///
    /// An earlier attempt that timed out after its write leaves the
    /// subscription on `desired`; that counts as applied.
    async fn attempt_step(
        &self,
        sub: SubscriptionId,
        target: PlanId,
        expected: &AssignmentSnapshot,
        desired: &AssignmentSnapshot,
    ) -> Result<Attempt, PlanChangeError> {
        let step_err = |e: crate::domain::foundation::DomainError| {
            PlanChangeError::step_failed(sub, e.message)
        };

        let current = self
            .reader
            .find_many(&[sub])
            .await
            .map_err(step_err)?
            .into_iter()
            .next();
        let current = match current {
            None => return Ok(Attempt::Stale("subscription no longer exists".to_string())),
            Some(s) => s.assignment(),
        };
        if current != *expected && current != *desired {
            return Ok(Attempt::Stale(
                "assignment changed since the migration plan was built".to_string(),
            ));
        }

        self.billing.reprice(sub, target).await.map_err(step_err)?;

        if current == *desired {
            return Ok(Attempt::Applied);
        }
        if self
            .subscriptions
            .compare_and_set_assignment(sub, expected, desired)
            .await
            .map_err(step_err)?
        {
            return Ok(Attempt::Applied);
        }

        // Lost a race with another writer; undo the reprice.
        if let Err(e) = self.billing.reprice(sub, expected.plan_id).await {
            tracing::warn!(
                subscription_id = %sub,
                error = %e,
                "Billing compensation after lost race failed"
            );
        }
        Ok(Attempt::Stale(
            "assignment changed during migration".to_string(),
        ))
    }

    /// Puts a failed step back on `expected` in both the subscription store
    /// and billing.
    ///
    /// Any attempt may have repriced before failing or timing out, and a
    /// timed-out attempt may have landed its compare-and-set.
    async fn settle_failed_step(
        &self,
        sub: SubscriptionId,
        expected: &AssignmentSnapshot,
        desired: &AssignmentSnapshot,
    ) {
        match self
            .subscriptions
            .compare_and_set_assignment(sub, desired, expected)
            .await
        {
            Ok(true) => tracing::info!(
                subscription_id = %sub,
                "Late assignment write reverted for failed step"
            ),
            Ok(false) => {}
            Err(e) => tracing::warn!(
                subscription_id = %sub,
                error = %e,
                "Could not revert assignment for failed step"
            ),
        }

        if let Err(e) = self.billing.reprice(sub, expected.plan_id).await {
            tracing::warn!(
                subscription_id = %sub,
                error = %e,
                "Billing compensation for failed step failed"
            );
        }
    }

    async fn complete(&self, mut plan: MigrationPlan) -> Result<ExecuteMigrationResult, PlanChangeError> {
        plan.complete()?;
        self.migrations.update(&plan, MigrationStatus::Executing).await?;

        let migrated_workspaces: Vec<_> = plan
            .migrated_subscriptions()
            .filter_map(|(id, _)| plan.pre_migration_snapshot.get(id).map(|e| e.workspace_id))
            .collect();
        let params = BTreeMap::from([
            ("migration_plan_id".to_string(), plan.id.to_string()),
            ("plan_id".to_string(), plan.source_plan_id.to_string()),
        ]);
        spawn_notices(
            &self.notifier,
            migrated_workspaces,
            templates::SUBSCRIPTION_MIGRATED,
            params,
        );

        self.finish(plan)
    }

    async fn fail_and_compensate(
        &self,
        mut plan: MigrationPlan,
        reason: impl Into<String>,
        actor: &ActorId,
    ) -> Result<ExecuteMigrationResult, PlanChangeError> {
        let reason = reason.into();
        plan.fail(reason.clone())?;
        self.migrations.update(&plan, MigrationStatus::Executing).await?;

        tracing::warn!(
            migration_plan_id = %plan.id,
            plan_id = %plan.source_plan_id,
            reason = %reason,
            migrated = plan.count_outcomes(StepStatus::Migrated),
            "Migration failed; rolling back"
        );

        self.compensator().compensate(&mut plan, actor).await?;
        plan.mark_rolled_back()?;
        self.migrations.update(&plan, MigrationStatus::Failed).await?;

        self.finish(plan)
    }

    fn finish(&self, plan: MigrationPlan) -> Result<ExecuteMigrationResult, PlanChangeError> {
        let summary = plan
            .execution_summary()
            .ok_or_else(|| PlanChangeError::invalid_state(plan.status.as_str(), "summarise"))?;

        tracing::info!(
            migration_plan_id = %plan.id,
            status = %plan.status,
            migrated = summary.migrated.len(),
            stale_skips = summary.stale_skips.len(),
            failed = summary.failed_steps.len(),
            "Migration execution finished"
        );

        Ok(ExecuteMigrationResult { plan, summary })
    }

    fn compensator(&self) -> MigrationCompensator {
        MigrationCompensator {
            plan_store: self.plan_store.clone(),
            reader: self.reader.clone(),
            subscriptions: self.subscriptions.clone(),
            billing: self.billing.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::migration::test_support::Engine;
    use crate::domain::impact::{PlanDisable, ProposedChange};
    use crate::domain::migration::MigrationOutcome;
    use crate::domain::plan::PlanStatus;
    use crate::domain::subscription::SubscriptionStatus;
    use std::time::Duration;

    fn disable() -> ProposedChange {
        ProposedChange::PlanDisable(PlanDisable::default())
    }

    fn execute(id: MigrationPlanId) -> ExecuteMigrationCommand {
        ExecuteMigrationCommand {
            migration_plan_id: id,
            actor: ActorId::system(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Successful runs
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn creator_disable_moves_subscriber_to_team() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &["api"]).await;
        let team = engine.plan("team", 6_900, &["api"]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        engine.usage.record_usage(sub.id, "api");
        let plan = engine.approved(creator, disable(), vec![team]).await;

        let result = engine.execute(&plan).await;

        assert_eq!(result.plan.status, MigrationStatus::Completed);
        assert_eq!(result.plan.applied_version, Some(2));
        assert_eq!(result.summary.outcome, MigrationOutcome::Completed);
        assert_eq!(result.summary.migrated, vec![sub.id]);

        let migrated = engine.subscriptions.get(sub.id).unwrap();
        assert_eq!(migrated.plan_id, team);
        assert_eq!(migrated.plan_version_at_subscribe, 1);
        assert_eq!(engine.billing.billed_plan(sub.id), Some(team));
        assert_eq!(engine.current_config(creator).await.status, PlanStatus::Disabled);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let sent = engine.notifier.sent_with_template(templates::SUBSCRIPTION_MIGRATED);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].workspace_id, sub.workspace_id);
    }

    #[tokio::test]
    async fn transient_billing_failure_is_retried() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        engine.billing.fail_times(sub.id, 1);
        let plan = engine.approved(creator, disable(), vec![team]).await;

        let result = engine.execute(&plan).await;

        assert_eq!(result.plan.status, MigrationStatus::Completed);
        assert_eq!(result.plan.outcomes[&sub.id].attempts, 2);
        assert_eq!(engine.billing.call_count(sub.id), 2);
    }

    #[tokio::test]
    async fn changed_subscription_is_skipped_as_stale() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let kept = engine.subscriber(creator, 3_440).await;
        let changed = engine.subscriber(creator, 3_440).await;
        let plan = engine.approved(creator, disable(), vec![team]).await;

        let mut cancelled = changed.assignment();
        cancelled.status = SubscriptionStatus::Cancelled;
        engine.subscriptions.force_assignment(changed.id, cancelled);

        let result = engine.execute(&plan).await;

        assert_eq!(result.summary.outcome, MigrationOutcome::CompletedWithWarnings);
        assert_eq!(result.summary.stale_skips, vec![changed.id]);
        assert_eq!(result.summary.migrated, vec![kept.id]);
        assert_eq!(engine.subscriptions.get(changed.id).unwrap().assignment(), cancelled);
        assert_eq!(engine.billing.call_count(changed.id), 0);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failed runs
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn failure_threshold_rolls_back_every_migrated_subscription() {
        let engine = Engine::new().with_policy(ExecutionPolicy {
            max_concurrency: 1,
            ..ExecutionPolicy::default()
        });
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let mut subs = Vec::new();
        for _ in 0..10 {
            subs.push(engine.subscriber(creator, 3_440).await);
        }
        subs.sort_by_key(|s| s.id);
        for failing in &subs[7..] {
            engine.billing.fail_always(failing.id);
        }
        let plan = engine.approved(creator, disable(), vec![team]).await;

        let result = engine.execute(&plan).await;

        assert_eq!(result.plan.status, MigrationStatus::RolledBack);
        assert_eq!(result.summary.outcome, MigrationOutcome::RolledBack);
        assert_eq!(result.summary.failed_steps.len(), 3);
        assert!(result.summary.failed_steps.iter().all(|f| f.attempts == 3));
        assert!(result.plan.failure_reason.is_some());
        for sub in &subs {
            let current = engine.subscriptions.get(sub.id).unwrap();
            assert_eq!(current.assignment(), sub.assignment());
        }
        for sub in &subs[..7] {
            assert_eq!(result.plan.outcomes[&sub.id].status, StepStatus::Restored);
            assert_eq!(engine.billing.billed_plan(sub.id), Some(creator));
        }
        assert_eq!(engine.current_config(creator).await.status, PlanStatus::Active);

        let stored = engine.migrations.find_by_id(plan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MigrationStatus::RolledBack);
    }

    #[tokio::test]
    async fn failures_under_threshold_complete_with_warnings() {
        let engine = Engine::new().with_policy(ExecutionPolicy {
            max_concurrency: 1,
            ..ExecutionPolicy::default()
        });
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let mut subs = Vec::new();
        for _ in 0..10 {
            subs.push(engine.subscriber(creator, 3_440).await);
        }
        engine.billing.fail_always(subs[0].id);
        engine.billing.fail_always(subs[1].id);
        let plan = engine.approved(creator, disable(), vec![team]).await;

        let result = engine.execute(&plan).await;

        assert_eq!(result.plan.status, MigrationStatus::Completed);
        assert_eq!(result.summary.outcome, MigrationOutcome::CompletedWithWarnings);
        assert_eq!(result.summary.failed_steps.len(), 2);
        assert_eq!(result.summary.migrated.len(), 8);
    }

    #[tokio::test]
    async fn slow_billing_times_out() {
        let engine = Engine::new().with_policy(ExecutionPolicy {
            step_timeout: Duration::from_millis(10),
            max_step_retries: 0,
            ..ExecutionPolicy::default()
        });
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        engine.billing.set_delay(Duration::from_millis(200));
        let plan = engine.approved(creator, disable(), vec![team]).await;

        let result = engine.execute(&plan).await;

        assert_eq!(result.plan.status, MigrationStatus::RolledBack);
        assert_eq!(result.summary.failed_steps[0].subscription_id, sub.id);
        assert_eq!(engine.subscriptions.get(sub.id).unwrap().plan_id, creator);
    }

    /// Assignment writes that always error, after an optional successful
    /// write-through.
    struct BrokenWrites {
        inner: Arc<dyn SubscriptionRepository>,
        write_through: bool,
    }

    #[async_trait::async_trait]
    impl SubscriptionRepository for BrokenWrites {
        async fn insert(
            &self,
            subscription: &crate::domain::subscription::Subscription,
        ) -> Result<(), crate::domain::foundation::DomainError> {
            self.inner.insert(subscription).await
        }

        async fn compare_and_set_assignment(
            &self,
            id: SubscriptionId,
            expected: &AssignmentSnapshot,
            new: &AssignmentSnapshot,
        ) -> Result<bool, crate::domain::foundation::DomainError> {
            if self.write_through {
                self.inner.compare_and_set_assignment(id, expected, new).await?;
            }
            Err(crate::domain::foundation::DomainError::database("connection reset"))
        }
    }

    fn handler_with_writes(engine: &Engine, writes: BrokenWrites) -> ExecuteMigrationHandler {
        ExecuteMigrationHandler::new(
            engine.plans.clone(),
            engine.migrations.clone(),
            engine.subscriptions.clone(),
            Arc::new(writes),
            engine.billing.clone(),
            engine.notifier.clone(),
            engine.registry.clone(),
            engine.policy,
        )
    }

    #[tokio::test]
    async fn failed_assignment_write_restores_billing() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        let plan = engine.approved(creator, disable(), vec![team]).await;
        let handler = handler_with_writes(
            &engine,
            BrokenWrites {
                inner: engine.subscriptions.clone(),
                write_through: false,
            },
        );

        let result = handler.handle(execute(plan.id)).await.unwrap();

        assert_eq!(result.plan.status, MigrationStatus::RolledBack);
        assert_eq!(result.plan.outcomes[&sub.id].status, StepStatus::Failed);
        assert_eq!(engine.subscriptions.get(sub.id).unwrap().plan_id, creator);
        assert_eq!(engine.billing.billed_plan(sub.id), Some(creator));
    }

    #[tokio::test]
    async fn write_that_lands_before_erroring_is_reverted() {
        let engine = Engine::new().with_policy(ExecutionPolicy {
            max_step_retries: 0,
            ..ExecutionPolicy::default()
        });
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        let plan = engine.approved(creator, disable(), vec![team]).await;
        let handler = handler_with_writes(
            &engine,
            BrokenWrites {
                inner: engine.subscriptions.clone(),
                write_through: true,
            },
        );

        let result = handler.handle(execute(plan.id)).await.unwrap();

        assert_eq!(result.plan.outcomes[&sub.id].status, StepStatus::Failed);
        assert_eq!(engine.subscriptions.get(sub.id).unwrap().assignment(), sub.assignment());
        assert_eq!(engine.billing.billed_plan(sub.id), Some(creator));
    }

    #[tokio::test]
    async fn plan_committed_elsewhere_aborts_before_any_step() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        let plan = engine.approved(creator, disable(), vec![team]).await;

        let mut renamed = engine.current_config(creator).await;
        renamed.name = "creator (legacy)".to_string();
        engine
            .plans
            .commit(creator, renamed, "rename", &ActorId::system(), 1)
            .await
            .unwrap();

        let result = engine.execute(&plan).await;

        assert_eq!(result.plan.status, MigrationStatus::RolledBack);
        assert!(result.plan.outcomes.is_empty());
        assert_eq!(result.plan.applied_version, None);
        assert_eq!(engine.subscriptions.get(sub.id).unwrap().plan_id, creator);
        assert_eq!(engine.billing.call_count(sub.id), 0);
        assert_eq!(engine.current_config(creator).await.name, "creator (legacy)");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Status guards
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn executing_twice_is_a_conflict() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let plan = engine.approved(creator, disable(), vec![team]).await;
        engine.execute(&plan).await;

        let err = engine.execute_handler().handle(execute(plan.id)).await.unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn draft_cannot_be_executed() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let report = engine.analyze(creator, disable()).await;
        let draft = engine.build(creator, &report, vec![team]).await;

        let err = engine.execute_handler().handle(execute(draft.id)).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(engine.current_config(creator).await.status, PlanStatus::Active);
    }
}
