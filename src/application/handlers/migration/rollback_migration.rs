//! RollbackMigrationHandler - Reverts a finished migration run.
//!
//! Rolling back an already rolled-back plan returns it unchanged.

use std::sync::Arc;

use super::compensation::MigrationCompensator;
use crate::domain::foundation::{ActorId, MigrationPlanId};
use crate::domain::migration::{ExecutionSummary, MigrationPlan, MigrationStatus};
use crate::domain::PlanChangeError;
use crate::ports::{
    BillingService, MigrationPlanRepository, NotificationService, PlanVersionStore,
    SubscriptionReader, SubscriptionRepository,
};

#[derive(Debug, Clone)]
pub struct RollbackMigrationCommand {
    pub migration_plan_id: MigrationPlanId,
    pub actor: ActorId,
}

pub struct RollbackMigrationHandler {
    migrations: Arc<dyn MigrationPlanRepository>,
    compensator: MigrationCompensator,
}

impl RollbackMigrationHandler {
    pub fn new(
        plan_store: Arc<dyn PlanVersionStore>,
        migrations: Arc<dyn MigrationPlanRepository>,
        reader: Arc<dyn SubscriptionReader>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        billing: Arc<dyn BillingService>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            migrations,
            compensator: MigrationCompensator {
                plan_store,
                reader,
                subscriptions,
                billing,
                notifier,
            },
        }
    }

    pub async fn handle(
        &self,
        cmd: RollbackMigrationCommand,
    ) -> Result<(MigrationPlan, Option<ExecutionSummary>), PlanChangeError> {
        let mut plan = self
            .migrations
            .find_by_id(cmd.migration_plan_id)
            .await?
            .ok_or_else(|| PlanChangeError::migration_plan_not_found(cmd.migration_plan_id))?;

        let loaded_status = plan.status;
        match loaded_status {
            MigrationStatus::RolledBack => {
                let summary = plan.execution_summary();
                return Ok((plan, summary));
            }
            MigrationStatus::Completed | MigrationStatus::Failed => {}
            other => return Err(PlanChangeError::invalid_state(other.as_str(), "roll back")),
        }

        self.compensator.compensate(&mut plan, &cmd.actor).await?;
        plan.mark_rolled_back()?;
        self.migrations.update(&plan, loaded_status).await?;

        tracing::info!(
            migration_plan_id = %plan.id,
            plan_id = %plan.source_plan_id,
            actor = %cmd.actor,
            "Migration rolled back"
        );

        let summary = plan.execution_summary();
        Ok((plan, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::migration::test_support::Engine;
    use crate::domain::impact::{PlanDisable, ProposedChange};
    use crate::domain::migration::{MigrationOutcome, StepStatus};
    use crate::domain::plan::PlanStatus;
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::templates;
    use std::time::Duration;

    fn rollback(id: MigrationPlanId) -> RollbackMigrationCommand {
        RollbackMigrationCommand {
            migration_plan_id: id,
            actor: ActorId::system(),
        }
    }

    #[tokio::test]
    async fn completed_migration_is_reverted() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        let plan = engine
            .approved(creator, ProposedChange::PlanDisable(PlanDisable::default()), vec![team])
            .await;
        engine.execute(&plan).await;
        assert_eq!(engine.subscriptions.get(sub.id).unwrap().plan_id, team);

        let (plan, summary) = engine.rollback_handler().handle(rollback(plan.id)).await.unwrap();

        assert_eq!(plan.status, MigrationStatus::RolledBack);
        assert_eq!(summary.unwrap().outcome, MigrationOutcome::RolledBack);
        assert_eq!(engine.subscriptions.get(sub.id).unwrap().assignment(), sub.assignment());
        assert_eq!(engine.billing.billed_plan(sub.id), Some(creator));
        assert_eq!(engine.current_config(creator).await.status, PlanStatus::Active);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.notifier.sent_with_template(templates::MIGRATION_REVERTED).len(), 1);
    }

    #[tokio::test]
    async fn second_rollback_is_a_no_op() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let plan = engine
            .approved(creator, ProposedChange::PlanDisable(PlanDisable::default()), vec![team])
            .await;
        engine.execute(&plan).await;
        engine.rollback_handler().handle(rollback(plan.id)).await.unwrap();
        let versions = engine.plans.list_versions(creator).await.unwrap().len();

        let (again, _) = engine.rollback_handler().handle(rollback(plan.id)).await.unwrap();

        assert_eq!(again.status, MigrationStatus::RolledBack);
        assert_eq!(engine.plans.list_versions(creator).await.unwrap().len(), versions);
    }

    #[tokio::test]
    async fn subscription_changed_after_migration_is_left_for_review() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        let plan = engine
            .approved(creator, ProposedChange::PlanDisable(PlanDisable::default()), vec![team])
            .await;
        engine.execute(&plan).await;
        let mut moved = engine.subscriptions.get(sub.id).unwrap().assignment();
        moved.status = SubscriptionStatus::Cancelled;
        engine.subscriptions.force_assignment(sub.id, moved);

        let (plan, summary) = engine.rollback_handler().handle(rollback(plan.id)).await.unwrap();

        assert_eq!(plan.outcomes[&sub.id].status, StepStatus::RestoreSkipped);
        assert_eq!(summary.unwrap().manual_review_required, vec![sub.id]);
        assert_eq!(engine.subscriptions.get(sub.id).unwrap().assignment(), moved);
    }

    #[tokio::test]
    async fn draft_cannot_be_rolled_back() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let report = engine
            .analyze(creator, ProposedChange::PlanDisable(PlanDisable::default()))
            .await;
        let draft = engine.build(creator, &report, vec![]).await;

        let err = engine.rollback_handler().handle(rollback(draft.id)).await.unwrap_err();

        assert!(err.is_conflict());
    }
}
