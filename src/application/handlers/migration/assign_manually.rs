//! AssignManuallyHandler - Resolves a subscription flagged for manual review.

use std::sync::Arc;

use crate::domain::foundation::{ActorId, MigrationPlanId, PlanId, SubscriptionId};
use crate::domain::migration::{MigrationPlan, MigrationStatus};
use crate::domain::PlanChangeError;
use crate::ports::{MigrationPlanRepository, PlanVersionStore};

#[derive(Debug, Clone)]
pub struct AssignManuallyCommand {
    pub migration_plan_id: MigrationPlanId,
    pub subscription_id: SubscriptionId,
    pub target_plan_id: PlanId,
    pub actor: ActorId,
}

pub struct AssignManuallyHandler {
    plan_store: Arc<dyn PlanVersionStore>,
    migrations: Arc<dyn MigrationPlanRepository>,
}

impl AssignManuallyHandler {
    pub fn new(
        plan_store: Arc<dyn PlanVersionStore>,
        migrations: Arc<dyn MigrationPlanRepository>,
    ) -> Self {
        Self {
            plan_store,
            migrations,
        }
    }

    pub async fn handle(&self, cmd: AssignManuallyCommand) -> Result<MigrationPlan, PlanChangeError> {
        let mut plan = self
            .migrations
            .find_by_id(cmd.migration_plan_id)
            .await?
            .ok_or_else(|| PlanChangeError::migration_plan_not_found(cmd.migration_plan_id))?;
        let target = self
            .plan_store
            .find_plan(cmd.target_plan_id)
            .await?
            .ok_or_else(|| {
                PlanChangeError::validation(
                    "target_plan_id",
                    format!("unknown plan {}", cmd.target_plan_id),
                )
            })?;

        plan.assign_manually(cmd.subscription_id, &target)?;
        self.migrations.update(&plan, MigrationStatus::Draft).await?;

        tracing::info!(
            migration_plan_id = %plan.id,
            subscription_id = %cmd.subscription_id,
            target_plan_id = %target.id,
            actor = %cmd.actor,
            "Subscription assigned manually"
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::migration::test_support::Engine;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::impact::{PlanDisable, ProposedChange};

    #[tokio::test]
    async fn manual_assignment_is_persisted() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &["sso"]).await;
        let enterprise = engine.plan("enterprise", 20_000, &["sso", "audit"]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        engine.usage.record_usage(sub.id, "sso");
        let report = engine
            .analyze(creator, ProposedChange::PlanDisable(PlanDisable::default()))
            .await;
        let draft = engine.build(creator, &report, vec![]).await;
        assert!(draft.requires_manual_migration.contains(&sub.id));

        let handler = AssignManuallyHandler::new(engine.plans.clone(), engine.migrations.clone());
        let plan = handler
            .handle(AssignManuallyCommand {
                migration_plan_id: draft.id,
                subscription_id: sub.id,
                target_plan_id: enterprise,
                actor: ActorId::system(),
            })
            .await
            .unwrap();

        assert!(plan.blocking_issues.is_empty());
        let stored = engine.migrations.find_by_id(draft.id).await.unwrap().unwrap();
        assert_eq!(stored.target_assignments.get(&sub.id), Some(&enterprise));
    }

    #[tokio::test]
    async fn unknown_target_is_a_validation_error() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        let report = engine
            .analyze(creator, ProposedChange::PlanDisable(PlanDisable::default()))
            .await;
        let draft = engine.build(creator, &report, vec![]).await;

        let err = AssignManuallyHandler::new(engine.plans.clone(), engine.migrations.clone())
            .handle(AssignManuallyCommand {
                migration_plan_id: draft.id,
                subscription_id: sub.id,
                target_plan_id: PlanId::new(),
                actor: ActorId::system(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }
}
