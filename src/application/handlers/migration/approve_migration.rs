//! ApproveMigrationHandler - Freezes a draft migration plan for execution.
//!
//! Only one plan per source plan may be approved or executing. The check
//! here gives a readable error; the repository enforces it atomically.

use std::sync::Arc;

use crate::domain::foundation::{ActorId, MigrationPlanId};
use crate::domain::migration::{MigrationPlan, MigrationStatus};
use crate::domain::PlanChangeError;
use crate::ports::MigrationPlanRepository;

#[derive(Debug, Clone)]
pub struct ApproveMigrationCommand {
    pub migration_plan_id: MigrationPlanId,
    pub actor: ActorId,
}

pub struct ApproveMigrationHandler {
    migrations: Arc<dyn MigrationPlanRepository>,
}

impl ApproveMigrationHandler {
    pub fn new(migrations: Arc<dyn MigrationPlanRepository>) -> Self {
        Self { migrations }
    }

    pub async fn handle(&self, cmd: ApproveMigrationCommand) -> Result<MigrationPlan, PlanChangeError> {
        let mut plan = self
            .migrations
            .find_by_id(cmd.migration_plan_id)
            .await?
            .ok_or_else(|| PlanChangeError::migration_plan_not_found(cmd.migration_plan_id))?;

        if let Some(active) = self.migrations.find_active_for_plan(plan.source_plan_id).await? {
            if active.id != plan.id {
                return Err(PlanChangeError::active_migration_exists(plan.source_plan_id, active.id));
            }
        }

        plan.approve(cmd.actor.clone())?;
        self.migrations.update(&plan, MigrationStatus::Draft).await?;

        tracing::info!(
            migration_plan_id = %plan.id,
            plan_id = %plan.source_plan_id,
            actor = %cmd.actor,
            "Migration plan approved"
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::migration::test_support::Engine;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::impact::{PricingChange, ProposedChange};

    fn price_rise() -> ProposedChange {
        ProposedChange::Pricing(PricingChange {
            amount_cents: 4_900,
            currency: "USD".to_string(),
            billing_period: None,
        })
    }

    fn approve(id: MigrationPlanId) -> ApproveMigrationCommand {
        ApproveMigrationCommand {
            migration_plan_id: id,
            actor: ActorId::system(),
        }
    }

    #[tokio::test]
    async fn approval_records_approver() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let report = engine.analyze(creator, price_rise()).await;
        let draft = engine.build(creator, &report, vec![team]).await;

        let plan = engine.approve_handler().handle(approve(draft.id)).await.unwrap();

        assert_eq!(plan.status, MigrationStatus::Approved);
        assert_eq!(plan.approved_by, Some(ActorId::system()));
        assert!(plan.approved_at.is_some());
    }

    #[tokio::test]
    async fn second_active_plan_for_same_source_conflicts() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let team = engine.plan("team", 6_900, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let report = engine.analyze(creator, price_rise()).await;
        let first = engine.build(creator, &report, vec![team]).await;
        let second = engine.build(creator, &report, vec![team]).await;
        engine.approve_handler().handle(approve(first.id)).await.unwrap();

        let err = engine.approve_handler().handle(approve(second.id)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ActiveMigrationExists);
    }

    #[tokio::test]
    async fn blocking_issues_prevent_approval() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let report = engine.analyze(creator, price_rise()).await;
        let draft = engine.build(creator, &report, vec![]).await;

        let err = engine.approve_handler().handle(approve(draft.id)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }
}
