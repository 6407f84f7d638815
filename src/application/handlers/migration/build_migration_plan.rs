//! BuildMigrationPlanHandler - Command handler that turns an impact report
//! into a draft migration plan.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::domain::foundation::{ActorId, ImpactReportId, PlanId, SubscriptionId};
use crate::domain::migration::{MigrationPlan, MigrationPlanBuilder};
use crate::domain::plan::Plan;
use crate::domain::subscription::Subscription;
use crate::domain::PlanChangeError;
use crate::ports::{
    ImpactReportRepository, MigrationPlanRepository, PlanVersionStore, SubscriptionReader,
    UsageService,
};

const USAGE_LOOKUP_CONCURRENCY: usize = 16;

/// Command to build a migration plan.
#[derive(Debug, Clone)]
pub struct BuildMigrationPlanCommand {
    pub plan_id: PlanId,
    pub impact_report_id: ImpactReportId,
    pub candidates: Vec<PlanId>,
    pub actor: ActorId,
}

/// Handler for building migration plans.
pub struct BuildMigrationPlanHandler {
    plan_store: Arc<dyn PlanVersionStore>,
    reports: Arc<dyn ImpactReportRepository>,
    subscriptions: Arc<dyn SubscriptionReader>,
    usage: Arc<dyn UsageService>,
    migrations: Arc<dyn MigrationPlanRepository>,
}

impl BuildMigrationPlanHandler {
    pub fn new(
        plan_store: Arc<dyn PlanVersionStore>,
        reports: Arc<dyn ImpactReportRepository>,
        subscriptions: Arc<dyn SubscriptionReader>,
        usage: Arc<dyn UsageService>,
        migrations: Arc<dyn MigrationPlanRepository>,
    ) -> Self {
        Self {
            plan_store,
            reports,
            subscriptions,
            usage,
            migrations,
        }
    }

    pub async fn handle(&self, cmd: BuildMigrationPlanCommand) -> Result<MigrationPlan, PlanChangeError> {
        // 1. Report and source plan
        let report = self
            .reports
            .find_by_id(cmd.impact_report_id)
            .await?
            .ok_or_else(|| PlanChangeError::report_not_found(cmd.impact_report_id))?;
        if report.plan_id != cmd.plan_id {
            return Err(PlanChangeError::validation(
                "impact_report_id",
                format!("impact report {} was not produced for plan {}", report.id, cmd.plan_id),
            ));
        }
        let source = self
            .plan_store
            .find_plan(cmd.plan_id)
            .await?
            .ok_or_else(|| PlanChangeError::plan_not_found(cmd.plan_id))?;

        // 2. Candidates
        let candidates = self.load_candidates(&cmd.candidates).await?;

        // 3. Fresh read of the affected subscriptions
        let affected = self
            .subscriptions
            .find_many(&report.affected_subscription_ids)
            .await?;
        let used_features = self.used_features(&source, &affected).await?;

        // 4. Build and store
        let plan = MigrationPlanBuilder::build(
            &report,
            &source,
            &candidates,
            &affected,
            &used_features,
            cmd.actor.clone(),
        )?;
        if !plan.excluded_subscriptions.is_empty() {
            tracing::info!(
                plan_id = %source.id,
                excluded = plan.excluded_subscriptions.len(),
                "Subscriptions left the plan since analysis; excluded"
            );
        }
        self.migrations.save(&plan).await?;

        tracing::info!(
            migration_plan_id = %plan.id,
            plan_id = %source.id,
            report_id = %report.id,
            assigned = plan.target_assignments.len(),
            manual = plan.requires_manual_migration.len(),
            actor = %cmd.actor,
            "Migration plan built"
        );

        Ok(plan)
    }

    async fn load_candidates(&self, ids: &[PlanId]) -> Result<Vec<Plan>, PlanChangeError> {
        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            let plan = self.plan_store.find_plan(*id).await?.ok_or_else(|| {
                PlanChangeError::validation("candidates", format!("unknown plan {}", id))
            })?;
            plans.push(plan);
        }
        Ok(plans)
    }

    /// Source-plan features each subscription actually uses.
    async fn used_features(
        &self,
        source: &Plan,
        affected: &[Subscription],
    ) -> Result<HashMap<SubscriptionId, BTreeSet<String>>, PlanChangeError> {
        let usage = &self.usage;
        let features = &source.config.features;
        let ids: Vec<SubscriptionId> = affected.iter().map(|s| s.id).collect();
        stream::iter(ids)
            .map(|id| async move {
                let mut used = BTreeSet::new();
                for feature in features {
                    if usage.is_using(id, feature).await? {
                        used.insert(feature.clone());
                    }
                }
                Ok::<_, PlanChangeError>((id, used))
            })
            .buffer_unordered(USAGE_LOOKUP_CONCURRENCY)
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::migration::test_support::Engine;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::impact::{FeatureRemoval, PlanDisable, ProposedChange};
    use crate::domain::migration::MigrationStatus;
    use crate::domain::plan::PlanStatus;

    fn disable() -> ProposedChange {
        ProposedChange::PlanDisable(PlanDisable::default())
    }

    fn command(plan_id: PlanId, report_id: ImpactReportId, candidates: Vec<PlanId>) -> BuildMigrationPlanCommand {
        BuildMigrationPlanCommand {
            plan_id,
            impact_report_id: report_id,
            candidates,
            actor: ActorId::system(),
        }
    }

    #[tokio::test]
    async fn assigns_cheapest_covering_candidate() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &["api"]).await;
        let pro = engine.plan("pro", 9_900, &["api", "sso"]).await;
        let team = engine.plan("team", 6_900, &["api"]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        engine.usage.record_usage(sub.id, "api");

        let report = engine.analyze(creator, disable()).await;
        let plan = engine.build(creator, &report, vec![pro, team]).await;

        assert_eq!(plan.status, MigrationStatus::Draft);
        assert_eq!(plan.target_assignments.get(&sub.id), Some(&team));
        assert!(plan.blocking_issues.is_empty());
        assert_eq!(plan.pre_migration_snapshot[&sub.id].assignment, sub.assignment());
    }

    #[tokio::test]
    async fn uncovered_usage_requires_manual_migration() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &["api", "sso"]).await;
        let basic = engine.plan("basic", 1_000, &["api"]).await;
        let sub = engine.subscriber(creator, 3_440).await;
        engine.usage.record_usage(sub.id, "sso");

        let report = engine.analyze(creator, disable()).await;
        let plan = engine.build(creator, &report, vec![basic]).await;

        assert!(plan.target_assignments.is_empty());
        assert!(plan.requires_manual_migration.contains(&sub.id));
        assert_eq!(plan.blocking_issues.len(), 1);
    }

    #[tokio::test]
    async fn report_for_other_plan_is_rejected() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let other = engine.plan("other", 1_000, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let report = engine.analyze(creator, disable()).await;

        let err = engine
            .build_handler()
            .handle(command(other, report.id, vec![]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn unknown_report_is_not_found() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;

        let err = engine
            .build_handler()
            .handle(command(creator, ImpactReportId::new(), vec![]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ImpactReportNotFound);
    }

    #[tokio::test]
    async fn unknown_candidate_is_a_validation_error() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        engine.subscriber(creator, 3_440).await;
        let report = engine.analyze(creator, disable()).await;

        let err = engine
            .build_handler()
            .handle(command(creator, report.id, vec![PlanId::new()]))
            .await
            .unwrap_err();

        assert!(matches!(err, PlanChangeError::Validation { ref field, .. } if field == "candidates"));
    }

    #[tokio::test]
    async fn disabled_candidate_is_rejected() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &[]).await;
        let legacy = engine.plan("legacy", 1_000, &[]).await;
        let mut retired = engine.current_config(legacy).await;
        retired.status = PlanStatus::Disabled;
        engine
            .plans
            .commit(legacy, retired, "retire", &ActorId::system(), 1)
            .await
            .unwrap();
        engine.subscriber(creator, 3_440).await;
        let report = engine.analyze(creator, disable()).await;

        let err = engine
            .build_handler()
            .handle(command(creator, report.id, vec![legacy]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn report_older_than_plan_is_stale() {
        let engine = Engine::new();
        let creator = engine.plan("creator", 3_440, &["api", "sso"]).await;
        engine.subscriber(creator, 3_440).await;
        let report = engine
            .analyze(
                creator,
                ProposedChange::FeatureRemoval(FeatureRemoval {
                    features: vec!["sso".to_string()],
                }),
            )
            .await;
        let mut renamed = engine.current_config(creator).await;
        renamed.name = "creator+".to_string();
        engine
            .plans
            .commit(creator, renamed, "rename", &ActorId::system(), 1)
            .await
            .unwrap();

        let err = engine
            .build_handler()
            .handle(command(creator, report.id, vec![]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::StaleData);
    }
}
