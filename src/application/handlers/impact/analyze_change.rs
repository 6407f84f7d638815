//! AnalyzeChangeHandler - Command handler for impact analysis.
//!
//! Reads the live plan and subscription snapshot, asks the usage service
//! which subscribers rely on the keys a change removes, scores the change
//! and stores the report. Nothing else is mutated.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::application::notifications::spawn_notices;
use crate::domain::foundation::{ActorId, PlanId, SubscriptionId};
use crate::domain::impact::{ImpactAnalyzer, ImpactReport, ProposedChange};
use crate::domain::subscription::Subscription;
use crate::domain::PlanChangeError;
use crate::ports::{
    templates, ImpactReportRepository, NotificationService, PlanVersionStore, SubscriptionReader,
    UsageService,
};

/// Usage lookups in flight at once.
const USAGE_LOOKUP_CONCURRENCY: usize = 16;

/// Command to analyze a proposed change.
#[derive(Debug, Clone)]
pub struct AnalyzeChangeCommand {
    pub plan_id: PlanId,
    pub change: ProposedChange,
    pub actor: ActorId,
}

/// Handler for impact analysis.
pub struct AnalyzeChangeHandler {
    plan_store: Arc<dyn PlanVersionStore>,
    subscriptions: Arc<dyn SubscriptionReader>,
    usage: Arc<dyn UsageService>,
    reports: Arc<dyn ImpactReportRepository>,
    notifier: Arc<dyn NotificationService>,
}

impl AnalyzeChangeHandler {
    pub fn new(
        plan_store: Arc<dyn PlanVersionStore>,
        subscriptions: Arc<dyn SubscriptionReader>,
        usage: Arc<dyn UsageService>,
        reports: Arc<dyn ImpactReportRepository>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            plan_store,
            subscriptions,
            usage,
            reports,
            notifier,
        }
    }

    pub async fn handle(&self, cmd: AnalyzeChangeCommand) -> Result<ImpactReport, PlanChangeError> {
        // 1. Unknown plans are a validation failure, not a lookup miss
        let plan = self
            .plan_store
            .find_plan(cmd.plan_id)
            .await?
            .ok_or_else(|| {
                PlanChangeError::validation("plan_id", format!("unknown plan {}", cmd.plan_id))
            })?;
        cmd.change.validate(plan.snapshot())?;

        // 2. Live snapshot
        let snapshot = self.subscriptions.snapshot(plan.id).await?;

        // 3. Who relies on the removed keys
        let relying = match cmd.change.usage_keys() {
            Some(keys) => self.relying_subscriptions(&snapshot, &keys).await?,
            None => HashSet::new(),
        };

        // 4. Score and store
        let report = ImpactAnalyzer::analyze(&plan, &cmd.change, &snapshot, &relying)?;
        self.reports.save(&report).await?;

        tracing::info!(
            report_id = %report.id,
            plan_id = %plan.id,
            plan_version = report.plan_version,
            change_type = %report.change_type,
            affected_count = report.affected_count,
            revenue_at_risk = %report.revenue_at_risk,
            risk_level = %report.risk_level,
            actor = %cmd.actor,
            "Impact analysis completed"
        );

        // 5. Advance notice to affected workspaces
        if report.warrants_notice() {
            let affected: HashSet<SubscriptionId> =
                report.affected_subscription_ids.iter().copied().collect();
            let workspaces: BTreeSet<_> = snapshot
                .iter()
                .filter(|s| affected.contains(&s.id))
                .map(|s| s.workspace_id)
                .collect();
            let params = BTreeMap::from([
                ("plan_id".to_string(), plan.id.to_string()),
                ("plan_name".to_string(), plan.config.name.clone()),
                ("change_type".to_string(), report.change_type.to_string()),
                ("risk_level".to_string(), report.risk_level.to_string()),
            ]);
            spawn_notices(&self.notifier, workspaces, templates::PLAN_CHANGE_NOTICE, params);
        }

        Ok(report)
    }

    async fn relying_subscriptions(
        &self,
        snapshot: &[Subscription],
        keys: &[String],
    ) -> Result<HashSet<SubscriptionId>, PlanChangeError> {
        let usage = &self.usage;
        let ids: Vec<SubscriptionId> = snapshot.iter().map(|s| s.id).collect();
        let hits: Vec<Option<SubscriptionId>> = stream::iter(ids)
            .map(|id| async move {
                for key in keys {
                    if usage.is_using(id, key).await? {
                        return Ok(Some(id));
                    }
                }
                Ok::<_, PlanChangeError>(None)
            })
            .buffer_unordered(USAGE_LOOKUP_CONCURRENCY)
            .try_collect()
            .await?;
        Ok(hits.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryImpactReportRepository, InMemoryPlanVersionStore, InMemorySubscriptionStore,
        InMemoryUsageService, RecordingNotificationService,
    };
    use crate::application::handlers::plan::test_support::snapshot;
    use crate::domain::foundation::{ErrorCode, Money, WorkspaceId};
    use crate::domain::impact::{ChangeType, FeatureRemoval, PlanDisable, RiskLevel};
    use crate::ports::SubscriptionRepository;
    use std::time::Duration;

    // ════════════════════════════════════════════════════════════════════════════
    // Fixture
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        plans: Arc<InMemoryPlanVersionStore>,
        subscriptions: Arc<InMemorySubscriptionStore>,
        usage: Arc<InMemoryUsageService>,
        reports: Arc<InMemoryImpactReportRepository>,
        notifier: Arc<RecordingNotificationService>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                plans: Arc::new(InMemoryPlanVersionStore::new()),
                subscriptions: Arc::new(InMemorySubscriptionStore::new()),
                usage: Arc::new(InMemoryUsageService::new()),
                reports: Arc::new(InMemoryImpactReportRepository::new()),
                notifier: Arc::new(RecordingNotificationService::new()),
            }
        }

        fn handler(&self) -> AnalyzeChangeHandler {
            AnalyzeChangeHandler::new(
                self.plans.clone(),
                self.subscriptions.clone(),
                self.usage.clone(),
                self.reports.clone(),
                self.notifier.clone(),
            )
        }

        async fn plan(&self, features: &[&str]) -> PlanId {
            let id = PlanId::new();
            self.plans
                .create_plan(id, snapshot("creator", 3_440, features), &ActorId::system())
                .await
                .unwrap();
            id
        }

        async fn subscriber(&self, plan_id: PlanId, cents: i64) -> Subscription {
            let sub = Subscription::new(WorkspaceId::new(), plan_id, 1, Money::from_cents(cents).unwrap());
            self.subscriptions.insert(&sub).await.unwrap();
            sub
        }
    }

    fn command(plan_id: PlanId, change: ProposedChange) -> AnalyzeChangeCommand {
        AnalyzeChangeCommand {
            plan_id,
            change,
            actor: ActorId::system(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn creator_disable_is_critical_and_persisted() {
        let fx = Fixture::new();
        let plan_id = fx.plan(&["api"]).await;
        fx.subscriber(plan_id, 3_440).await;

        let report = fx
            .handler()
            .handle(command(plan_id, ProposedChange::PlanDisable(PlanDisable::default())))
            .await
            .unwrap();

        assert_eq!(report.change_type, ChangeType::PlanDisable);
        assert_eq!(report.affected_count, 1);
        assert_eq!(report.revenue_at_risk.cents(), 3_440);
        assert_eq!(report.risk_level, RiskLevel::Critical);
        assert!(report.recommendations.iter().any(|r| r.contains("advance notice")));
        assert_eq!(fx.reports.find_by_id(report.id).await.unwrap(), Some(report));
    }

    #[tokio::test]
    async fn feature_removal_consults_usage() {
        let fx = Fixture::new();
        let plan_id = fx.plan(&["api", "sso"]).await;
        let user = fx.subscriber(plan_id, 2_000).await;
        fx.subscriber(plan_id, 9_000).await;
        fx.usage.record_usage(user.id, "sso");

        let change = ProposedChange::FeatureRemoval(FeatureRemoval {
            features: vec!["sso".to_string()],
        });
        let report = fx.handler().handle(command(plan_id, change)).await.unwrap();

        assert_eq!(report.affected_subscription_ids, vec![user.id]);
        assert_eq!(report.revenue_at_risk.cents(), 2_000);
    }

    #[tokio::test]
    async fn unknown_plan_is_a_validation_error() {
        let fx = Fixture::new();
        let err = fx
            .handler()
            .handle(command(PlanId::new(), ProposedChange::PlanDisable(PlanDisable::default())))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn invalid_disable_date_is_rejected_before_anything_is_stored() {
        let fx = Fixture::new();
        let plan_id = fx.plan(&[]).await;
        let change = ProposedChange::PlanDisable(PlanDisable {
            disable_date: Some("invalid-date-format".to_string()),
        });

        let err = fx.handler().handle(command(plan_id, change)).await.unwrap_err();

        assert!(matches!(err, PlanChangeError::Validation { ref field, .. } if field == "disable_date"));
    }

    #[tokio::test]
    async fn critical_report_notifies_affected_workspaces() {
        let fx = Fixture::new();
        let plan_id = fx.plan(&[]).await;
        let sub = fx.subscriber(plan_id, 3_440).await;

        fx.handler()
            .handle(command(plan_id, ProposedChange::PlanDisable(PlanDisable::default())))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let sent = fx.notifier.sent_with_template(templates::PLAN_CHANGE_NOTICE);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].workspace_id, sub.workspace_id);
    }
}
