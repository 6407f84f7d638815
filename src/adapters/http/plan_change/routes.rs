//! Axum router configuration for plan change endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    analyze_change, approve_migration, assign_target, build_migration_plan, cancel_migration,
    create_plan, execute_migration, get_impact_report, get_migration_plan, get_plan, health,
    list_plan_versions, rollback_migration, rollback_plan_version, PlanChangeAppState,
};

/// Plan registration, version history and impact analysis.
pub fn plan_routes() -> Router<PlanChangeAppState> {
    Router::new()
        .route("/", post(create_plan))
        .route("/:id", get(get_plan))
        .route("/:id/versions", get(list_plan_versions))
        .route("/:id/versions/:version/rollback", post(rollback_plan_version))
        .route("/:id/impact-analysis", post(analyze_change))
        .route("/:id/migration-plans", post(build_migration_plan))
}

/// Migration plan review, execution and rollback.
pub fn migration_plan_routes() -> Router<PlanChangeAppState> {
    Router::new()
        .route("/:id", get(get_migration_plan))
        .route("/:id/assignments/:subscription_id", put(assign_target))
        .route("/:id/approve", post(approve_migration))
        .route("/:id/execute", post(execute_migration))
        .route("/:id/cancel", post(cancel_migration))
        .route("/:id/rollback", post(rollback_migration))
}

/// The complete plan change API.
///
/// # Example
///
/// ```ignore
/// let app = plan_change_router().with_state(state);
/// ```
pub fn plan_change_router() -> Router<PlanChangeAppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/plans", plan_routes())
        .route("/impact-reports/:id", get(get_impact_report))
        .nest("/migration-plans", migration_plan_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::{
        InMemoryBillingService, InMemoryImpactReportRepository, InMemoryMigrationPlanRepository,
        InMemoryPlanVersionStore, InMemorySubscriptionStore, InMemoryUsageService,
        RecordingNotificationService,
    };
    use crate::application::ExecutionRegistry;
    use crate::domain::migration::ExecutionPolicy;

    fn test_state() -> PlanChangeAppState {
        let subscriptions = Arc::new(InMemorySubscriptionStore::new());
        PlanChangeAppState {
            plan_store: Arc::new(InMemoryPlanVersionStore::new()),
            subscription_reader: subscriptions.clone(),
            subscription_repository: subscriptions,
            impact_reports: Arc::new(InMemoryImpactReportRepository::new()),
            migration_plans: Arc::new(InMemoryMigrationPlanRepository::new()),
            usage: Arc::new(InMemoryUsageService::new()),
            billing: Arc::new(InMemoryBillingService::new()),
            notifier: Arc::new(RecordingNotificationService::new()),
            registry: Arc::new(ExecutionRegistry::new()),
            policy: ExecutionPolicy::default(),
        }
    }

    #[test]
    fn plan_change_router_creates_router() {
        let _: Router<()> = plan_change_router().with_state(test_state());
    }
}
