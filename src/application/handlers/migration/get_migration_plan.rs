//! GetMigrationPlanHandler - Query handler for migration plans.

use std::sync::Arc;

use crate::domain::foundation::MigrationPlanId;
use crate::domain::migration::MigrationPlan;
use crate::domain::PlanChangeError;
use crate::ports::MigrationPlanRepository;

#[derive(Debug, Clone)]
pub struct GetMigrationPlanQuery {
    pub migration_plan_id: MigrationPlanId,
}

pub struct GetMigrationPlanHandler {
    migrations: Arc<dyn MigrationPlanRepository>,
}

impl GetMigrationPlanHandler {
    pub fn new(migrations: Arc<dyn MigrationPlanRepository>) -> Self {
        Self { migrations }
    }

    pub async fn handle(&self, query: GetMigrationPlanQuery) -> Result<MigrationPlan, PlanChangeError> {
        self.migrations
            .find_by_id(query.migration_plan_id)
            .await?
            .ok_or_else(|| PlanChangeError::migration_plan_not_found(query.migration_plan_id))
    }
}
