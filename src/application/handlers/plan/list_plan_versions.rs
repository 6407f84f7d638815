//! ListPlanVersionsHandler - Query handler for a plan's version history.

use std::sync::Arc;

use crate::domain::foundation::PlanId;
use crate::domain::plan::PlanVersion;
use crate::domain::PlanChangeError;
use crate::ports::PlanVersionStore;

#[derive(Debug, Clone)]
pub struct ListPlanVersionsQuery {
    pub plan_id: PlanId,
}

pub struct ListPlanVersionsHandler {
    plan_store: Arc<dyn PlanVersionStore>,
}

impl ListPlanVersionsHandler {
    pub fn new(plan_store: Arc<dyn PlanVersionStore>) -> Self {
        Self { plan_store }
    }

    /// Versions ascending; `NotFound` for an unknown plan.
    pub async fn handle(&self, query: ListPlanVersionsQuery) -> Result<Vec<PlanVersion>, PlanChangeError> {
        let versions = self.plan_store.list_versions(query.plan_id).await?;
        if versions.is_empty() {
            return Err(PlanChangeError::plan_not_found(query.plan_id));
        }
        Ok(versions)
    }
}
