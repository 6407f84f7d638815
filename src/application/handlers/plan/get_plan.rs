//! GetPlanHandler - Query handler for a plan's current state.

use std::sync::Arc;

use crate::domain::foundation::PlanId;
use crate::domain::plan::Plan;
use crate::domain::PlanChangeError;
use crate::ports::PlanVersionStore;

#[derive(Debug, Clone)]
pub struct GetPlanQuery {
    pub plan_id: PlanId,
}

pub struct GetPlanHandler {
    plan_store: Arc<dyn PlanVersionStore>,
}

impl GetPlanHandler {
    pub fn new(plan_store: Arc<dyn PlanVersionStore>) -> Self {
        Self { plan_store }
    }

    pub async fn handle(&self, query: GetPlanQuery) -> Result<Plan, PlanChangeError> {
        self.plan_store
            .find_plan(query.plan_id)
            .await?
            .ok_or_else(|| PlanChangeError::plan_not_found(query.plan_id))
    }
}
