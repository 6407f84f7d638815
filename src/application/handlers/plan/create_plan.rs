//! CreatePlanHandler - Command handler for registering plans.

use std::sync::Arc;

use crate::domain::foundation::{ActorId, PlanId};
use crate::domain::plan::{Plan, PlanSnapshot, PlanVersion};
use crate::domain::PlanChangeError;
use crate::ports::PlanVersionStore;

/// Command to register a new plan.
#[derive(Debug, Clone)]
pub struct CreatePlanCommand {
    pub snapshot: PlanSnapshot,
    pub actor: ActorId,
}

#[derive(Debug, Clone)]
pub struct CreatePlanResult {
    pub plan: Plan,
    pub version: PlanVersion,
}

/// Handler for registering plans.
pub struct CreatePlanHandler {
    plan_store: Arc<dyn PlanVersionStore>,
}

impl CreatePlanHandler {
    pub fn new(plan_store: Arc<dyn PlanVersionStore>) -> Self {
        Self { plan_store }
    }

    pub async fn handle(&self, cmd: CreatePlanCommand) -> Result<CreatePlanResult, PlanChangeError> {
        cmd.snapshot.validate()?;

        let plan_id = PlanId::new();
        let version = self
            .plan_store
            .create_plan(plan_id, cmd.snapshot, &cmd.actor)
            .await?;

        tracing::info!(
            plan_id = %plan_id,
            actor = %cmd.actor,
            name = %version.snapshot.name,
            "Plan created"
        );

        Ok(CreatePlanResult {
            plan: Plan::from_initial(&version),
            version,
        })
    }
}
