//! CancelMigrationHandler - Stops an executing migration.
//!
//! Cancellation is cooperative: steps already in flight finish, nothing new
//! is dispatched, and the executor then rolls back what it migrated.

use std::sync::Arc;

use crate::application::ExecutionRegistry;
use crate::domain::foundation::{ActorId, ErrorCode, MigrationPlanId};
use crate::domain::migration::{MigrationPlan, MigrationStatus};
use crate::domain::PlanChangeError;
use crate::ports::MigrationPlanRepository;

#[derive(Debug, Clone)]
pub struct CancelMigrationCommand {
    pub migration_plan_id: MigrationPlanId,
    pub actor: ActorId,
}

pub struct CancelMigrationHandler {
    migrations: Arc<dyn MigrationPlanRepository>,
    registry: Arc<ExecutionRegistry>,
}

impl CancelMigrationHandler {
    pub fn new(migrations: Arc<dyn MigrationPlanRepository>, registry: Arc<ExecutionRegistry>) -> Self {
        Self {
            migrations,
            registry,
        }
    }

    pub async fn handle(&self, cmd: CancelMigrationCommand) -> Result<MigrationPlan, PlanChangeError> {
        let plan = self
            .migrations
            .find_by_id(cmd.migration_plan_id)
            .await?
            .ok_or_else(|| PlanChangeError::migration_plan_not_found(cmd.migration_plan_id))?;

        if plan.status != MigrationStatus::Executing {
            return Err(PlanChangeError::invalid_state(plan.status.as_str(), "cancel"));
        }
        if !self.registry.cancel(plan.id) {
            return Err(PlanChangeError::Conflict {
                code: ErrorCode::InvalidStateTransition,
                message: format!(
                    "Migration plan {} is not executing on this instance",
                    plan.id
                ),
            });
        }

        tracing::warn!(
            migration_plan_id = %plan.id,
            actor = %cmd.actor,
            "Migration cancellation requested"
        );

        Ok(plan)
    }
}
