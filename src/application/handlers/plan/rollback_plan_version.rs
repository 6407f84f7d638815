//! RollbackPlanVersionHandler - Command handler for restoring an earlier
//! plan configuration.
//!
//! A rollback never rewrites history. It appends a new version whose
//! snapshot equals the chosen one.

use std::sync::Arc;

use crate::domain::foundation::{ActorId, PlanId};
use crate::domain::plan::PlanVersion;
use crate::domain::PlanChangeError;
use crate::ports::PlanVersionStore;

#[derive(Debug, Clone)]
pub struct RollbackPlanVersionCommand {
    pub plan_id: PlanId,
    pub to_version: u32,
    pub actor: ActorId,
}

#[derive(Debug, Clone)]
pub struct RollbackPlanVersionResult {
    /// The newly appended version.
    pub version: PlanVersion,
    pub restored_from: u32,
}

pub struct RollbackPlanVersionHandler {
    plan_store: Arc<dyn PlanVersionStore>,
}

impl RollbackPlanVersionHandler {
    pub fn new(plan_store: Arc<dyn PlanVersionStore>) -> Self {
        Self { plan_store }
    }

    pub async fn handle(
        &self,
        cmd: RollbackPlanVersionCommand,
    ) -> Result<RollbackPlanVersionResult, PlanChangeError> {
        let target = self.plan_store.get_version(cmd.plan_id, cmd.to_version).await?;
        let latest = self.plan_store.latest(cmd.plan_id).await?;

        let version = self
            .plan_store
            .commit(
                cmd.plan_id,
                target.snapshot,
                &format!("rollback to version {}", cmd.to_version),
                &cmd.actor,
                latest.version,
            )
            .await?;

        tracing::info!(
            plan_id = %cmd.plan_id,
            restored_from = cmd.to_version,
            new_version = version.version,
            actor = %cmd.actor,
            "Plan version rolled back"
        );

        Ok(RollbackPlanVersionResult {
            version,
            restored_from: cmd.to_version,
        })
    }
}
