//! Migration plan repository port.
//!
//! # Design
//!
//! - **Guarded updates**: `update` applies only if the stored status still
//!   equals the status the caller loaded, so two executors cannot both move
//!   a plan out of `approved`
//! - **One active plan**: at most one approved or executing migration plan
//!   per source plan; implementations enforce this atomically

use crate::domain::foundation::{DomainError, MigrationPlanId, PlanId};
use crate::domain::migration::{MigrationPlan, MigrationStatus};
use async_trait::async_trait;

#[async_trait]
pub trait MigrationPlanRepository: Send + Sync {
    /// Persist a new migration plan.
    ///
    /// # Errors
    ///
    /// - `ActiveMigrationExists` if the plan is active and another active plan
    ///   exists for the same source plan
    /// - `DatabaseError` on persistence failure
    async fn save(&self, plan: &MigrationPlan) -> Result<(), DomainError>;

    /// Overwrite a stored plan whose status is still `expected_status`.
    ///
    /// # Errors
    ///
    /// - `MigrationPlanNotFound` if the plan does not exist
    /// - `InvalidStateTransition` if the stored status is no longer `expected_status`
    /// - `ActiveMigrationExists` if the update would make a second active plan
    /// - `DatabaseError` on persistence failure
    async fn update(
        &self,
        plan: &MigrationPlan,
        expected_status: MigrationStatus,
    ) -> Result<(), DomainError>;

    /// Find a plan by id. Returns `None` if not found.
    async fn find_by_id(&self, id: MigrationPlanId) -> Result<Option<MigrationPlan>, DomainError>;

    /// The approved or executing plan for `source_plan_id`, if any.
    async fn find_active_for_plan(
        &self,
        source_plan_id: PlanId,
    ) -> Result<Option<MigrationPlan>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_plan_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn MigrationPlanRepository) {}
    }
}
