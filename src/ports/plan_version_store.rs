//! Plan version store port.
//!
//! Append-only ledger of plan configuration snapshots, plus the `plans`
//! pointer to the latest entry.
//!
//! # Design
//!
//! - **Append-only**: versions are never updated or deleted
//! - **Optimistic**: `commit` names the version the caller read; if the
//!   pointer moved, the commit fails with `VersionConflict` and writes nothing
//! - **Contiguous**: versions of one plan are 1, 2, 3, ... without gaps

use crate::domain::foundation::{ActorId, DomainError, PlanId};
use crate::domain::plan::{Plan, PlanSnapshot, PlanVersion};
use async_trait::async_trait;

/// Port for versioned plan configuration.
#[async_trait]
pub trait PlanVersionStore: Send + Sync {
    /// Register a new plan and write its version 1.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn create_plan(
        &self,
        plan_id: PlanId,
        snapshot: PlanSnapshot,
        actor: &ActorId,
    ) -> Result<PlanVersion, DomainError>;

    /// Append `snapshot` as version `expected_version + 1`.
    ///
    /// Writing the version and advancing the plan pointer is one atomic step.
    ///
    /// # Errors
    ///
    /// - `PlanNotFound` if the plan does not exist
    /// - `VersionConflict` if the plan is no longer at `expected_version`
    /// - `DatabaseError` on persistence failure
    async fn commit(
        &self,
        plan_id: PlanId,
        snapshot: PlanSnapshot,
        reason: &str,
        actor: &ActorId,
        expected_version: u32,
    ) -> Result<PlanVersion, DomainError>;

    /// Fetch one version.
    ///
    /// # Errors
    ///
    /// - `PlanVersionNotFound` if the plan has no such version
    async fn get_version(&self, plan_id: PlanId, version: u32) -> Result<PlanVersion, DomainError>;

    /// Fetch the newest version.
    ///
    /// # Errors
    ///
    /// - `PlanNotFound` if the plan does not exist
    async fn latest(&self, plan_id: PlanId) -> Result<PlanVersion, DomainError>;

    /// Find the plan read model. Returns `None` if not found.
    async fn find_plan(&self, plan_id: PlanId) -> Result<Option<Plan>, DomainError>;

    /// All versions of a plan, ascending. Empty if the plan does not exist.
    async fn list_versions(&self, plan_id: PlanId) -> Result<Vec<PlanVersion>, DomainError>;
}
