//! In-memory migration plan repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, MigrationPlanId, PlanId};
use crate::domain::migration::{MigrationPlan, MigrationStatus};
use crate::ports::MigrationPlanRepository;

use super::lock;

/// Migration plans keyed by id.
///
/// The active-plan check and the write happen under one lock.
#[derive(Default)]
pub struct InMemoryMigrationPlanRepository {
    plans: Mutex<HashMap<MigrationPlanId, MigrationPlan>>,
}

impl InMemoryMigrationPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_no_other_active(
    plans: &HashMap<MigrationPlanId, MigrationPlan>,
    plan: &MigrationPlan,
) -> Result<(), DomainError> {
    if !plan.is_active() {
        return Ok(());
    }
    match plans
        .values()
        .find(|p| p.id != plan.id && p.source_plan_id == plan.source_plan_id && p.is_active())
    {
        Some(existing) => Err(DomainError::new(
            ErrorCode::ActiveMigrationExists,
            format!(
                "Plan {} already has an active migration plan {}",
                plan.source_plan_id, existing.id
            ),
        )),
        None => Ok(()),
    }
}

#[async_trait]
impl MigrationPlanRepository for InMemoryMigrationPlanRepository {
    async fn save(&self, plan: &MigrationPlan) -> Result<(), DomainError> {
        let mut plans = lock(&self.plans, "migration plans")?;
        ensure_no_other_active(&plans, plan)?;
        plans.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn update(
        &self,
        plan: &MigrationPlan,
        expected_status: MigrationStatus,
    ) -> Result<(), DomainError> {
        let mut plans = lock(&self.plans, "migration plans")?;
        let stored = plans.get(&plan.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::MigrationPlanNotFound,
                format!("Migration plan not found: {}", plan.id),
            )
        })?;
        if stored.status != expected_status {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Migration plan {} is {}, expected {}",
                    plan.id, stored.status, expected_status
                ),
            ));
        }
        ensure_no_other_active(&plans, plan)?;
        plans.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MigrationPlanId) -> Result<Option<MigrationPlan>, DomainError> {
        Ok(lock(&self.plans, "migration plans")?.get(&id).cloned())
    }

    async fn find_active_for_plan(
        &self,
        source_plan_id: PlanId,
    ) -> Result<Option<MigrationPlan>, DomainError> {
        let plans = lock(&self.plans, "migration plans")?;
        Ok(plans
            .values()
            .find(|p| p.source_plan_id == source_plan_id && p.is_active())
            .cloned())
    }
}
