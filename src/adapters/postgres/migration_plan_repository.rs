//! PostgreSQL implementation of MigrationPlanRepository.
//!
//! The plan is stored as JSONB with `status` and `source_plan_id` lifted into
//! columns. The partial unique index `migration_plans_one_active` enforces a
//! single approved or executing plan per source plan.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, MigrationPlanId, PlanId};
use crate::domain::migration::{MigrationPlan, MigrationStatus};
use crate::ports::MigrationPlanRepository;

use super::{db_error, violates};

const ONE_ACTIVE_INDEX: &str = "migration_plans_one_active";

pub struct PostgresMigrationPlanRepository {
    pool: PgPool,
}

impl PostgresMigrationPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn write_error(plan: &MigrationPlan, context: &str, e: sqlx::Error) -> DomainError {
    if violates(&e, ONE_ACTIVE_INDEX) {
        return DomainError::new(
            ErrorCode::ActiveMigrationExists,
            format!("Plan {} already has an active migration plan", plan.source_plan_id),
        );
    }
    db_error(context, e)
}

#[async_trait]
impl MigrationPlanRepository for PostgresMigrationPlanRepository {
    async fn save(&self, plan: &MigrationPlan) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO migration_plans (id, source_plan_id, status, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(plan.source_plan_id.as_uuid())
        .bind(plan.status.as_str())
        .bind(Json(plan))
        .bind(plan.created_at.as_datetime())
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(plan, "Failed to save migration plan", e))?;
        Ok(())
    }

    async fn update(
        &self,
        plan: &MigrationPlan,
        expected_status: MigrationStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE migration_plans SET status = $3, body = $4, updated_at = $5
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(expected_status.as_str())
        .bind(plan.status.as_str())
        .bind(Json(plan))
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(plan, "Failed to update migration plan", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let stored: Option<String> =
            sqlx::query_scalar("SELECT status FROM migration_plans WHERE id = $1")
                .bind(plan.id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to read migration plan status", e))?;
        Err(match stored {
            None => DomainError::new(
                ErrorCode::MigrationPlanNotFound,
                format!("Migration plan not found: {}", plan.id),
            ),
            Some(status) => DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Migration plan {} is {}, expected {}",
                    plan.id, status, expected_status
                ),
            ),
        })
    }

    async fn find_by_id(&self, id: MigrationPlanId) -> Result<Option<MigrationPlan>, DomainError> {
        let row: Option<Json<MigrationPlan>> =
            sqlx::query_scalar("SELECT body FROM migration_plans WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch migration plan", e))?;
        Ok(row.map(|r| r.0))
    }

    async fn find_active_for_plan(
        &self,
        source_plan_id: PlanId,
    ) -> Result<Option<MigrationPlan>, DomainError> {
        let row: Option<Json<MigrationPlan>> = sqlx::query_scalar(
            r#"
            SELECT body FROM migration_plans
            WHERE source_plan_id = $1 AND status IN ('approved', 'executing')
            "#,
        )
        .bind(source_plan_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch active migration plan", e))?;
        Ok(row.map(|r| r.0))
    }
}
