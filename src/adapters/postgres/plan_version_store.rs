//! PostgreSQL implementation of PlanVersionStore.
//!
//! `plans.current_version` is the pointer; `plan_versions` is the ledger.
//! A commit advances the pointer with a conditional `UPDATE` and inserts the
//! new version in the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{ActorId, DomainError, ErrorCode, PlanId, Timestamp};
use crate::domain::plan::{Plan, PlanSnapshot, PlanVersion};
use crate::ports::PlanVersionStore;

use super::{db_error, to_version, violates};

pub struct PostgresPlanVersionStore {
    pool: PgPool,
}

impl PostgresPlanVersionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VersionRow {
    plan_id: Uuid,
    version: i32,
    snapshot: Json<PlanSnapshot>,
    created_by: String,
    change_reason: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<VersionRow> for PlanVersion {
    type Error = DomainError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        Ok(PlanVersion {
            plan_id: PlanId::from_uuid(row.plan_id),
            version: to_version(row.version)?,
            snapshot: row.snapshot.0,
            created_at: Timestamp::from_datetime(row.created_at),
            created_by: ActorId::new(row.created_by)
                .map_err(|e| DomainError::database(format!("Invalid created_by: {}", e)))?,
            change_reason: row.change_reason,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    current_version: i32,
    snapshot: Json<PlanSnapshot>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(Plan {
            id: PlanId::from_uuid(row.id),
            current_version: to_version(row.current_version)?,
            config: row.snapshot.0,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_VERSION: &str = r#"
    SELECT plan_id, version, snapshot, created_by, change_reason, created_at
    FROM plan_versions
"#;

async fn insert_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    version: &PlanVersion,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO plan_versions (plan_id, version, snapshot, created_by, change_reason, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(version.plan_id.as_uuid())
    .bind(version.version as i32)
    .bind(Json(&version.snapshot))
    .bind(version.created_by.as_str())
    .bind(&version.change_reason)
    .bind(version.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to insert plan version", e))?;
    Ok(())
}

#[async_trait]
impl PlanVersionStore for PostgresPlanVersionStore {
    async fn create_plan(
        &self,
        plan_id: PlanId,
        snapshot: PlanSnapshot,
        actor: &ActorId,
    ) -> Result<PlanVersion, DomainError> {
        let version = PlanVersion::initial(plan_id, snapshot, actor.clone());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO plans (id, current_version, created_at, updated_at)
            VALUES ($1, 1, $2, $2)
            "#,
        )
        .bind(plan_id.as_uuid())
        .bind(version.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, "plans_pkey") {
                return DomainError::validation("plan_id", format!("Plan {} already exists", plan_id));
            }
            db_error("Failed to create plan", e)
        })?;
        insert_version(&mut tx, &version).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit plan creation", e))?;
        Ok(version)
    }

    async fn commit(
        &self,
        plan_id: PlanId,
        snapshot: PlanSnapshot,
        reason: &str,
        actor: &ActorId,
        expected_version: u32,
    ) -> Result<PlanVersion, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let version = PlanVersion {
            plan_id,
            version: expected_version + 1,
            snapshot,
            created_at: Timestamp::now(),
            created_by: actor.clone(),
            change_reason: reason.to_string(),
        };

        let moved = sqlx::query(
            r#"
            UPDATE plans SET current_version = $3, updated_at = $4
            WHERE id = $1 AND current_version = $2
            "#,
        )
        .bind(plan_id.as_uuid())
        .bind(expected_version as i32)
        .bind(version.version as i32)
        .bind(version.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to advance plan version", e))?;

        if moved.rows_affected() == 0 {
            let actual: Option<i32> =
                sqlx::query_scalar("SELECT current_version FROM plans WHERE id = $1")
                    .bind(plan_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| db_error("Failed to read plan version", e))?;
            return Err(match actual {
                None => DomainError::new(ErrorCode::PlanNotFound, format!("Plan not found: {}", plan_id)),
                Some(actual) => DomainError::new(
                    ErrorCode::VersionConflict,
                    format!("Plan {} is at version {}, expected {}", plan_id, actual, expected_version),
                )
                .with_detail("expected", expected_version.to_string())
                .with_detail("actual", actual.to_string()),
            });
        }

        insert_version(&mut tx, &version).await?;
        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit plan version", e))?;
        Ok(version)
    }

    async fn get_version(&self, plan_id: PlanId, version: u32) -> Result<PlanVersion, DomainError> {
        let row: Option<VersionRow> =
            sqlx::query_as(&format!("{} WHERE plan_id = $1 AND version = $2", SELECT_VERSION))
                .bind(plan_id.as_uuid())
                .bind(version as i32)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch plan version", e))?;

        row.ok_or_else(|| {
            DomainError::new(
                ErrorCode::PlanVersionNotFound,
                format!("Plan {} has no version {}", plan_id, version),
            )
        })?
        .try_into()
    }

    async fn latest(&self, plan_id: PlanId) -> Result<PlanVersion, DomainError> {
        let row: Option<VersionRow> = sqlx::query_as(&format!(
            "{} WHERE plan_id = $1 ORDER BY version DESC LIMIT 1",
            SELECT_VERSION
        ))
        .bind(plan_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch latest plan version", e))?;

        row.ok_or_else(|| DomainError::new(ErrorCode::PlanNotFound, format!("Plan not found: {}", plan_id)))?
            .try_into()
    }

    async fn find_plan(&self, plan_id: PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.current_version, v.snapshot, p.created_at, p.updated_at
            FROM plans p
            JOIN plan_versions v ON v.plan_id = p.id AND v.version = p.current_version
            WHERE p.id = $1
            "#,
        )
        .bind(plan_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch plan", e))?;

        row.map(Plan::try_from).transpose()
    }

    async fn list_versions(&self, plan_id: PlanId) -> Result<Vec<PlanVersion>, DomainError> {
        let rows: Vec<VersionRow> =
            sqlx::query_as(&format!("{} WHERE plan_id = $1 ORDER BY version", SELECT_VERSION))
                .bind(plan_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("Failed to list plan versions", e))?;

        rows.into_iter().map(PlanVersion::try_from).collect()
    }
}
