//! PostgreSQL implementation of ImpactReportRepository.
//!
//! Reports are immutable; the full report is stored as JSONB next to the
//! columns used for lookups.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ImpactReportId};
use crate::domain::impact::ImpactReport;
use crate::ports::ImpactReportRepository;

use super::db_error;

pub struct PostgresImpactReportRepository {
    pool: PgPool,
}

impl PostgresImpactReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImpactReportRepository for PostgresImpactReportRepository {
    async fn save(&self, report: &ImpactReport) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO impact_reports (id, plan_id, plan_version, report, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(report.id.as_uuid())
        .bind(report.plan_id.as_uuid())
        .bind(report.plan_version as i32)
        .bind(Json(report))
        .bind(report.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save impact report", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: ImpactReportId) -> Result<Option<ImpactReport>, DomainError> {
        let row: Option<Json<ImpactReport>> =
            sqlx::query_scalar("SELECT report FROM impact_reports WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch impact report", e))?;
        Ok(row.map(|r| r.0))
    }
}
