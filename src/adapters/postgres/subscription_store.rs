//! PostgreSQL implementation of SubscriptionReader and SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, Money, PlanId, SubscriptionId, Timestamp, WorkspaceId,
};
use crate::domain::subscription::{AssignmentSnapshot, Subscription, SubscriptionStatus};
use crate::ports::{SubscriptionReader, SubscriptionRepository};

use super::{db_error, to_version};

pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    workspace_id: Uuid,
    plan_id: Uuid,
    plan_version_at_subscribe: i32,
    status: String,
    billing_amount_cents: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            workspace_id: WorkspaceId::from_uuid(row.workspace_id),
            plan_id: PlanId::from_uuid(row.plan_id),
            plan_version_at_subscribe: to_version(row.plan_version_at_subscribe)?,
            status: row
                .status
                .parse::<SubscriptionStatus>()
                .map_err(|e| DomainError::database(format!("Invalid subscription status: {}", e)))?,
            billing_amount: Money::from_cents(row.billing_amount_cents)
                .map_err(|e| DomainError::database(format!("Invalid billing amount: {}", e)))?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

const SELECT_SUBSCRIPTION: &str = r#"
    SELECT id, workspace_id, plan_id, plan_version_at_subscribe, status,
           billing_amount_cents, created_at
    FROM subscriptions
"#;

#[async_trait]
impl SubscriptionReader for PostgresSubscriptionStore {
    async fn snapshot(&self, plan_id: PlanId) -> Result<Vec<Subscription>, DomainError> {
        // One consistent view even if writers commit mid-read.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin snapshot", e))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to set snapshot isolation", e))?;

        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE plan_id = $1 AND status = $2 ORDER BY id",
            SELECT_SUBSCRIPTION
        ))
        .bind(plan_id.as_uuid())
        .bind(SubscriptionStatus::Active.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to read subscription snapshot", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to close snapshot", e))?;
        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_many(&self, ids: &[SubscriptionId]) -> Result<Vec<Subscription>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE id = ANY($1) ORDER BY id", SELECT_SUBSCRIPTION))
                .bind(&uuids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch subscriptions", e))?;
        rows.into_iter().map(Subscription::try_from).collect()
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionStore {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, workspace_id, plan_id, plan_version_at_subscribe, status,
                billing_amount_cents, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.workspace_id.as_uuid())
        .bind(subscription.plan_id.as_uuid())
        .bind(subscription.plan_version_at_subscribe as i32)
        .bind(subscription.status.as_str())
        .bind(subscription.billing_amount.cents())
        .bind(subscription.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert subscription", e))?;
        Ok(())
    }

    async fn compare_and_set_assignment(
        &self,
        id: SubscriptionId,
        expected: &AssignmentSnapshot,
        new: &AssignmentSnapshot,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET plan_id = $5, plan_version_at_subscribe = $6, status = $7
            WHERE id = $1
              AND plan_id = $2 AND plan_version_at_subscribe = $3 AND status = $4
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected.plan_id.as_uuid())
        .bind(expected.plan_version_at_subscribe as i32)
        .bind(expected.status.as_str())
        .bind(new.plan_id.as_uuid())
        .bind(new.plan_version_at_subscribe as i32)
        .bind(new.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update subscription assignment", e))?;

        Ok(result.rows_affected() == 1)
    }
}
