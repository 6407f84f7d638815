//! PostgreSQL adapters - sqlx implementations of the storage ports.
//!
//! - `PostgresPlanVersionStore` - Version ledger with optimistic pointer updates
//! - `PostgresSubscriptionStore` - Snapshot reads and compare-and-set assignment writes
//! - `PostgresImpactReportRepository` - Immutable JSONB reports
//! - `PostgresMigrationPlanRepository` - Status-guarded plan updates
//!
//! Schema lives in `migrations/`; see [`run_migrations`].

mod impact_report_repository;
mod migration_plan_repository;
mod plan_version_store;
mod subscription_store;

pub use impact_report_repository::PostgresImpactReportRepository;
pub use migration_plan_repository::PostgresMigrationPlanRepository;
pub use plan_version_store::PostgresPlanVersionStore;
pub use subscription_store::PostgresSubscriptionStore;

use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Applies the embedded schema migrations.
///
/// # Errors
///
/// `DatabaseError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

/// True if `e` violated the named constraint.
fn violates(e: &sqlx::Error, constraint: &str) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

fn to_version(raw: i32) -> Result<u32, DomainError> {
    u32::try_from(raw).map_err(|_| DomainError::database(format!("Invalid stored version: {}", raw)))
}
