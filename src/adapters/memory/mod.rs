//! In-memory adapters.
//!
//! Mutex-backed implementations of every port. Used by tests and by the
//! server when no database is configured. State lives for the life of the
//! process.

mod billing_service;
mod impact_report_repository;
mod migration_plan_repository;
mod notification_service;
mod plan_version_store;
mod subscription_store;
mod usage_service;

pub use billing_service::InMemoryBillingService;
pub use impact_report_repository::InMemoryImpactReportRepository;
pub use migration_plan_repository::InMemoryMigrationPlanRepository;
pub use notification_service::{RecordingNotificationService, SentNotification};
pub use plan_version_store::InMemoryPlanVersionStore;
pub use subscription_store::InMemorySubscriptionStore;
pub use usage_service::InMemoryUsageService;

use std::sync::{Mutex, MutexGuard};

use crate::domain::foundation::{DomainError, ErrorCode};

/// Locks `mutex`, reporting poisoning as an internal error.
fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, DomainError> {
    mutex
        .lock()
        .map_err(|_| DomainError::new(ErrorCode::InternalError, format!("{} lock poisoned", name)))
}
