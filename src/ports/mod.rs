//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `PlanVersionStore` - Append-only plan version ledger
//! - `SubscriptionReader` / `SubscriptionRepository` - Subscription reads and assignment writes
//! - `ImpactReportRepository` - Immutable impact reports
//! - `MigrationPlanRepository` - Migration plans with guarded status updates
//!
//! ## Collaborator Ports
//!
//! - `UsageService` - Feature and limit usage lookups
//! - `BillingService` - Subscription repricing
//! - `NotificationService` - Workspace notices

mod billing_service;
mod impact_report_repository;
mod migration_plan_repository;
mod notification_service;
mod plan_version_store;
mod subscription_reader;
mod subscription_repository;
mod usage_service;

pub use billing_service::BillingService;
pub use impact_report_repository::ImpactReportRepository;
pub use migration_plan_repository::MigrationPlanRepository;
pub use notification_service::{templates, NotificationService};
pub use plan_version_store::PlanVersionStore;
pub use subscription_reader::SubscriptionReader;
pub use subscription_repository::SubscriptionRepository;
pub use usage_service::UsageService;
