//! Migration handlers.
//!
//! ## Commands
//! - Building a migration plan from an impact report
//! - Manual assignment of subscriptions flagged for review
//! - Approval, execution, cancellation and rollback
//!
//! ## Queries
//! - Get migration plan

mod approve_migration;
mod assign_manually;
mod build_migration_plan;
mod cancel_migration;
mod compensation;
mod execute_migration;
mod get_migration_plan;
mod rollback_migration;

// Commands
pub use approve_migration::{ApproveMigrationCommand, ApproveMigrationHandler};
pub use assign_manually::{AssignManuallyCommand, AssignManuallyHandler};
pub use build_migration_plan::{BuildMigrationPlanCommand, BuildMigrationPlanHandler};
pub use cancel_migration::{CancelMigrationCommand, CancelMigrationHandler};
pub use execute_migration::{
    ExecuteMigrationCommand, ExecuteMigrationHandler, ExecuteMigrationResult,
};
pub use rollback_migration::{RollbackMigrationCommand, RollbackMigrationHandler};

// Queries
pub use get_migration_plan::{GetMigrationPlanHandler, GetMigrationPlanQuery};
