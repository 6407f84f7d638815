//! Migration module - Moving subscriptions off a changed plan.
//!
//! - `builder` - Target selection and draft plan construction
//! - `aggregate` - The `MigrationPlan` lifecycle
//! - `policy` - Executor concurrency, timeout, retry and abort settings

mod aggregate;
mod builder;
mod outcome;
mod policy;
mod status;
mod summary;

pub use aggregate::{BlockingIssue, MigrationPlan, PreMigrationEntry};
pub use builder::{select_target, MigrationPlanBuilder};
pub use outcome::{StepOutcome, StepStatus};
pub use policy::ExecutionPolicy;
pub use status::MigrationStatus;
pub use summary::{ExecutionSummary, FailedStep, MigrationOutcome};
