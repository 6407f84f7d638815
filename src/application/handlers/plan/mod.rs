//! Plan handlers.
//!
//! ## Commands
//! - Registering a plan (version 1)
//! - Rolling a plan back to an earlier version
//!
//! ## Queries
//! - Get plan
//! - List plan versions

mod create_plan;
mod get_plan;
mod list_plan_versions;
mod rollback_plan_version;

// Commands
pub use create_plan::{CreatePlanCommand, CreatePlanHandler, CreatePlanResult};
pub use rollback_plan_version::{
    RollbackPlanVersionCommand, RollbackPlanVersionHandler, RollbackPlanVersionResult,
};

// Queries
pub use get_plan::{GetPlanHandler, GetPlanQuery};
pub use list_plan_versions::{ListPlanVersionsHandler, ListPlanVersionsQuery};
