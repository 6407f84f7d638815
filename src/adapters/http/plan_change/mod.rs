//! HTTP adapter for the plan change engine.
//!
//! - `POST /plans` - Register a plan (version 1)
//! - `GET /plans/:id` - Current plan state
//! - `GET /plans/:id/versions` - Version history
//! - `POST /plans/:id/versions/:version/rollback` - Restore an earlier version
//! - `POST /plans/:id/impact-analysis` - Analyze a proposed change
//! - `GET /impact-reports/:id` - Stored impact report
//! - `POST /plans/:id/migration-plans` - Build a draft migration plan
//! - `GET /migration-plans/:id` - Migration plan state
//! - `PUT /migration-plans/:id/assignments/:subscription_id` - Manual target assignment
//! - `POST /migration-plans/:id/approve` - Approve a draft
//! - `POST /migration-plans/:id/execute` - Run an approved plan
//! - `POST /migration-plans/:id/cancel` - Stop a running execution
//! - `POST /migration-plans/:id/rollback` - Revert a finished run
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ActorHeader, PlanChangeApiError, PlanChangeAppState};
pub use routes::plan_change_router;
