//! HTTP adapters - REST API implementations.

pub mod plan_change;

pub use plan_change::{plan_change_router, PlanChangeAppState};
