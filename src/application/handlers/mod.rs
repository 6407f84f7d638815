//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.
//!
//! - `plan` - Plan registration, lookup, version history and version rollback
//! - `impact` - Impact analysis and report lookup
//! - `migration` - Migration plan build, review, execution and rollback

pub mod impact;
pub mod migration;
pub mod plan;
