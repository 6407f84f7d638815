//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine)
//! - `plan` - Versioned plan configuration
//! - `subscription` - Workspace subscriptions and their plan assignment
//! - `impact` - Proposed changes, risk policy and the impact analyzer
//! - `migration` - Migration plan lifecycle, target selection and execution policy

pub mod errors;
pub mod foundation;
pub mod impact;
pub mod migration;
pub mod plan;
pub mod subscription;

pub use errors::PlanChangeError;
