//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, errors and the state machine
//! trait that form the vocabulary of the plan migration domain.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ActorId, ImpactReportId, MigrationPlanId, PlanId, SubscriptionId, WorkspaceId};
pub use money::Money;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
