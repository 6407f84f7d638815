//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod execution_registry;
pub mod handlers;
mod notifications;

pub use execution_registry::{ExecutionGuard, ExecutionRegistry};
