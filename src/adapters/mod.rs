//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - Mutex-backed stores and collaborator fakes
//! - `postgres` - sqlx implementations of the storage ports
//! - `collaborators` - reqwest clients for usage, billing and notifications
//! - `http` - axum REST API

pub mod collaborators;
pub mod http;
pub mod memory;
pub mod postgres;
