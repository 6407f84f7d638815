//! Plan module - Versioned plan configuration.
//!
//! A plan's configuration is only ever changed by appending a new
//! `PlanVersion`. The `Plan` read model mirrors the latest version.

mod aggregate;
mod pricing;
mod snapshot;
mod version;

pub use aggregate::{Plan, PlanStatus};
pub use pricing::{BillingPeriod, Pricing};
pub use snapshot::PlanSnapshot;
pub use version::PlanVersion;
