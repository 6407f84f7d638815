//! Subscription module - Workspace subscriptions to plans.
//!
//! The engine only reads subscriptions and reassigns their plan pointer;
//! everything else about a subscription is owned by the billing platform.

mod aggregate;

pub use aggregate::{AssignmentSnapshot, Subscription, SubscriptionStatus};
