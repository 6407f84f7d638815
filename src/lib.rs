//! Planshift - Plan Change Impact & Migration Engine
//!
//! Lets an operator change a subscription plan's pricing, features, limits
//! or availability, see the effect on paying subscriptions before
//! committing, then migrate those subscriptions or roll the change back.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
