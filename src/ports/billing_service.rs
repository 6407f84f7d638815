//! Billing service port.
//!
//! Repricing is part of every migration step and of every compensation.
//!
//! # Design
//!
//! - **Idempotent**: repricing to the plan a subscription is already billed
//!   on succeeds without side effects, so steps can be retried

use crate::domain::foundation::{DomainError, PlanId, SubscriptionId};
use async_trait::async_trait;

#[async_trait]
pub trait BillingService: Send + Sync {
    /// Bill `subscription_id` according to `new_plan_id` from now on.
    ///
    /// # Errors
    ///
    /// - `CollaboratorError` if the billing platform rejects or fails the call
    async fn reprice(&self, subscription_id: SubscriptionId, new_plan_id: PlanId) -> Result<(), DomainError>;
}
