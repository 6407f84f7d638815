//! Subscription reader port (read side).
//!
//! Point-in-time views over subscriptions. Nothing here writes.

use crate::domain::foundation::{DomainError, PlanId, SubscriptionId};
use crate::domain::subscription::Subscription;
use async_trait::async_trait;

/// Read-only access to subscriptions.
#[async_trait]
pub trait SubscriptionReader: Send + Sync {
    /// Every subscription on `plan_id` with status `active`, from one
    /// consistent read.
    async fn snapshot(&self, plan_id: PlanId) -> Result<Vec<Subscription>, DomainError>;

    /// The subscriptions among `ids` that exist, in any order.
    async fn find_many(&self, ids: &[SubscriptionId]) -> Result<Vec<Subscription>, DomainError>;
}
