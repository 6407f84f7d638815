//! Subscription repository port (write side).
//!
//! The engine never rewrites a subscription wholesale. Its only mutation
//! is a compare-and-set of the plan assignment.

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::{AssignmentSnapshot, Subscription};
use async_trait::async_trait;

/// Repository port for subscription assignment writes.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Store a new subscription (seeding and tests).
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Replace the assignment of `id` with `new` only if it currently equals
    /// `expected`.
    ///
    /// Returns `false`, writing nothing, when the stored assignment differs
    /// or the subscription does not exist.
    async fn compare_and_set_assignment(
        &self,
        id: SubscriptionId,
        expected: &AssignmentSnapshot,
        new: &AssignmentSnapshot,
    ) -> Result<bool, DomainError>;
}
