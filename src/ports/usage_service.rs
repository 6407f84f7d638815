//! Usage service port.
//!
//! Answers whether a subscription actively relies on a feature or limit.
//! Owned by the platform's usage metering; the engine only asks.

use crate::domain::foundation::{DomainError, SubscriptionId};
use async_trait::async_trait;

#[async_trait]
pub trait UsageService: Send + Sync {
    /// True if `subscription_id` currently uses the feature or limited
    /// resource named `key`.
    async fn is_using(&self, subscription_id: SubscriptionId, key: &str) -> Result<bool, DomainError>;
}
