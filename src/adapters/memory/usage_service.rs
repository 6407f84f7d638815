//! In-memory usage service.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::ports::UsageService;

use super::lock;

/// Usage facts recorded as `(subscription, key)` pairs. Anything not
/// recorded is reported as unused.
#[derive(Default)]
pub struct InMemoryUsageService {
    usage: Mutex<HashSet<(SubscriptionId, String)>>,
}

impl InMemoryUsageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as used by `subscription_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn record_usage(&self, subscription_id: SubscriptionId, key: impl Into<String>) {
        self.usage
            .lock()
            .expect("InMemoryUsageService: lock poisoned")
            .insert((subscription_id, key.into()));
    }
}

#[async_trait]
impl UsageService for InMemoryUsageService {
    async fn is_using(&self, subscription_id: SubscriptionId, key: &str) -> Result<bool, DomainError> {
        let usage = lock(&self.usage, "usage")?;
        Ok(usage.contains(&(subscription_id, key.to_string())))
    }
}
