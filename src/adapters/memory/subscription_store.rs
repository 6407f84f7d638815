//! In-memory subscription store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, PlanId, SubscriptionId};
use crate::domain::subscription::{AssignmentSnapshot, Subscription};
use crate::ports::{SubscriptionReader, SubscriptionRepository};

use super::lock;

/// Subscriptions keyed by id; serves both the reader and repository ports.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: Mutex<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Returns a subscription by id.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get(&self, id: SubscriptionId) -> Option<Subscription> {
        self.subscriptions
            .lock()
            .expect("InMemorySubscriptionStore: lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Overwrites an assignment as an outside writer would.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn force_assignment(&self, id: SubscriptionId, assignment: AssignmentSnapshot) {
        if let Some(sub) = self
            .subscriptions
            .lock()
            .expect("InMemorySubscriptionStore: lock poisoned")
            .get_mut(&id)
        {
            sub.apply_assignment(assignment);
        }
    }
}

#[async_trait]
impl SubscriptionReader for InMemorySubscriptionStore {
    async fn snapshot(&self, plan_id: PlanId) -> Result<Vec<Subscription>, DomainError> {
        let subscriptions = lock(&self.subscriptions, "subscriptions")?;
        let mut active: Vec<Subscription> = subscriptions
            .values()
            .filter(|s| s.is_active_on(plan_id))
            .cloned()
            .collect();
        active.sort_by_key(|s| s.id);
        Ok(active)
    }

    async fn find_many(&self, ids: &[SubscriptionId]) -> Result<Vec<Subscription>, DomainError> {
        let subscriptions = lock(&self.subscriptions, "subscriptions")?;
        Ok(ids.iter().filter_map(|id| subscriptions.get(id).cloned()).collect())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionStore {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = lock(&self.subscriptions, "subscriptions")?;
        if subscriptions.contains_key(&subscription.id) {
            return Err(DomainError::validation(
                "id",
                format!("Subscription {} already exists", subscription.id),
            ));
        }
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn compare_and_set_assignment(
        &self,
        id: SubscriptionId,
        expected: &AssignmentSnapshot,
        new: &AssignmentSnapshot,
    ) -> Result<bool, DomainError> {
        let mut subscriptions = lock(&self.subscriptions, "subscriptions")?;
        match subscriptions.get_mut(&id) {
            Some(sub) if sub.assignment() == *expected => {
                sub.apply_assignment(*new);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
