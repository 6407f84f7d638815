//! In-memory billing service with failure injection.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, PlanId, SubscriptionId};
use crate::ports::BillingService;

use super::lock;

/// Records the plan each subscription is billed on.
///
/// Failures can be injected per subscription, either permanently or for a
/// number of calls, and every call can be slowed down.
#[derive(Default)]
pub struct InMemoryBillingService {
    billed_on: Mutex<HashMap<SubscriptionId, PlanId>>,
    calls: Mutex<Vec<(SubscriptionId, PlanId)>>,
    always_fail: Mutex<HashSet<SubscriptionId>>,
    fail_next: Mutex<HashMap<SubscriptionId, u32>>,
    delay: Mutex<Option<Duration>>,
}

impl InMemoryBillingService {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Every reprice of `subscription_id` fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_always(&self, subscription_id: SubscriptionId) {
        self.always_fail
            .lock()
            .expect("InMemoryBillingService: lock poisoned")
            .insert(subscription_id);
    }

    /// The next `times` reprices of `subscription_id` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn fail_times(&self, subscription_id: SubscriptionId, times: u32) {
        self.fail_next
            .lock()
            .expect("InMemoryBillingService: lock poisoned")
            .insert(subscription_id, times);
    }

    /// Delays every reprice by `delay`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("InMemoryBillingService: lock poisoned") = Some(delay);
    }

    /// Plan the subscription was last successfully repriced to.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn billed_plan(&self, subscription_id: SubscriptionId) -> Option<PlanId> {
        self.billed_on
            .lock()
            .expect("InMemoryBillingService: lock poisoned")
            .get(&subscription_id)
            .copied()
    }

    /// Number of reprice attempts, including failed ones.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn call_count(&self, subscription_id: SubscriptionId) -> usize {
        self.calls
            .lock()
            .expect("InMemoryBillingService: lock poisoned")
            .iter()
            .filter(|(id, _)| *id == subscription_id)
            .count()
    }

    fn should_fail(&self, subscription_id: SubscriptionId) -> Result<bool, DomainError> {
        if lock(&self.always_fail, "billing failures")?.contains(&subscription_id) {
            return Ok(true);
        }
        let mut fail_next = lock(&self.fail_next, "billing failures")?;
        match fail_next.get_mut(&subscription_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl BillingService for InMemoryBillingService {
    async fn reprice(&self, subscription_id: SubscriptionId, new_plan_id: PlanId) -> Result<(), DomainError> {
        let delay = *lock(&self.delay, "billing delay")?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        lock(&self.calls, "billing calls")?.push((subscription_id, new_plan_id));

        if self.should_fail(subscription_id)? {
            return Err(DomainError::new(
                ErrorCode::CollaboratorError,
                format!("Billing rejected reprice of {}", subscription_id),
            ));
        }

        lock(&self.billed_on, "billing state")?.insert(subscription_id, new_plan_id);
        Ok(())
    }
}
