//! Registry of in-flight migration executions.
//!
//! Each running execution owns a watch channel. Cancelling flips the flag;
//! the executor checks it before dispatching every step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::domain::foundation::MigrationPlanId;
use crate::domain::PlanChangeError;

/// Tracks executions running in this process.
#[derive(Default)]
pub struct ExecutionRegistry {
    running: Mutex<HashMap<MigrationPlanId, watch::Sender<bool>>>,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an execution. The returned guard unregisters on drop.
    ///
    /// # Errors
    ///
    /// `Conflict` if the plan is already running here.
    pub fn register(self: &Arc<Self>, id: MigrationPlanId) -> Result<ExecutionGuard, PlanChangeError> {
        let mut running = self
            .running
            .lock()
            .map_err(|_| PlanChangeError::infrastructure("execution registry lock poisoned"))?;
        if running.contains_key(&id) {
            return Err(PlanChangeError::invalid_state("executing", "execute"));
        }
        let (tx, rx) = watch::channel(false);
        running.insert(id, tx);
        Ok(ExecutionGuard {
            registry: Arc::clone(self),
            id,
            cancelled: rx,
        })
    }

    /// Requests cancellation. Returns false if the plan is not running here.
    pub fn cancel(&self, id: MigrationPlanId) -> bool {
        match self.running.lock() {
            Ok(running) => match running.get(&id) {
                Some(tx) => {
                    tx.send_replace(true);
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub fn is_running(&self, id: MigrationPlanId) -> bool {
        self.running
            .lock()
            .map(|running| running.contains_key(&id))
            .unwrap_or(false)
    }
}

/// Held by the executor for the duration of a run.
pub struct ExecutionGuard {
    registry: Arc<ExecutionRegistry>,
    id: MigrationPlanId,
    cancelled: watch::Receiver<bool>,
}

impl ExecutionGuard {
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        if let Ok(mut running) = self.registry.running.lock() {
            running.remove(&self.id);
        }
    }
}
