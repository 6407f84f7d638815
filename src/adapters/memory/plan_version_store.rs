//! In-memory plan version store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{ActorId, DomainError, ErrorCode, PlanId};
use crate::domain::plan::{Plan, PlanSnapshot, PlanVersion};
use crate::ports::PlanVersionStore;

use super::lock;

struct PlanLedger {
    plan: Plan,
    versions: Vec<PlanVersion>,
}

/// Plan ledgers keyed by plan id.
///
/// A single mutex covers the pointer and the ledger, so a commit's version
/// check and append cannot interleave with another commit.
#[derive(Default)]
pub struct InMemoryPlanVersionStore {
    ledgers: Mutex<HashMap<PlanId, PlanLedger>>,
}

impl InMemoryPlanVersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanVersionStore for InMemoryPlanVersionStore {
    async fn create_plan(
        &self,
        plan_id: PlanId,
        snapshot: PlanSnapshot,
        actor: &ActorId,
    ) -> Result<PlanVersion, DomainError> {
        let mut ledgers = lock(&self.ledgers, "plan ledgers")?;
        if ledgers.contains_key(&plan_id) {
            return Err(DomainError::validation("plan_id", format!("Plan {} already exists", plan_id)));
        }
        let version = PlanVersion::initial(plan_id, snapshot, actor.clone());
        ledgers.insert(
            plan_id,
            PlanLedger {
                plan: Plan::from_initial(&version),
                versions: vec![version.clone()],
            },
        );
        Ok(version)
    }

    async fn commit(
        &self,
        plan_id: PlanId,
        snapshot: PlanSnapshot,
        reason: &str,
        actor: &ActorId,
        expected_version: u32,
    ) -> Result<PlanVersion, DomainError> {
        let mut ledgers = lock(&self.ledgers, "plan ledgers")?;
        let ledger = ledgers.get_mut(&plan_id).ok_or_else(|| {
            DomainError::new(ErrorCode::PlanNotFound, format!("Plan not found: {}", plan_id))
        })?;

        let current = ledger.plan.current_version;
        if current != expected_version {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                format!("Plan {} is at version {}, expected {}", plan_id, current, expected_version),
            )
            .with_detail("expected", expected_version.to_string())
            .with_detail("actual", current.to_string()));
        }

        let latest = ledger.versions.last().ok_or_else(|| {
            DomainError::new(ErrorCode::InternalError, format!("Plan {} has an empty ledger", plan_id))
        })?;
        let next = latest.successor(snapshot, actor.clone(), reason);
        ledger.plan.advance_to(&next);
        ledger.versions.push(next.clone());
        Ok(next)
    }

    async fn get_version(&self, plan_id: PlanId, version: u32) -> Result<PlanVersion, DomainError> {
        let ledgers = lock(&self.ledgers, "plan ledgers")?;
        ledgers
            .get(&plan_id)
            .and_then(|l| l.versions.iter().find(|v| v.version == version))
            .cloned()
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::PlanVersionNotFound,
                    format!("Plan {} has no version {}", plan_id, version),
                )
            })
    }

    async fn latest(&self, plan_id: PlanId) -> Result<PlanVersion, DomainError> {
        let ledgers = lock(&self.ledgers, "plan ledgers")?;
        ledgers
            .get(&plan_id)
            .and_then(|l| l.versions.last())
            .cloned()
            .ok_or_else(|| DomainError::new(ErrorCode::PlanNotFound, format!("Plan not found: {}", plan_id)))
    }

    async fn find_plan(&self, plan_id: PlanId) -> Result<Option<Plan>, DomainError> {
        let ledgers = lock(&self.ledgers, "plan ledgers")?;
        Ok(ledgers.get(&plan_id).map(|l| l.plan.clone()))
    }

    async fn list_versions(&self, plan_id: PlanId) -> Result<Vec<PlanVersion>, DomainError> {
        let ledgers = lock(&self.ledgers, "plan ledgers")?;
        Ok(ledgers
            .get(&plan_id)
            .map(|l| l.versions.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{BillingPeriod, PlanStatus, Pricing};
    use std::sync::Arc;

    fn snapshot(cents: i64) -> PlanSnapshot {
        PlanSnapshot {
            name: "team".to_string(),
            status: PlanStatus::Active,
            pricing: Pricing::new(cents, "USD", BillingPeriod::Monthly).unwrap(),
            features: Default::default(),
            limits: Default::default(),
        }
    }

    #[tokio::test]
    async fn commit_appends_contiguous_versions() {
        let store = InMemoryPlanVersionStore::new();
        let id = PlanId::new();
        let actor = ActorId::system();
        store.create_plan(id, snapshot(100), &actor).await.unwrap();

        store.commit(id, snapshot(200), "bump", &actor, 1).await.unwrap();
        store.commit(id, snapshot(300), "bump", &actor, 2).await.unwrap();

        let versions: Vec<u32> = store.list_versions(id).await.unwrap().iter().map(|v| v.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(store.find_plan(id).await.unwrap().unwrap().current_version, 3);
        assert_eq!(store.latest(id).await.unwrap().snapshot.pricing.amount.cents(), 300);
    }

    #[tokio::test]
    async fn stale_commit_conflicts_and_writes_nothing() {
        let store = InMemoryPlanVersionStore::new();
        let id = PlanId::new();
        let actor = ActorId::system();
        store.create_plan(id, snapshot(100), &actor).await.unwrap();
        store.commit(id, snapshot(200), "first", &actor, 1).await.unwrap();

        let err = store.commit(id, snapshot(300), "second", &actor, 1).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::VersionConflict);
        assert_eq!(err.details.get("actual"), Some(&"2".to_string()));
        assert_eq!(store.list_versions(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_commits_with_same_expected_version_have_one_winner() {
        let store = Arc::new(InMemoryPlanVersionStore::new());
        let id = PlanId::new();
        store.create_plan(id, snapshot(100), &ActorId::system()).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .commit(id, snapshot(200 + i), "race", &ActorId::system(), 1)
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.latest(id).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn missing_version_is_not_found() {
        let store = InMemoryPlanVersionStore::new();
        let id = PlanId::new();
        store.create_plan(id, snapshot(100), &ActorId::system()).await.unwrap();

        let err = store.get_version(id, 9).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PlanVersionNotFound);
        assert_eq!(store.latest(PlanId::new()).await.unwrap_err().code, ErrorCode::PlanNotFound);
    }
}
