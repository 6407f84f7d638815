//! Plan version ledger entry.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ActorId, PlanId, Timestamp};

use super::PlanSnapshot;

/// One immutable entry in a plan's version ledger.
///
/// # Invariants
///
/// - `version` starts at 1 and increases by exactly one per commit
/// - never updated after it is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanVersion {
    pub plan_id: PlanId,
    pub version: u32,
    pub snapshot: PlanSnapshot,
    pub created_at: Timestamp,
    pub created_by: ActorId,
    pub change_reason: String,
}

impl PlanVersion {
    /// First version of a newly registered plan.
    pub fn initial(plan_id: PlanId, snapshot: PlanSnapshot, created_by: ActorId) -> Self {
        Self {
            plan_id,
            version: 1,
            snapshot,
            created_at: Timestamp::now(),
            created_by,
            change_reason: "plan created".to_string(),
        }
    }

    /// The entry that follows this one.
    pub fn successor(
        &self,
        snapshot: PlanSnapshot,
        created_by: ActorId,
        change_reason: impl Into<String>,
    ) -> Self {
        Self {
            plan_id: self.plan_id,
            version: self.version + 1,
            snapshot,
            created_at: Timestamp::now(),
            created_by,
            change_reason: change_reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{BillingPeriod, PlanStatus, Pricing};

    fn snapshot(amount: i64) -> PlanSnapshot {
        PlanSnapshot {
            name: "team".to_string(),
            status: PlanStatus::Active,
            pricing: Pricing::new(amount, "USD", BillingPeriod::Monthly).unwrap(),
            features: Default::default(),
            limits: Default::default(),
        }
    }

    #[test]
    fn initial_version_is_one() {
        let v = PlanVersion::initial(PlanId::new(), snapshot(100), ActorId::system());
        assert_eq!(v.version, 1);
    }

    #[test]
    fn successor_increments_version_and_keeps_plan() {
        let v1 = PlanVersion::initial(PlanId::new(), snapshot(100), ActorId::system());
        let v2 = v1.successor(snapshot(200), ActorId::system(), "price bump");
        assert_eq!(v2.version, 2);
        assert_eq!(v2.plan_id, v1.plan_id);
        assert_eq!(v2.change_reason, "price bump");
        assert_eq!(v2.snapshot.pricing.amount.cents(), 200);
    }
}
