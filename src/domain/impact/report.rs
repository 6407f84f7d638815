//! Impact report - Immutable result of analysing a proposed change.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ImpactReportId, Money, PlanId, SubscriptionId, Timestamp};

use super::{ChangeType, ProposedChange, RiskLevel};

/// Audit record of what a change would do to live subscriptions.
///
/// A report is advisory. Building a migration plan from it re-reads
/// live subscription data.
///
/// # Invariants
///
/// - `affected_count == affected_subscription_ids.len()`
/// - `affected_subscription_ids` is sorted and free of duplicates
/// - never updated after it is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub id: ImpactReportId,
    pub plan_id: PlanId,
    /// Plan version the analysis read.
    pub plan_version: u32,
    pub change_type: ChangeType,
    pub change: ProposedChange,
    pub affected_subscription_ids: Vec<SubscriptionId>,
    pub affected_count: usize,
    pub revenue_at_risk: Money,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
    pub created_at: Timestamp,
}

impl ImpactReport {
    pub fn affects(&self, id: &SubscriptionId) -> bool {
        self.affected_subscription_ids.binary_search(id).is_ok()
    }

    /// True when affected workspaces should hear about the change.
    pub fn warrants_notice(&self) -> bool {
        self.risk_level >= RiskLevel::Medium && self.affected_count > 0
    }
}
