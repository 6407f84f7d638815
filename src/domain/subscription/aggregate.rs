//! Subscription entity and its plan assignment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    Money, PlanId, SubscriptionId, Timestamp, ValidationError, WorkspaceId,
};

/// Billing status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Cancelled,
    Migrated,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Migrated => "migrated",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "migrated" => Ok(SubscriptionStatus::Migrated),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown subscription status '{}'", other),
            )),
        }
    }
}

/// The three fields a migration reads and rewrites.
///
/// Compare-and-set writes are keyed on the whole triple, so any change
/// made outside the engine makes a migration step stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentSnapshot {
    pub plan_id: PlanId,
    pub plan_version_at_subscribe: u32,
    pub status: SubscriptionStatus,
}

impl AssignmentSnapshot {
    /// The assignment after moving to `plan_id` at `version`, status unchanged.
    pub fn reassigned(&self, plan_id: PlanId, version: u32) -> Self {
        Self {
            plan_id,
            plan_version_at_subscribe: version,
            status: self.status,
        }
    }
}

/// A workspace's subscription to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub workspace_id: WorkspaceId,
    pub plan_id: PlanId,
    pub plan_version_at_subscribe: u32,
    pub status: SubscriptionStatus,
    pub billing_amount: Money,
    pub created_at: Timestamp,
}

impl Subscription {
    /// Creates an active subscription at the given plan version.
    pub fn new(
        workspace_id: WorkspaceId,
        plan_id: PlanId,
        plan_version: u32,
        billing_amount: Money,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            workspace_id,
            plan_id,
            plan_version_at_subscribe: plan_version,
            status: SubscriptionStatus::Active,
            billing_amount,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn assignment(&self) -> AssignmentSnapshot {
        AssignmentSnapshot {
            plan_id: self.plan_id,
            plan_version_at_subscribe: self.plan_version_at_subscribe,
            status: self.status,
        }
    }

    pub fn apply_assignment(&mut self, assignment: AssignmentSnapshot) {
        self.plan_id = assignment.plan_id;
        self.plan_version_at_subscribe = assignment.plan_version_at_subscribe;
        self.status = assignment.status;
    }

    pub fn is_active_on(&self, plan_id: PlanId) -> bool {
        self.plan_id == plan_id && self.status == SubscriptionStatus::Active
    }
}
