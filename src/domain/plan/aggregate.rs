//! Plan read model.
//!
//! # Design Decisions
//!
//! - **Ledger first**: the plan row is a pointer to its latest version,
//!   rewritten in the same transaction that appends the version
//! - **Optimistic**: writers name the version they read; a moved pointer
//!   is a conflict, never a silent overwrite

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{PlanId, Timestamp, ValidationError};

use super::{PlanSnapshot, PlanVersion};

/// Availability of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Sold and billable.
    Active,
    /// Withdrawn; existing subscribers must move.
    Disabled,
    /// Not yet sold.
    Draft,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Disabled => "disabled",
            PlanStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PlanStatus::Active),
            "disabled" => Ok(PlanStatus::Disabled),
            "draft" => Ok(PlanStatus::Draft),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown plan status '{}'", other),
            )),
        }
    }
}

/// A subscription plan as of its latest version.
///
/// # Invariants
///
/// - `current_version` equals the highest stored `PlanVersion.version`
/// - the configuration fields equal that version's snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub current_version: u32,
    #[serde(flatten)]
    pub config: PlanSnapshot,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Plan {
    /// Builds the read model for a freshly registered plan.
    pub fn from_initial(version: &PlanVersion) -> Self {
        Self {
            id: version.plan_id,
            current_version: version.version,
            config: version.snapshot.clone(),
            created_at: version.created_at,
            updated_at: version.created_at,
        }
    }

    /// Moves the pointer to a newly committed version.
    pub fn advance_to(&mut self, version: &PlanVersion) {
        self.current_version = version.version;
        self.config = version.snapshot.clone();
        self.updated_at = version.created_at;
    }

    pub fn is_active(&self) -> bool {
        self.config.is_active()
    }

    pub fn snapshot(&self) -> &PlanSnapshot {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ActorId;
    use crate::domain::plan::{BillingPeriod, Pricing};

    fn snapshot(status: PlanStatus) -> PlanSnapshot {
        PlanSnapshot {
            name: "starter".to_string(),
            status,
            pricing: Pricing::new(900, "USD", BillingPeriod::Monthly).unwrap(),
            features: Default::default(),
            limits: Default::default(),
        }
    }

    #[test]
    fn advance_to_tracks_latest_version() {
        let v1 = PlanVersion::initial(PlanId::new(), snapshot(PlanStatus::Active), ActorId::system());
        let mut plan = Plan::from_initial(&v1);
        let v2 = v1.successor(snapshot(PlanStatus::Disabled), ActorId::system(), "sunset");

        plan.advance_to(&v2);

        assert_eq!(plan.current_version, 2);
        assert!(!plan.is_active());
    }

    #[test]
    fn serializes_config_inline() {
        let v1 = PlanVersion::initial(PlanId::new(), snapshot(PlanStatus::Active), ActorId::system());
        let json = serde_json::to_value(Plan::from_initial(&v1)).unwrap();
        assert_eq!(json["name"], "starter");
        assert_eq!(json["status"], "active");
        assert_eq!(json["current_version"], 1);
    }

    #[test]
    fn status_roundtrips_through_str() {
        for status in [PlanStatus::Active, PlanStatus::Disabled, PlanStatus::Draft] {
            assert_eq!(status.as_str().parse::<PlanStatus>().unwrap(), status);
        }
    }
}
