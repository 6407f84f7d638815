//! Immutable plan configuration snapshot.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::foundation::ValidationError;

use super::{PlanStatus, Pricing};

/// Every configurable field of a plan at one point in time.
///
/// Sorted collections keep serialization stable so two snapshots compare
/// equal exactly when their stored JSON does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub name: String,
    pub status: PlanStatus,
    pub pricing: Pricing,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub limits: BTreeMap<String, u64>,
}

impl PlanSnapshot {
    /// Checks the snapshot is storable.
    ///
    /// # Errors
    ///
    /// `EmptyField` for a blank name, feature key or limit resource.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if self.features.iter().any(|f| f.trim().is_empty()) {
            return Err(ValidationError::empty_field("features"));
        }
        if self.limits.keys().any(|r| r.trim().is_empty()) {
            return Err(ValidationError::empty_field("limits"));
        }
        Ok(())
    }

    pub fn has_feature(&self, key: &str) -> bool {
        self.features.contains(key)
    }

    pub fn is_active(&self) -> bool {
        self.status == PlanStatus::Active
    }
}
