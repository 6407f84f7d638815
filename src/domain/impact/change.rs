//! Proposed plan changes.
//!
//! A change is a closed set of variants. Every consumer matches
//! exhaustively, so adding a variant is a compile error everywhere it
//! needs handling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};
use crate::domain::plan::{BillingPeriod, PlanSnapshot, PlanStatus, Pricing};

/// Kind of plan change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Pricing,
    FeatureRemoval,
    LimitReduction,
    PlanDisable,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Pricing => "pricing",
            ChangeType::FeatureRemoval => "feature_removal",
            ChangeType::LimitReduction => "limit_reduction",
            ChangeType::PlanDisable => "plan_disable",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// New price for a plan. Period defaults to the plan's current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingChange {
    pub amount_cents: i64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<BillingPeriod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRemoval {
    pub features: Vec<String>,
}

/// New, lower quantities per resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitReduction {
    pub limits: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDisable {
    /// RFC 3339 date the plan stops being sold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_date: Option<String>,
}

/// A change an operator wants to make to a plan.
///
/// Serialized as `{ "change_type": ..., "payload": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change_type", content = "payload", rename_all = "snake_case")]
pub enum ProposedChange {
    Pricing(PricingChange),
    FeatureRemoval(FeatureRemoval),
    LimitReduction(LimitReduction),
    PlanDisable(PlanDisable),
}

impl ProposedChange {
    pub fn change_type(&self) -> ChangeType {
        match self {
            ProposedChange::Pricing(_) => ChangeType::Pricing,
            ProposedChange::FeatureRemoval(_) => ChangeType::FeatureRemoval,
            ProposedChange::LimitReduction(_) => ChangeType::LimitReduction,
            ProposedChange::PlanDisable(_) => ChangeType::PlanDisable,
        }
    }

    /// Checks the change against the plan it targets.
    ///
    /// # Errors
    ///
    /// Returns the first rule the change breaks.
    pub fn validate(&self, current: &PlanSnapshot) -> Result<(), ValidationError> {
        match self {
            ProposedChange::Pricing(change) => {
                let pricing = change.to_pricing(current)?;
                if pricing.currency != current.pricing.currency {
                    return Err(ValidationError::invalid_format(
                        "currency",
                        format!(
                            "must be {} (currency conversion is not supported)",
                            current.pricing.currency
                        ),
                    ));
                }
                if pricing == current.pricing {
                    return Err(ValidationError::invalid_format(
                        "amount_cents",
                        "new pricing is identical to the current pricing",
                    ));
                }
                Ok(())
            }
            ProposedChange::FeatureRemoval(change) => {
                if change.features.is_empty() {
                    return Err(ValidationError::empty_field("features"));
                }
                if let Some(missing) = change.features.iter().find(|f| !current.has_feature(f)) {
                    return Err(ValidationError::invalid_format(
                        "features",
                        format!("plan has no feature '{}'", missing),
                    ));
                }
                Ok(())
            }
            ProposedChange::LimitReduction(change) => {
                if change.limits.is_empty() {
                    return Err(ValidationError::empty_field("limits"));
                }
                for (resource, &proposed) in &change.limits {
                    let existing = current.limits.get(resource).copied().ok_or_else(|| {
                        ValidationError::invalid_format(
                            "limits",
                            format!("plan has no limit on '{}'", resource),
                        )
                    })?;
                    if proposed >= existing {
                        return Err(ValidationError::out_of_range(
                            format!("limits.{}", resource),
                            0,
                            existing.saturating_sub(1) as i64,
                            proposed as i64,
                        ));
                    }
                }
                Ok(())
            }
            ProposedChange::PlanDisable(change) => {
                if current.status == PlanStatus::Disabled {
                    return Err(ValidationError::invalid_format(
                        "status",
                        "plan is already disabled",
                    ));
                }
                if let Some(date) = &change.disable_date {
                    Timestamp::parse_rfc3339("disable_date", date)?;
                }
                Ok(())
            }
        }
    }

    /// Returns the snapshot with this change applied.
    ///
    /// # Errors
    ///
    /// Only a pricing change can fail, and only if it would not validate.
    pub fn apply_to(&self, current: &PlanSnapshot) -> Result<PlanSnapshot, ValidationError> {
        let mut next = current.clone();
        match self {
            ProposedChange::Pricing(change) => {
                next.pricing = change.to_pricing(current)?;
            }
            ProposedChange::FeatureRemoval(change) => {
                for feature in &change.features {
                    next.features.remove(feature);
                }
            }
            ProposedChange::LimitReduction(change) => {
                for (resource, quantity) in &change.limits {
                    next.limits.insert(resource.clone(), *quantity);
                }
            }
            ProposedChange::PlanDisable(_) => {
                next.status = PlanStatus::Disabled;
            }
        }
        Ok(next)
    }

    /// Feature or limit keys subscribers must be using to be affected.
    ///
    /// `None` means the change reaches every active subscriber.
    pub fn usage_keys(&self) -> Option<Vec<String>> {
        match self {
            ProposedChange::Pricing(_) | ProposedChange::PlanDisable(_) => None,
            ProposedChange::FeatureRemoval(change) => Some(change.features.clone()),
            ProposedChange::LimitReduction(change) => Some(change.limits.keys().cloned().collect()),
        }
    }

    /// Human-readable reason recorded on the plan version it produces.
    pub fn describe(&self) -> String {
        match self {
            ProposedChange::Pricing(change) => format!(
                "pricing changed to {} {}",
                change.amount_cents, change.currency
            ),
            ProposedChange::FeatureRemoval(change) => {
                format!("features removed: {}", change.features.join(", "))
            }
            ProposedChange::LimitReduction(change) => format!(
                "limits reduced: {}",
                change
                    .limits
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ProposedChange::PlanDisable(change) => match &change.disable_date {
                Some(date) => format!("plan disabled as of {}", date),
                None => "plan disabled".to_string(),
            },
        }
    }
}

impl PricingChange {
    fn to_pricing(&self, current: &PlanSnapshot) -> Result<Pricing, ValidationError> {
        Pricing::new(
            self.amount_cents,
            self.currency.clone(),
            self.billing_period.unwrap_or(current.pricing.billing_period),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan() -> PlanSnapshot {
        PlanSnapshot {
            name: "creator".to_string(),
            status: PlanStatus::Active,
            pricing: Pricing::new(3_440, "USD", BillingPeriod::Monthly).unwrap(),
            features: ["api".to_string(), "sso".to_string()].into_iter().collect(),
            limits: [("seats".to_string(), 10), ("projects".to_string(), 5)]
                .into_iter()
                .collect(),
        }
    }

    fn pricing(amount: i64, currency: &str) -> ProposedChange {
        ProposedChange::Pricing(PricingChange {
            amount_cents: amount,
            currency: currency.to_string(),
            billing_period: None,
        })
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Serialization
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn deserializes_tagged_payload() {
        let change: ProposedChange = serde_json::from_value(json!({
            "change_type": "feature_removal",
            "payload": { "features": ["sso"] }
        }))
        .unwrap();
        assert_eq!(change.change_type(), ChangeType::FeatureRemoval);
    }

    #[test]
    fn rejects_unknown_change_type() {
        let result = serde_json::from_value::<ProposedChange>(json!({
            "change_type": "rename",
            "payload": {}
        }));
        assert!(result.is_err());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Validation
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn pricing_must_keep_currency() {
        let err = pricing(4_000, "EUR").validate(&plan()).unwrap_err();
        assert_eq!(err.field(), "currency");
    }

    #[test]
    fn pricing_must_differ_from_current() {
        assert!(pricing(3_440, "USD").validate(&plan()).is_err());
        assert!(pricing(4_900, "USD").validate(&plan()).is_ok());
    }

    #[test]
    fn pricing_rejects_negative_amount() {
        assert!(pricing(-100, "USD").validate(&plan()).is_err());
    }

    #[test]
    fn feature_removal_requires_known_keys() {
        let change = ProposedChange::FeatureRemoval(FeatureRemoval {
            features: vec!["sso".to_string(), "audit_log".to_string()],
        });
        assert!(change.validate(&plan()).is_err());

        let empty = ProposedChange::FeatureRemoval(FeatureRemoval { features: vec![] });
        assert!(empty.validate(&plan()).is_err());
    }

    #[test]
    fn limit_reduction_must_lower_the_limit() {
        let same = ProposedChange::LimitReduction(LimitReduction {
            limits: [("seats".to_string(), 10)].into_iter().collect(),
        });
        assert!(same.validate(&plan()).is_err());

        let lower = ProposedChange::LimitReduction(LimitReduction {
            limits: [("seats".to_string(), 3)].into_iter().collect(),
        });
        assert!(lower.validate(&plan()).is_ok());

        let unknown = ProposedChange::LimitReduction(LimitReduction {
            limits: [("storage_gb".to_string(), 1)].into_iter().collect(),
        });
        assert!(unknown.validate(&plan()).is_err());
    }

    #[test]
    fn plan_disable_rejects_invalid_date() {
        let change = ProposedChange::PlanDisable(PlanDisable {
            disable_date: Some("invalid-date-format".to_string()),
        });
        let err = change.validate(&plan()).unwrap_err();
        assert_eq!(err.field(), "disable_date");
    }

    #[test]
    fn plan_disable_rejects_already_disabled_plan() {
        let mut disabled = plan();
        disabled.status = PlanStatus::Disabled;
        let change = ProposedChange::PlanDisable(PlanDisable::default());
        assert!(change.validate(&disabled).is_err());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Application
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn apply_removes_features_and_overwrites_limits() {
        let removal = ProposedChange::FeatureRemoval(FeatureRemoval {
            features: vec!["sso".to_string()],
        });
        let next = removal.apply_to(&plan()).unwrap();
        assert!(!next.has_feature("sso"));
        assert!(next.has_feature("api"));

        let reduction = ProposedChange::LimitReduction(LimitReduction {
            limits: [("seats".to_string(), 3)].into_iter().collect(),
        });
        let next = reduction.apply_to(&plan()).unwrap();
        assert_eq!(next.limits.get("seats"), Some(&3));
        assert_eq!(next.limits.get("projects"), Some(&5));
    }

    #[test]
    fn apply_disable_sets_status() {
        let next = ProposedChange::PlanDisable(PlanDisable::default())
            .apply_to(&plan())
            .unwrap();
        assert_eq!(next.status, PlanStatus::Disabled);
    }

    #[test]
    fn usage_keys_only_for_targeted_changes() {
        assert!(pricing(100, "USD").usage_keys().is_none());
        let removal = ProposedChange::FeatureRemoval(FeatureRemoval {
            features: vec!["sso".to_string()],
        });
        assert_eq!(removal.usage_keys(), Some(vec!["sso".to_string()]));
    }
}
