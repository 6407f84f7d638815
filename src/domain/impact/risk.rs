//! Risk policy - Fixed thresholds mapping blast radius to a risk level.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Money;

use super::ChangeType;

/// Severity of a proposed change, ordered low to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CRITICAL_REVENUE: Money = Money::from_dollars(1000);
const HIGH_REVENUE: Money = Money::from_dollars(250);
const MEDIUM_REVENUE: Money = Money::from_dollars(50);
const HIGH_COUNT: usize = 50;
const MEDIUM_COUNT: usize = 5;

/// Scores a change. Thresholds are inclusive and checked from the top down.
pub fn assess_risk(change_type: ChangeType, affected_count: usize, revenue_at_risk: Money) -> RiskLevel {
    if (affected_count >= 1 && change_type == ChangeType::PlanDisable)
        || revenue_at_risk >= CRITICAL_REVENUE
    {
        RiskLevel::Critical
    } else if revenue_at_risk >= HIGH_REVENUE || affected_count >= HIGH_COUNT {
        RiskLevel::High
    } else if revenue_at_risk >= MEDIUM_REVENUE || affected_count >= MEDIUM_COUNT {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
