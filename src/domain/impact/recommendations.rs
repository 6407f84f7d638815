//! Recommendation templates keyed by risk level and change type.

use super::{ChangeType, RiskLevel};

/// Ordered operator guidance: change-specific advice first, then the
/// general advice for the risk level.
pub fn recommendations_for(risk: RiskLevel, change_type: ChangeType) -> Vec<String> {
    let mut out: Vec<&'static str> = Vec::new();

    match (change_type, risk) {
        (_, RiskLevel::Low) => {}
        (ChangeType::PlanDisable, _) => {
            out.push("Send 60-day advance notice to every affected workspace before the disable date");
            out.push("Offer a migration path to an equivalent or better active plan before disabling");
        }
        (ChangeType::Pricing, RiskLevel::Critical | RiskLevel::High) => {
            out.push("Grandfather existing subscribers at their current price for at least one billing cycle");
            out.push("Announce the price change in advance and link to the updated pricing page");
        }
        (ChangeType::Pricing, RiskLevel::Medium) => {
            out.push("Announce the price change to affected workspaces before the next renewal");
        }
        (ChangeType::FeatureRemoval, _) => {
            out.push("Contact workspaces actively using the removed features before the change ships");
            out.push("Provide a target plan that still includes the removed features");
        }
        (ChangeType::LimitReduction, _) => {
            out.push("Warn workspaces currently above the new limits and give them time to reduce usage");
        }
    }

    match risk {
        RiskLevel::Critical => {
            out.push("Require a second approver before executing the migration");
            out.push("Execute during a low-traffic window and monitor churn closely afterwards");
        }
        RiskLevel::High => {
            out.push("Review the affected subscription list with customer success before approving");
        }
        RiskLevel::Medium => {
            out.push("Monitor support volume from affected workspaces after rollout");
        }
        RiskLevel::Low => {
            out.push("Low impact: safe to proceed with standard change review");
        }
    }

    out.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_disable_leads_with_advance_notice() {
        let recs = recommendations_for(RiskLevel::Critical, ChangeType::PlanDisable);
        assert!(recs[0].starts_with("Send 60-day advance notice"));
        assert!(recs.iter().any(|r| r.contains("second approver")));
    }

    #[test]
    fn low_risk_has_single_generic_recommendation() {
        let recs = recommendations_for(RiskLevel::Low, ChangeType::Pricing);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].starts_with("Low impact"));
    }

    #[test]
    fn templates_are_deterministic() {
        assert_eq!(
            recommendations_for(RiskLevel::High, ChangeType::FeatureRemoval),
            recommendations_for(RiskLevel::High, ChangeType::FeatureRemoval)
        );
    }
}
