//! Impact analyzer - Pure scoring of a proposed change.
//!
//! The analyzer never touches storage. Callers hand it the plan, the
//! subscription snapshot, and the set of subscriptions known to rely on the
//! keys a feature or limit change removes.

use std::collections::HashSet;

use crate::domain::foundation::{ImpactReportId, Money, SubscriptionId, Timestamp, ValidationError};
use crate::domain::plan::Plan;
use crate::domain::subscription::Subscription;

use super::{assess_risk, recommendations_for, ImpactReport, ProposedChange};

/// Computes impact reports.
pub struct ImpactAnalyzer;

impl ImpactAnalyzer {
    /// Analyzes `change` against `plan` and its active subscribers.
    ///
    /// `relying` is consulted only for changes with usage keys; pricing and
    /// disable changes affect every active subscriber.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the change is malformed for this plan.
    pub fn analyze(
        plan: &Plan,
        change: &ProposedChange,
        subscriptions: &[Subscription],
        relying: &HashSet<SubscriptionId>,
    ) -> Result<ImpactReport, ValidationError> {
        change.validate(plan.snapshot())?;

        let targets_usage = change.usage_keys().is_some();
        let mut affected: Vec<&Subscription> = subscriptions
            .iter()
            .filter(|s| s.is_active_on(plan.id))
            .filter(|s| !targets_usage || relying.contains(&s.id))
            .collect();
        affected.sort_by_key(|s| s.id);
        affected.dedup_by_key(|s| s.id);

        let revenue_at_risk: Money = affected.iter().map(|s| s.billing_amount).sum();
        let affected_count = affected.len();
        let change_type = change.change_type();
        let risk_level = assess_risk(change_type, affected_count, revenue_at_risk);

        Ok(ImpactReport {
            id: ImpactReportId::new(),
            plan_id: plan.id,
            plan_version: plan.current_version,
            change_type,
            change: change.clone(),
            affected_subscription_ids: affected.iter().map(|s| s.id).collect(),
            affected_count,
            revenue_at_risk,
            risk_level,
            recommendations: recommendations_for(risk_level, change_type),
            created_at: Timestamp::now(),
        })
    }
}
