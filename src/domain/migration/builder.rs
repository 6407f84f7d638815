//! Migration plan builder - Target selection for affected subscriptions.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::errors::PlanChangeError;
use crate::domain::foundation::{ActorId, MigrationPlanId, SubscriptionId, Timestamp};
use crate::domain::impact::ImpactReport;
use crate::domain::plan::Plan;
use crate::domain::subscription::Subscription;

use super::{BlockingIssue, MigrationPlan, MigrationStatus, PreMigrationEntry};

/// Cheapest active candidate whose features cover `used`.
///
/// Price is compared per month; equal prices fall back to plan id order.
pub fn select_target<'a>(used: &BTreeSet<String>, candidates: &'a [Plan]) -> Option<&'a Plan> {
    candidates
        .iter()
        .filter(|p| p.is_active())
        .filter(|p| used.is_subset(&p.config.features))
        .min_by_key(|p| (p.config.pricing.monthly_equivalent(), p.id))
}

/// Turns an impact report into a draft migration plan.
pub struct MigrationPlanBuilder;

impl MigrationPlanBuilder {
    /// Builds a draft plan.
    ///
    /// `subscriptions` is a fresh read of the report's affected ids and
    /// `used_features` maps each to the source-plan features it uses.
    ///
    /// # Errors
    ///
    /// - `StaleData` if the source plan moved past the version the report read
    /// - `Validation` if a candidate is inactive or is the plan being disabled
    pub fn build(
        report: &ImpactReport,
        source: &Plan,
        candidates: &[Plan],
        subscriptions: &[Subscription],
        used_features: &HashMap<SubscriptionId, BTreeSet<String>>,
        actor: ActorId,
    ) -> Result<MigrationPlan, PlanChangeError> {
        if source.current_version != report.plan_version {
            return Err(PlanChangeError::stale(
                None,
                format!(
                    "impact report {} analysed version {} but plan {} is at version {}; re-run the analysis",
                    report.id, report.plan_version, source.id, source.current_version
                ),
            ));
        }

        let now = Timestamp::now();
        let mut plan = MigrationPlan {
            id: MigrationPlanId::new(),
            source_plan_id: source.id,
            source_version: source.current_version,
            impact_report_id: report.id,
            change: report.change.clone(),
            target_assignments: BTreeMap::new(),
            requires_manual_migration: BTreeSet::new(),
            blocking_issues: Vec::new(),
            pre_migration_snapshot: BTreeMap::new(),
            excluded_subscriptions: Vec::new(),
            status: MigrationStatus::Draft,
            outcomes: BTreeMap::new(),
            applied_version: None,
            failure_reason: None,
            created_by: actor,
            created_at: now,
            approved_by: None,
            approved_at: None,
            executed_at: None,
            rolled_back_at: None,
            updated_at: now,
        };

        let mut unique: Vec<Plan> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            plan.check_candidate(candidate)?;
            if !unique.iter().any(|p| p.id == candidate.id) {
                unique.push(candidate.clone());
            }
        }

        let live: HashMap<SubscriptionId, &Subscription> =
            subscriptions.iter().map(|s| (s.id, s)).collect();
        let empty = BTreeSet::new();

        for id in &report.affected_subscription_ids {
            let subscription = match live.get(id) {
                Some(s) if s.is_active_on(source.id) => *s,
                _ => {
                    plan.excluded_subscriptions.push(*id);
                    continue;
                }
            };

            plan.pre_migration_snapshot.insert(
                *id,
                PreMigrationEntry {
                    workspace_id: subscription.workspace_id,
                    assignment: subscription.assignment(),
                },
            );

            let used = used_features.get(id).unwrap_or(&empty);
            match select_target(used, &unique) {
                Some(target) => {
                    plan.target_assignments.insert(*id, target.id);
                }
                None => {
                    plan.requires_manual_migration.insert(*id);
                    plan.blocking_issues.push(BlockingIssue {
                        subscription_id: Some(*id),
                        message: format!(
                            "no candidate plan covers used features [{}]",
                            used.iter().cloned().collect::<Vec<_>>().join(", ")
                        ),
                    });
                }
            }
        }

        Ok(plan)
    }
}
