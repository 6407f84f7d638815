//! Compensating rollback of a migration run.
//!
//! Shared by the executor (automatic rollback after a failed run) and the
//! explicit rollback command.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::notifications::spawn_notices;
use crate::domain::foundation::{ActorId, ErrorCode};
use crate::domain::migration::MigrationPlan;
use crate::domain::PlanChangeError;
use crate::ports::{
    templates, BillingService, NotificationService, PlanVersionStore, SubscriptionReader,
    SubscriptionRepository,
};

/// Restores subscriptions and plan configuration touched by a run.
#[derive(Clone)]
pub(crate) struct MigrationCompensator {
    pub plan_store: Arc<dyn PlanVersionStore>,
    pub reader: Arc<dyn SubscriptionReader>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub billing: Arc<dyn BillingService>,
    pub notifier: Arc<dyn NotificationService>,
}

impl MigrationCompensator {
    /// Puts every migrated subscription back on its pre-migration assignment
    /// and, if nothing else has changed the plan since, restores the source
    /// version's configuration.
    ///
    /// Safe to repeat: subscriptions already back on their original
    /// assignment count as restored.
    pub async fn compensate(
        &self,
        plan: &mut MigrationPlan,
        actor: &ActorId,
    ) -> Result<(), PlanChangeError> {
        let migrated: Vec<_> = plan
            .migrated_subscriptions()
            .filter_map(|(id, outcome)| outcome.written.map(|w| (*id, w)))
            .collect();

        let mut restored_workspaces = Vec::new();
        for (id, written) in migrated {
            let Some(entry) = plan.pre_migration_snapshot.get(&id).copied() else {
                continue;
            };
            let original = entry.assignment;

            let swapped = self
                .subscriptions
                .compare_and_set_assignment(id, &written, &original)
                .await?;
            let already_back = !swapped
                && self
                    .reader
                    .find_many(&[id])
                    .await?
                    .first()
                    .map(|s| s.assignment() == original)
                    .unwrap_or(false);

            let Some(outcome) = plan.outcomes.get_mut(&id) else {
                continue;
            };
            if swapped || already_back {
                if let Err(e) = self.billing.reprice(id, original.plan_id).await {
                    tracing::warn!(
                        migration_plan_id = %plan.id,
                        subscription_id = %id,
                        error = %e,
                        "Billing compensation failed; assignment restored"
                    );
                }
                outcome.mark_restored();
                restored_workspaces.push(entry.workspace_id);
            } else {
                tracing::warn!(
                    migration_plan_id = %plan.id,
                    subscription_id = %id,
                    "Subscription changed after migration; left for manual review"
                );
                outcome.mark_restore_skipped("assignment changed after migration");
            }
        }

        self.restore_plan_version(plan, actor).await?;

        if !restored_workspaces.is_empty() {
            let params = BTreeMap::from([
                ("migration_plan_id".to_string(), plan.id.to_string()),
                ("plan_id".to_string(), plan.source_plan_id.to_string()),
            ]);
            spawn_notices(
                &self.notifier,
                restored_workspaces,
                templates::MIGRATION_REVERTED,
                params,
            );
        }
        Ok(())
    }

    async fn restore_plan_version(
        &self,
        plan: &MigrationPlan,
        actor: &ActorId,
    ) -> Result<(), PlanChangeError> {
        let Some(applied) = plan.applied_version else {
            return Ok(());
        };

        let latest = self.plan_store.latest(plan.source_plan_id).await?;
        if latest.version != applied {
            tracing::warn!(
                migration_plan_id = %plan.id,
                plan_id = %plan.source_plan_id,
                applied_version = applied,
                latest_version = latest.version,
                "Plan changed after migration; configuration left as is"
            );
            return Ok(());
        }

        let original = self
            .plan_store
            .get_version(plan.source_plan_id, plan.source_version)
            .await?;
        match self
            .plan_store
            .commit(
                plan.source_plan_id,
                original.snapshot,
                &format!("rollback of migration plan {}", plan.id),
                actor,
                applied,
            )
            .await
        {
            Ok(version) => {
                tracing::info!(
                    migration_plan_id = %plan.id,
                    plan_id = %plan.source_plan_id,
                    restored_from = plan.source_version,
                    new_version = version.version,
                    "Plan configuration restored"
                );
                Ok(())
            }
            Err(e) if e.code == ErrorCode::VersionConflict => {
                tracing::warn!(
                    migration_plan_id = %plan.id,
                    plan_id = %plan.source_plan_id,
                    "Plan changed during rollback; configuration left as is"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
