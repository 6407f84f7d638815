//! Notification service port.
//!
//! Delivery is fire-and-forget: callers spawn notifications and never let
//! a delivery failure change the outcome of an operation.

use std::collections::BTreeMap;

use crate::domain::foundation::{DomainError, WorkspaceId};
use async_trait::async_trait;

/// Template names sent to the notification service.
pub mod templates {
    pub const PLAN_CHANGE_NOTICE: &str = "plan_change_notice";
    pub const SUBSCRIPTION_MIGRATED: &str = "subscription_migrated";
    pub const MIGRATION_REVERTED: &str = "migration_reverted";
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Send `template` rendered with `params` to a workspace's owners.
    async fn notify(
        &self,
        workspace_id: WorkspaceId,
        template: &str,
        params: BTreeMap<String, String>,
    ) -> Result<(), DomainError>;
}
