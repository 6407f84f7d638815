//! Notification service that only logs.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, WorkspaceId};
use crate::ports::NotificationService;

#[derive(Debug, Default)]
pub struct LoggingNotificationService;

impl LoggingNotificationService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationService for LoggingNotificationService {
    async fn notify(
        &self,
        workspace_id: WorkspaceId,
        template: &str,
        params: BTreeMap<String, String>,
    ) -> Result<(), DomainError> {
        tracing::info!(
            workspace_id = %workspace_id,
            template,
            params = ?params,
            "Workspace notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_never_fails() {
        let notifier = LoggingNotificationService::new();
        assert!(notifier
            .notify(WorkspaceId::new(), "plan_change_notice", BTreeMap::new())
            .await
            .is_ok());
    }
}
