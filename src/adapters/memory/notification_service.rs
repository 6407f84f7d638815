//! Recording notification service.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, WorkspaceId};
use crate::ports::NotificationService;

use super::lock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub workspace_id: WorkspaceId,
    pub template: String,
    pub params: BTreeMap<String, String>,
}

/// Keeps every notification instead of delivering it.
#[derive(Default)]
pub struct RecordingNotificationService {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded notifications.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .expect("RecordingNotificationService: lock poisoned")
            .clone()
    }

    /// Returns notifications using `template`.
    pub fn sent_with_template(&self, template: &str) -> Vec<SentNotification> {
        self.sent()
            .into_iter()
            .filter(|n| n.template == template)
            .collect()
    }
}

#[async_trait]
impl NotificationService for RecordingNotificationService {
    async fn notify(
        &self,
        workspace_id: WorkspaceId,
        template: &str,
        params: BTreeMap<String, String>,
    ) -> Result<(), DomainError> {
        lock(&self.sent, "notifications")?.push(SentNotification {
            workspace_id,
            template: template.to_string(),
            params,
        });
        Ok(())
    }
}
