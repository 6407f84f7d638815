//! Fire-and-forget workspace notices.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::foundation::WorkspaceId;
use crate::ports::NotificationService;

/// Spawns one notice per workspace. Delivery failures are logged and dropped.
pub(crate) fn spawn_notices(
    notifier: &Arc<dyn NotificationService>,
    workspaces: impl IntoIterator<Item = WorkspaceId>,
    template: &'static str,
    params: BTreeMap<String, String>,
) {
    for workspace_id in workspaces {
        let notifier = Arc::clone(notifier);
        let params = params.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(workspace_id, template, params).await {
                tracing::warn!(
                    workspace_id = %workspace_id,
                    template,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        });
    }
}
