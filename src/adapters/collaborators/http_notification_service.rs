//! HTTP implementation of NotificationService.
//!
//! `POST /notifications` with `{ workspace_id, template, params }`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{DomainError, WorkspaceId};
use crate::ports::NotificationService;

use super::CollaboratorClient;

#[derive(Debug, Serialize)]
struct NotificationRequest<'a> {
    workspace_id: WorkspaceId,
    template: &'a str,
    params: &'a BTreeMap<String, String>,
}

pub struct HttpNotificationService {
    client: CollaboratorClient,
}

impl HttpNotificationService {
    pub fn new(client: CollaboratorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn notify(
        &self,
        workspace_id: WorkspaceId,
        template: &str,
        params: BTreeMap<String, String>,
    ) -> Result<(), DomainError> {
        self.client
            .post_json(
                "notifications",
                &NotificationRequest {
                    workspace_id,
                    template,
                    params: &params,
                },
            )
            .await
    }
}
