//! HTTP implementation of UsageService.
//!
//! `GET /subscriptions/{id}/usage/{key}` -> `{ "in_use": bool }`.
//! Unknown subscriptions or keys (404) count as not in use.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::ports::UsageService;

use super::CollaboratorClient;

#[derive(Debug, Deserialize)]
struct UsageResponse {
    in_use: bool,
}

pub struct HttpUsageService {
    client: CollaboratorClient,
}

impl HttpUsageService {
    pub fn new(client: CollaboratorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageService for HttpUsageService {
    async fn is_using(&self, subscription_id: SubscriptionId, key: &str) -> Result<bool, DomainError> {
        let path = format!("subscriptions/{}/usage/{}", subscription_id, key);
        let response: Option<UsageResponse> = self.client.get_json(&path).await?;
        Ok(response.map(|r| r.in_use).unwrap_or(false))
    }
}
