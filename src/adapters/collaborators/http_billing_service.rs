//! HTTP implementation of BillingService.
//!
//! `POST /subscriptions/{id}/reprice` with `{ "plan_id": ... }`.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{DomainError, PlanId, SubscriptionId};
use crate::ports::BillingService;

use super::CollaboratorClient;

#[derive(Debug, Serialize)]
struct RepriceRequest {
    plan_id: PlanId,
}

pub struct HttpBillingService {
    client: CollaboratorClient,
}

impl HttpBillingService {
    pub fn new(client: CollaboratorClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BillingService for HttpBillingService {
    async fn reprice(&self, subscription_id: SubscriptionId, new_plan_id: PlanId) -> Result<(), DomainError> {
        self.client
            .post_json(
                &format!("subscriptions/{}/reprice", subscription_id),
                &RepriceRequest { plan_id: new_plan_id },
            )
            .await?;
        tracing::debug!(
            subscription_id = %subscription_id,
            plan_id = %new_plan_id,
            "Subscription repriced"
        );
        Ok(())
    }
}
