//! Shared JSON client for collaborator services.
//!
//! Every request carries the optional bearer token and is bounded by the
//! configured timeout. Transport failures and non-success statuses map to
//! `CollaboratorError`.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode};

#[derive(Clone)]
pub struct CollaboratorClient {
    service: &'static str,
    base_url: String,
    token: Option<SecretString>,
    http: reqwest::Client,
}

impl CollaboratorClient {
    /// # Errors
    ///
    /// `CollaboratorError` if the HTTP client cannot be built.
    pub fn new(
        service: &'static str,
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| collaborator_error(service, format!("failed to build client: {}", e)))?;
        Ok(Self {
            service,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.map(SecretString::new),
            http,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path`; `None` on 404.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, DomainError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check(response).await?;
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| collaborator_error(self.service, format!("invalid response body: {}", e)))
    }

    /// POST `body` to `path`, ignoring the response body.
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), DomainError> {
        let response = self.send(self.http.post(self.url(path)).json(body)).await?;
        self.check(response).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DomainError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| collaborator_error(self.service, format!("request failed: {}", e)))
    }

    async fn check(&self, response: Response) -> Result<Response, DomainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            service = self.service,
            status = status.as_u16(),
            body = %body,
            "Collaborator returned an error"
        );
        Err(collaborator_error(self.service, format!("returned {}", status))
            .with_detail("status", status.as_u16().to_string()))
    }
}

fn collaborator_error(service: &str, message: String) -> DomainError {
    DomainError::new(ErrorCode::CollaboratorError, format!("{} service {}", service, message))
}
