//! External collaborator configuration
//!
//! Each service URL is optional. Unset services fall back to local
//! implementations (no-op usage, accept-all billing, logged notices).

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorsConfig {
    /// Usage service base URL
    pub usage_url: Option<String>,

    /// Billing service base URL
    pub billing_url: Option<String>,

    /// Notification service base URL
    pub notification_url: Option<String>,

    /// Bearer token sent to every collaborator
    pub api_token: Option<String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            usage_url: None,
            billing_url: None,
            notification_url: None,
            api_token: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl CollaboratorsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_url("usage_url", self.usage_url.as_deref())?;
        check_url("billing_url", self.billing_url.as_deref())?;
        check_url("notification_url", self.notification_url.as_deref())?;
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn check_url(name: &'static str, url: Option<&str>) -> Result<(), ValidationError> {
    match url {
        Some(u) if !(u.starts_with("http://") || u.starts_with("https://")) => {
            Err(ValidationError::InvalidCollaboratorUrl(name))
        }
        _ => Ok(()),
    }
}

fn default_request_timeout_ms() -> u64 {
    3_000
}
