//! Collaborator adapters - HTTP clients for the usage, billing and
//! notification services, plus a logging notifier for deployments without
//! a notification service.

mod client;
mod http_billing_service;
mod http_notification_service;
mod http_usage_service;
mod logging_notification_service;

pub use client::CollaboratorClient;
pub use http_billing_service::HttpBillingService;
pub use http_notification_service::HttpNotificationService;
pub use http_usage_service::HttpUsageService;
pub use logging_notification_service::LoggingNotificationService;
