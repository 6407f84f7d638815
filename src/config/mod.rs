//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `PLANSHIFT` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use planshift::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod collaborators;
mod database;
mod error;
mod migration;
mod server;

pub use collaborators::CollaboratorsConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use migration::MigrationConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; in-memory storage when absent
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub migration: MigrationConfig,

    #[serde(default)]
    pub collaborators: CollaboratorsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `PLANSHIFT` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// - `PLANSHIFT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PLANSHIFT__MIGRATION__MAX_CONCURRENCY=8` -> `migration.max_concurrency = 8`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PLANSHIFT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.migration.validate()?;
        self.collaborators.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
