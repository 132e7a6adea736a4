//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod logging;
pub mod rate_limit;
pub mod storage;
pub mod versioning;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::rate_limit::RateLimitConfig;
pub use self::storage::StorageConfig;
pub use self::versioning::VersioningConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Version record store selection.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Version allocation retry policy.
    #[serde(default)]
    pub versioning: VersioningConfig,
    /// Registration rate limiter settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which backend holds documents and version records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    /// PostgreSQL via sqlx.
    #[default]
    Postgres,
    /// In-process store; contents are lost on exit. The CLI rejects it.
    Memory,
}

/// Version record store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: MetadataBackend,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges the file at `config_path` with an environment overlay named by
    /// `DOCVAULT_ENV` (looked up next to the base file) and environment
    /// variables prefixed with `DOCVAULT__`. Both files are optional.
    pub fn load(config_path: &str) -> Result<Self, AppError> {
        let env = std::env::var("DOCVAULT_ENV").unwrap_or_else(|_| "development".to_string());
        let overlay = Path::new(config_path).with_file_name(&env);

        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::File::from(overlay).required(false))
            .add_source(
                config::Environment::with_prefix("DOCVAULT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the service unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.metadata.backend == MetadataBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::configuration(
                "database.url is required for the postgres metadata backend",
            ));
        }
        if self.storage.key_prefix.is_empty() {
            return Err(AppError::configuration("storage.key_prefix must not be empty"));
        }
        if self.versioning.max_allocation_attempts == 0 {
            return Err(AppError::configuration(
                "versioning.max_allocation_attempts must be at least 1",
            ));
        }
        if self.rate_limit.capacity == 0 || self.rate_limit.refill_period_seconds == 0 {
            return Err(AppError::configuration(
                "rate_limit.capacity and rate_limit.refill_period_seconds must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.metadata.backend, MetadataBackend::Postgres);
        assert_eq!(config.storage.key_prefix, "doc");
        assert_eq!(config.versioning.max_allocation_attempts, 3);
        assert_eq!(config.rate_limit.capacity, 5);
        assert_eq!(config.rate_limit.refill_period_seconds, 3600);
        assert_eq!(config.rate_limit.max_tracked_keys, 10_000);
    }

    #[test]
    fn test_postgres_requires_url() {
        let config = AppConfig::default();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);

        let mut config = AppConfig::default();
        config.metadata.backend = MetadataBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let mut config = AppConfig::default();
        config.metadata.backend = MetadataBackend::Memory;
        config.versioning.max_allocation_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let parsed: MetadataConfig =
            serde_json::from_str(r#"{"backend":"memory"}"#).expect("deserialize");
        assert_eq!(parsed.backend, MetadataBackend::Memory);
    }
}
