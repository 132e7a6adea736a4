//! Connection pool for the PostgreSQL metadata backend.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use docvault_core::config::{AppConfig, DatabaseConfig, MetadataBackend};
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;

/// Tables the version service reads and writes.
const REQUIRED_TABLES: [&str; 2] = ["documents", "document_versions"];

/// Pool serving the document and version record tables.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

/// Result of [`DatabasePool::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStatus {
    /// Round trip of the probe query.
    pub latency: Duration,
    /// Required tables that do not exist yet. `migrate` creates them.
    pub missing_tables: Vec<String>,
}

impl SchemaStatus {
    /// Whether every table the service needs is present.
    pub fn is_ready(&self) -> bool {
        self.missing_tables.is_empty()
    }
}

impl DatabasePool {
    /// Opens the pool behind the configured metadata backend.
    ///
    /// The in-process backend has no database, so asking for a pool under
    /// it is a configuration error.
    pub async fn for_metadata(config: &AppConfig) -> AppResult<Self> {
        match config.metadata.backend {
            MetadataBackend::Postgres => Self::connect(&config.database).await,
            MetadataBackend::Memory => Err(AppError::configuration(
                "metadata.backend = \"memory\" keeps records in process only; \
                 set it to \"postgres\" to use a database",
            )),
        }
    }

    /// Opens a pool with the settings in `config`.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if config.url.is_empty() {
            return Err(AppError::configuration("database.url is not set"));
        }
        let target = redact_url(&config.url);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Cannot reach metadata database at {target}"),
                    e,
                )
            })?;

        info!(
            url = %target,
            max_connections = config.max_connections,
            "Metadata database pool ready"
        );
        Ok(Self { pool })
    }

    /// The underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Times a round trip and reports which required tables are missing.
    pub async fn probe(&self) -> AppResult<SchemaStatus> {
        let started = Instant::now();
        let present = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name::text = ANY($1)",
        )
        .bind(REQUIRED_TABLES.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Metadata database probe failed", e)
        })?;

        Ok(SchemaStatus {
            latency: started.elapsed(),
            missing_tables: missing_tables(&present),
        })
    }

    /// Closes every connection in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Metadata database pool closed");
    }
}

fn missing_tables(present: &[String]) -> Vec<String> {
    REQUIRED_TABLES
        .iter()
        .filter(|table| !present.iter().any(|p| p == *table))
        .map(|table| table.to_string())
        .collect()
}

/// Replaces the password of a connection URL with `****`.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let Some((userinfo, host)) = authority.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:****@{host}{tail}"),
        None => url.to_string(),
    }
}
