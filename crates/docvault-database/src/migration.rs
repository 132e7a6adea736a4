//! Schema migrations for the metadata tables.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;

/// Migrations embedded from the workspace `migrations/` directory.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Newest schema version shipped with this build.
pub fn latest_schema_version() -> i64 {
    MIGRATOR.iter().map(|m| m.version).max().unwrap_or(0)
}

/// Brings the metadata schema up to [`latest_schema_version`].
pub async fn run_migrations(pool: &PgPool) -> AppResult<i64> {
    let target = latest_schema_version();
    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Metadata schema migration to version {target} failed"),
            e,
        )
    })?;

    info!(
        schema_version = target,
        migrations = MIGRATOR.iter().count(),
        "Metadata schema up to date"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_schema_embedded() {
        assert_eq!(latest_schema_version(), 1);
        assert!(MIGRATOR.iter().any(|m| m.description.contains("initial")));
    }
}
