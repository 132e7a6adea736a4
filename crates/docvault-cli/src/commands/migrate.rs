//! Database migration command.

use docvault_core::config::AppConfig;
use docvault_core::result::AppResult;
use docvault_database::DatabasePool;
use docvault_database::migration::run_migrations;

use crate::output;

/// Apply every pending migration.
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let pool = DatabasePool::for_metadata(config).await?;
    println!("Running database migrations...");
    let version = run_migrations(pool.pool()).await?;
    pool.close().await;
    output::print_success(&format!("Metadata schema at version {version}."));
    Ok(())
}
