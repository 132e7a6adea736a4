//! Backend health command.

use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::blob_store::BlobStore;

use crate::output;

/// Check every configured backend and fail if any is unhealthy.
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let runtime = super::Runtime::connect(config).await?;
    let mut healthy = true;

    let blobs_ok = runtime.blobs.health_check().await.unwrap_or(false);
    healthy &= blobs_ok;
    output::print_kv(
        &format!("Blob store ({})", runtime.blobs.backend()),
        status(blobs_ok),
    );

    match runtime.pool.probe().await {
        Ok(schema) => {
            healthy &= schema.is_ready();
            output::print_kv(
                "Database",
                &format!("ok ({} ms)", schema.latency.as_millis()),
            );
            if !schema.is_ready() {
                output::print_kv(
                    "Missing tables",
                    &format!("{} (run `docvault migrate`)", schema.missing_tables.join(", ")),
                );
            }
        }
        Err(e) => {
            healthy = false;
            output::print_kv("Database", &format!("{} ({e})", status(false)));
        }
    }

    if healthy {
        output::print_success("All backends healthy");
        Ok(())
    } else {
        Err(AppError::internal("One or more backends are unhealthy"))
    }
}

fn status(ok: bool) -> &'static str {
    if ok { "ok" } else { "FAILED" }
}
