//! Version download command.

use std::path::{Path, PathBuf};

use clap::Args;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use docvault_core::config::AppConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::VersionId;

use crate::output;

/// Arguments for the download command
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Version ID
    pub version_id: VersionId,

    /// Output path; defaults to the original file name in the current
    /// directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the download command
pub async fn execute(args: &DownloadArgs, config: &AppConfig) -> AppResult<()> {
    let runtime = super::Runtime::connect(config).await?;
    let mut handle = runtime.service.resolve_for_download(args.version_id).await?;

    let target = match &args.output {
        Some(path) => path.clone(),
        None => default_target(&handle.file_name),
    };

    let mut file = tokio::fs::File::create(&target).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Internal,
            format!("Cannot create {}", target.display()),
            e,
        )
    })?;

    let mut written = 0u64;
    while let Some(chunk) = handle.stream.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        file.write_all(&chunk).await.map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to write output file", e)
        })?;
    }
    file.flush()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to flush output", e))?;

    output::print_success(&format!(
        "Wrote {written} bytes to {} ({})",
        target.display(),
        handle.content_type
    ));
    Ok(())
}

/// Last path segment of the recorded name, so a download never lands
/// outside the working directory.
fn default_target(file_name: &str) -> PathBuf {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && *s != "..")
        .unwrap_or("download.bin");
    Path::new(".").join(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target() {
        assert_eq!(default_target("report.pdf"), Path::new("./report.pdf"));
        assert_eq!(default_target("a/b/c.txt"), Path::new("./c.txt"));
        assert_eq!(default_target("dir/"), Path::new("./download.bin"));
    }
}
