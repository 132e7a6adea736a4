//! Version listing commands.

use clap::Args;

use docvault_core::config::AppConfig;
use docvault_core::result::AppResult;
use docvault_core::types::DocumentId;

use crate::output::{self, OutputFormat, VersionRow};

/// Arguments naming a document
#[derive(Debug, Args)]
pub struct VersionsArgs {
    /// Document ID
    pub document_id: DocumentId,
}

/// List every version, newest first
pub async fn list(args: &VersionsArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let runtime = super::Runtime::connect(config).await?;
    let versions = runtime.service.list_versions(args.document_id).await?;
    let rows: Vec<VersionRow> = versions.iter().map(VersionRow::from).collect();
    output::print_list(&rows, format);
    Ok(())
}

/// Show the highest-numbered version
pub async fn current(
    args: &VersionsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> AppResult<()> {
    let runtime = super::Runtime::connect(config).await?;
    match runtime.service.current_version(args.document_id).await? {
        Some(version) => output::print_list(&[VersionRow::from(&version)], format),
        None => output::print_warning(&format!(
            "Document {} has no versions yet",
            args.document_id
        )),
    }
    Ok(())
}
