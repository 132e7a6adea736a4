//! Version upload command.

use std::path::PathBuf;

use clap::Args;
use tokio_util::io::ReaderStream;

use docvault_core::config::AppConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::DocumentId;
use docvault_service::{RequestContext, UploadRequest};

use crate::output::{self, OutputFormat};

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Target document ID
    pub document_id: DocumentId,

    /// Path to the file to upload
    pub file: PathBuf,

    /// Override file name
    #[arg(short, long)]
    pub name: Option<String>,

    /// MIME type to record
    #[arg(short, long)]
    pub mime_type: Option<String>,
}

/// Execute the upload command
pub async fn execute(args: &UploadArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let file = tokio::fs::File::open(&args.file).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Validation,
            format!("Cannot open {}", args.file.display()),
            e,
        )
    })?;

    let file_name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::validation("Cannot derive a file name; pass --name"))?,
    };

    let runtime = super::Runtime::connect(config).await?;
    let request = UploadRequest::new(
        file_name,
        args.mime_type.clone(),
        Box::pin(ReaderStream::new(file)),
    );

    let version = runtime
        .service
        .upload_version(&RequestContext::system(), args.document_id, request)
        .await?;

    match format {
        OutputFormat::Json => output::print_item(&version, format),
        OutputFormat::Table => {
            output::print_success(&format!(
                "Stored version {} of document {}",
                version.version_number, version.document_id
            ));
            output::print_kv("Version ID", &version.id.to_string());
            output::print_kv("Storage key", &version.storage_key);
            output::print_kv("Bytes", &version.file_size_bytes.to_string());
        }
    }
    Ok(())
}
