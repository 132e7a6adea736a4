//! Document management commands.

use clap::{Args, Subcommand};

use docvault_core::config::AppConfig;
use docvault_core::result::AppResult;
use docvault_core::types::DocumentId;

use crate::output::{self, OutputFormat};

/// Arguments for document commands
#[derive(Debug, Args)]
pub struct DocumentArgs {
    /// Document subcommand
    #[command(subcommand)]
    pub command: DocumentCommand,
}

/// Document subcommands
#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    /// Create an empty document
    Create {
        /// Document title
        #[arg(short, long)]
        title: String,
    },
    /// Delete a document with every version and blob
    Delete {
        /// Document ID
        document_id: DocumentId,
    },
}

/// Execute document commands
pub async fn execute(args: &DocumentArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let runtime = super::Runtime::connect(config).await?;

    match &args.command {
        DocumentCommand::Create { title } => {
            let document = runtime.documents.create(title).await?;
            output::print_item(&document, format);
        }
        DocumentCommand::Delete { document_id } => {
            let report = runtime.service.delete_document(*document_id).await?;
            if let Some(warning) = report.warning() {
                output::print_warning(&warning);
            }
            match format {
                OutputFormat::Json => output::print_item(&report, format),
                OutputFormat::Table => {
                    output::print_success(&format!("Document {document_id} deleted"));
                    output::print_kv("Blobs deleted", &report.blobs_deleted.to_string());
                    output::print_kv("Records deleted", &report.records_deleted.to_string());
                    output::print_kv("Blobs left behind", &report.failures.len().to_string());
                }
            }
        }
    }

    Ok(())
}
