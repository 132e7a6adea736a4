//! CLI command definitions and dispatch.

pub mod config;
pub mod document;
pub mod download;
pub mod health;
pub mod migrate;
pub mod upload;
pub mod versions;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use docvault_core::config::AppConfig;
use docvault_core::result::AppResult;
use docvault_database::{DatabasePool, PgDocumentRepository, PgVersionRepository};
use docvault_service::VersionService;
use docvault_storage::LocalBlobStore;

use crate::output::OutputFormat;

/// DocVault: document version and blob storage
#[derive(Debug, Parser)]
#[command(name = "docvault", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Document management
    Document(document::DocumentArgs),
    /// Upload a file as the next version of a document
    Upload(upload::UploadArgs),
    /// List the versions of a document
    Versions(versions::VersionsArgs),
    /// Show the current version of a document
    Current(versions::VersionsArgs),
    /// Download a version's payload
    Download(download::DownloadArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
    /// Check database and blob store health
    Health,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::Document(args) => document::execute(args, &config, self.format).await,
            Commands::Upload(args) => upload::execute(args, &config, self.format).await,
            Commands::Versions(args) => versions::list(args, &config, self.format).await,
            Commands::Current(args) => versions::current(args, &config, self.format).await,
            Commands::Download(args) => download::execute(args, &config).await,
            Commands::Config(args) => config::execute(args, &config, self.format),
            Commands::Health => health::execute(&config).await,
        }
    }
}

/// Collaborators wired from configuration.
///
/// Every command runs in its own process, so the metadata must outlive it:
/// the CLI only runs against the PostgreSQL backend.
#[derive(Debug)]
pub struct Runtime {
    pub service: VersionService,
    pub documents: PgDocumentRepository,
    pub blobs: Arc<LocalBlobStore>,
    pub pool: DatabasePool,
}

impl Runtime {
    /// Connect to the configured backends.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        let pool = DatabasePool::for_metadata(config).await?;
        let blobs = Arc::new(LocalBlobStore::open(&config.storage.root_path).await?);

        let documents = PgDocumentRepository::new(pool.pool().clone());
        let service = VersionService::new(
            Arc::new(documents.clone()),
            Arc::new(PgVersionRepository::new(pool.pool().clone())),
            blobs.clone(),
            &config.storage,
            &config.versioning,
        );

        Ok(Self {
            service,
            documents,
            blobs,
            pool,
        })
    }
}
