//! # docvault-database
//!
//! Version record stores for DocVault: the store traits, the PostgreSQL
//! repositories behind them, an in-process store, connection pool
//! management, and the migration runner.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use memory::MemoryMetadataStore;
pub use repositories::{
    DocumentDirectory, PgDocumentRepository, PgVersionRepository, VersionRecordStore,
};
