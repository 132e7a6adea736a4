//! Version record store and document directory traits, with their
//! PostgreSQL implementations.

pub mod document;
pub mod version;

use async_trait::async_trait;

use docvault_core::result::AppResult;
use docvault_core::types::{DocumentId, VersionId};
use docvault_entity::version::{NewVersion, Version};

pub use document::PgDocumentRepository;
pub use version::PgVersionRepository;

/// Durable store of version records.
///
/// Records are write-once; there is no update operation.
#[async_trait]
pub trait VersionRecordStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a version record.
    ///
    /// Fails with `Conflict` when the document already has a record with
    /// the same version number.
    async fn create(&self, data: &NewVersion) -> AppResult<Version>;

    /// Find a version record by ID.
    async fn find_by_id(&self, id: VersionId) -> AppResult<Option<Version>>;

    /// Highest version number recorded for a document.
    async fn max_version_number(&self, document_id: DocumentId) -> AppResult<Option<i32>>;

    /// All versions of a document, highest version number first.
    async fn list_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>>;

    /// The version with the highest number, if any.
    async fn find_latest(&self, document_id: DocumentId) -> AppResult<Option<Version>>;

    /// Remove every version record of a document and return the removed
    /// records, including any committed after the caller last listed them.
    async fn delete_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>>;
}

/// Existence and removal of documents, owned by the document aggregate.
#[async_trait]
pub trait DocumentDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Whether a document exists.
    async fn exists(&self, id: DocumentId) -> AppResult<bool>;

    /// Delete a document and, by cascade, its version records.
    /// Returns `true` if a document was removed.
    async fn delete(&self, id: DocumentId) -> AppResult<bool>;
}
