//! Document version entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::{DocumentId, UserId, VersionId};

/// One immutable, numbered revision of a document's content.
///
/// No field changes after creation. A version is only ever destroyed
/// together with its blob, when the whole document goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Version {
    /// Unique version identifier.
    pub id: VersionId,
    /// The document this version belongs to.
    pub document_id: DocumentId,
    /// Sequential version number, unique within the document.
    pub version_number: i32,
    /// Key of this version's payload in the blob store.
    pub storage_key: String,
    /// Original file name supplied by the uploader.
    pub file_name: String,
    /// Payload size in bytes.
    pub file_size_bytes: i64,
    /// MIME type supplied by the uploader.
    pub mime_type: Option<String>,
    /// User the upload is attributed to.
    pub uploaded_by: UserId,
    /// When the record was persisted.
    pub uploaded_at: DateTime<Utc>,
}

/// Insert payload for a version record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVersion {
    pub document_id: DocumentId,
    pub version_number: i32,
    pub storage_key: String,
    pub file_name: String,
    pub file_size_bytes: i64,
    pub mime_type: Option<String>,
    pub uploaded_by: UserId,
}

impl NewVersion {
    /// Materialize the row a store holds after insertion.
    pub fn into_version(self, id: VersionId, uploaded_at: DateTime<Utc>) -> Version {
        Version {
            id,
            document_id: self.document_id,
            version_number: self.version_number,
            storage_key: self.storage_key,
            file_name: self.file_name,
            file_size_bytes: self.file_size_bytes,
            mime_type: self.mime_type,
            uploaded_by: self.uploaded_by,
            uploaded_at,
        }
    }
}
