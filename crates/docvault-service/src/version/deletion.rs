//! Outcome of a blob-deletion sweep.

use serde::Serialize;

use docvault_core::types::{DocumentId, VersionId};

/// A blob that could not be removed while deleting a document's versions.
#[derive(Debug, Clone, Serialize)]
pub struct BlobDeletionFailure {
    pub version_id: VersionId,
    pub storage_key: String,
    pub reason: String,
}

/// Result of deleting a document's versions.
///
/// Failed blob deletions never abort the sweep; they are collected here so
/// metadata deletion can proceed while the leak stays visible.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    /// The document whose versions were swept.
    pub document_id: DocumentId,
    /// Number of versions whose blob was removed.
    pub blobs_deleted: usize,
    /// Number of version records removed. Zero until the caller deletes
    /// the records.
    pub records_deleted: u64,
    /// Blobs left behind.
    pub failures: Vec<BlobDeletionFailure>,
}

impl DeletionReport {
    pub(crate) fn new(document_id: DocumentId) -> Self {
        Self {
            document_id,
            blobs_deleted: 0,
            records_deleted: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every blob was removed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Aggregated warning naming every blob left behind, if any.
    pub fn warning(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let keys: Vec<&str> = self
            .failures
            .iter()
            .map(|f| f.storage_key.as_str())
            .collect();
        Some(format!(
            "{} of {} blob(s) of document {} could not be deleted: {}",
            self.failures.len(),
            self.failures.len() + self.blobs_deleted,
            self.document_id,
            keys.join(", ")
        ))
    }
}
