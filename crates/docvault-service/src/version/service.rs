//! Document version lifecycle coordinator.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use docvault_core::config::{StorageConfig, VersioningConfig};
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::blob_store::BlobStore;
use docvault_core::types::{DocumentId, VersionId};
use docvault_database::repositories::{DocumentDirectory, VersionRecordStore};
use docvault_entity::version::{NewVersion, Version};
use docvault_storage::key::{StorageKeyGenerator, validate_file_name};

use crate::context::RequestContext;

use super::allocator::VersionAllocator;
use super::deletion::{BlobDeletionFailure, DeletionReport};
use super::download::DownloadHandle;
use super::upload::{MAX_MIME_TYPE_BYTES, OrphanGuard, UploadRequest, UploadStage, limit_size};

/// Keeps version records and stored blobs consistent.
///
/// Every blob this service writes is either referenced by exactly one
/// version record or removed again (best effort) before the call returns.
#[derive(Debug, Clone)]
pub struct VersionService {
    /// Document existence and removal.
    documents: Arc<dyn DocumentDirectory>,
    /// Version record store.
    records: Arc<dyn VersionRecordStore>,
    /// Blob store holding version payloads.
    blobs: Arc<dyn BlobStore>,
    /// Storage key generator.
    keys: StorageKeyGenerator,
    /// Version number allocator.
    allocator: VersionAllocator,
    /// Upload size ceiling in bytes.
    max_upload_size_bytes: u64,
}

/// Blob written for an upload but not yet referenced by a record.
struct PendingBlob {
    version_number: i32,
    size_bytes: u64,
    guard: OrphanGuard,
}

impl VersionService {
    /// Creates a new version service.
    pub fn new(
        documents: Arc<dyn DocumentDirectory>,
        records: Arc<dyn VersionRecordStore>,
        blobs: Arc<dyn BlobStore>,
        storage: &StorageConfig,
        versioning: &VersioningConfig,
    ) -> Self {
        let allocator = VersionAllocator::new(Arc::clone(&records), versioning);
        Self {
            documents,
            records,
            blobs,
            keys: StorageKeyGenerator::new(storage.key_prefix.clone()),
            allocator,
            max_upload_size_bytes: storage.max_upload_size_bytes,
        }
    }

    /// Stores `request` as the next version of `document_id`.
    ///
    /// Validation happens before any I/O. Once the payload is in the blob
    /// store, every failure path removes it again before returning, and a
    /// dropped future removes it through [`OrphanGuard`].
    pub async fn upload_version(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
        request: UploadRequest,
    ) -> AppResult<Version> {
        let UploadRequest {
            file_name,
            mime_type,
            payload,
        } = request;

        validate_file_name(&file_name)?;
        let mime_type = mime_type.filter(|m| !m.trim().is_empty());
        if let Some(mime) = &mime_type {
            if mime.len() > MAX_MIME_TYPE_BYTES {
                return Err(AppError::validation(format!(
                    "MIME type exceeds {MAX_MIME_TYPE_BYTES} bytes"
                )));
            }
        }
        if !self.documents.exists(document_id).await? {
            return Err(AppError::document_not_found(document_id));
        }

        debug!(document_id = %document_id, stage = %UploadStage::Allocating, "Upload started");
        let version_number = self.allocator.next_version_number(document_id).await?;
        let storage_key = self.keys.generate(document_id, version_number, &file_name)?;
        debug!(
            document_id = %document_id,
            version_number,
            storage_key = %storage_key,
            stage = %UploadStage::KeyGenerated,
            "Storage key generated"
        );

        let mut guard = OrphanGuard::new(Arc::clone(&self.blobs), storage_key.clone());
        let (payload, exceeded) = limit_size(payload, self.max_upload_size_bytes);
        let size_bytes = match self.blobs.put(&storage_key, payload).await {
            Ok(n) => n,
            Err(e) => {
                let e = if exceeded.load(Ordering::Relaxed) {
                    AppError::validation(format!(
                        "File exceeds maximum upload size of {} bytes",
                        self.max_upload_size_bytes
                    ))
                } else {
                    e
                };
                self.discard(&mut guard, &e).await;
                return Err(e);
            }
        };
        debug!(
            document_id = %document_id,
            storage_key = %storage_key,
            bytes = size_bytes,
            stage = %UploadStage::BlobWritten,
            "Payload stored"
        );

        let mut pending = PendingBlob {
            version_number,
            size_bytes,
            guard,
        };
        match self
            .persist(ctx, document_id, &file_name, mime_type, &mut pending)
            .await
        {
            Ok(version) => {
                pending.guard.disarm();
                info!(
                    user_id = %ctx.user_id,
                    document_id = %document_id,
                    version_id = %version.id,
                    version_number = version.version_number,
                    storage_key = %version.storage_key,
                    bytes = version.file_size_bytes,
                    stage = %UploadStage::RecordPersisted,
                    "Version uploaded"
                );
                Ok(version)
            }
            Err(e) => {
                self.discard(&mut pending.guard, &e).await;
                Err(e)
            }
        }
    }

    /// Writes the version record, re-allocating on number conflicts.
    ///
    /// Each retry renames the already-written blob to a key carrying the
    /// new number, since the payload stream cannot be replayed.
    async fn persist(
        &self,
        ctx: &RequestContext,
        document_id: DocumentId,
        file_name: &str,
        mime_type: Option<String>,
        pending: &mut PendingBlob,
    ) -> AppResult<Version> {
        let file_size_bytes = i64::try_from(pending.size_bytes)
            .map_err(|_| AppError::validation("Payload size exceeds supported range"))?;
        let max_attempts = self.allocator.max_attempts();

        for attempt in 1..=max_attempts {
            let draft = NewVersion {
                document_id,
                version_number: pending.version_number,
                storage_key: pending.guard.key().to_string(),
                file_name: file_name.to_string(),
                file_size_bytes,
                mime_type: mime_type.clone(),
                uploaded_by: ctx.user_id,
            };

            let err = match self.records.create(&draft).await {
                Ok(version) => return Ok(version),
                Err(e) if e.is_conflict() => e,
                Err(e) => return Err(e),
            };

            warn!(
                document_id = %document_id,
                version_number = pending.version_number,
                attempt,
                max_attempts,
                error = %err,
                "Version number taken by a concurrent upload"
            );
            if attempt == max_attempts {
                break;
            }

            tokio::time::sleep(self.allocator.retry_delay(attempt)).await;
            let next_number = self.allocator.next_version_number(document_id).await?;
            let next_key = self.keys.generate(document_id, next_number, file_name)?;
            self.blobs.rename(pending.guard.key(), &next_key).await?;
            pending.guard.rekey(next_key);
            pending.version_number = next_number;
        }

        Err(AppError::version_conflict(format!(
            "Could not allocate a version number for document {document_id} \
             after {max_attempts} attempt(s)"
        )))
    }

    /// Best-effort removal of an unreferenced blob. Never fails the caller.
    async fn discard(&self, guard: &mut OrphanGuard, cause: &AppError) {
        let key = guard.key().to_string();
        match self.blobs.delete(&key).await {
            Ok(()) => debug!(storage_key = %key, "Removed orphan blob"),
            Err(e) => warn!(
                storage_key = %key,
                error = %e,
                "Failed to remove orphan blob"
            ),
        }
        guard.disarm();
        warn!(
            storage_key = %key,
            error = %cause,
            stage = %UploadStage::Failed,
            "Upload failed"
        );
    }

    /// All versions of a document, highest version number first.
    pub async fn list_versions(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        self.require_document(document_id).await?;
        self.records.list_by_document(document_id).await
    }

    /// The document's current (highest-numbered) version, if any.
    pub async fn current_version(&self, document_id: DocumentId) -> AppResult<Option<Version>> {
        self.require_document(document_id).await?;
        self.records.find_latest(document_id).await
    }

    /// A version record by ID.
    pub async fn get_version(&self, version_id: VersionId) -> AppResult<Version> {
        self.records
            .find_by_id(version_id)
            .await?
            .ok_or_else(|| AppError::version_not_found(version_id))
    }

    /// Deletes the blob of every version of a document.
    ///
    /// Individual failures are logged and collected in the report; the
    /// sweep always visits every version. Records are left for the caller.
    pub async fn delete_all_versions(&self, document_id: DocumentId) -> AppResult<DeletionReport> {
        self.require_document(document_id).await?;
        let versions = self.records.list_by_document(document_id).await?;

        let mut report = DeletionReport::new(document_id);
        self.sweep_blobs(&mut report, &versions).await;

        if let Some(warning) = report.warning() {
            warn!(document_id = %document_id, "{warning}");
        }
        Ok(report)
    }

    /// Deletes a document: every blob, then every record, then the document.
    ///
    /// Records committed by an upload after the first sweep are returned by
    /// the record deletion and swept too. Blob failures are reported but
    /// never block the metadata deletion.
    pub async fn delete_document(&self, document_id: DocumentId) -> AppResult<DeletionReport> {
        self.require_document(document_id).await?;
        let listed = self.records.list_by_document(document_id).await?;

        let mut report = DeletionReport::new(document_id);
        self.sweep_blobs(&mut report, &listed).await;

        let removed = self.records.delete_by_document(document_id).await?;
        report.records_deleted = removed.len() as u64;

        let swept: HashSet<VersionId> = listed.iter().map(|v| v.id).collect();
        let late: Vec<Version> = removed
            .into_iter()
            .filter(|v| !swept.contains(&v.id))
            .collect();
        if !late.is_empty() {
            debug!(
                document_id = %document_id,
                count = late.len(),
                "Sweeping versions committed during deletion"
            );
            self.sweep_blobs(&mut report, &late).await;
        }

        self.documents.delete(document_id).await?;

        if let Some(warning) = report.warning() {
            warn!(document_id = %document_id, "{warning}");
        }
        info!(
            document_id = %document_id,
            blobs_deleted = report.blobs_deleted,
            records_deleted = report.records_deleted,
            blob_failures = report.failures.len(),
            "Document deleted"
        );
        Ok(report)
    }

    /// Deletes each version's blob, recording failures without stopping.
    async fn sweep_blobs(&self, report: &mut DeletionReport, versions: &[Version]) {
        for version in versions {
            match self.blobs.delete(&version.storage_key).await {
                Ok(()) => report.blobs_deleted += 1,
                Err(e) => {
                    warn!(
                        document_id = %version.document_id,
                        version_id = %version.id,
                        storage_key = %version.storage_key,
                        error = %e,
                        "Failed to delete version blob"
                    );
                    report.failures.push(BlobDeletionFailure {
                        version_id: version.id,
                        storage_key: version.storage_key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Opens a version's payload for download.
    pub async fn resolve_for_download(&self, version_id: VersionId) -> AppResult<DownloadHandle> {
        let version = self.get_version(version_id).await?;
        let stream = self.blobs.get(&version.storage_key).await.map_err(|e| {
            if e.kind == ErrorKind::BlobNotFound {
                warn!(
                    version_id = %version.id,
                    storage_key = %version.storage_key,
                    "Version record references a missing blob"
                );
            }
            e
        })?;
        debug!(version_id = %version.id, storage_key = %version.storage_key, "Resolved download");
        Ok(DownloadHandle::new(version, stream))
    }

    async fn require_document(&self, document_id: DocumentId) -> AppResult<()> {
        if self.documents.exists(document_id).await? {
            Ok(())
        } else {
            Err(AppError::document_not_found(document_id))
        }
    }
}
