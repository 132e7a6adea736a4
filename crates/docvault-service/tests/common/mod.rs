//! Shared fixtures for service integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use docvault_core::config::{StorageConfig, VersioningConfig};
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::blob_store::{BlobStore, ByteStream};
use docvault_core::types::{DocumentId, UserId, VersionId};
use docvault_database::MemoryMetadataStore;
use docvault_database::repositories::VersionRecordStore;
use docvault_entity::version::{NewVersion, Version};
use docvault_service::{RequestContext, UploadRequest, VersionService};
use docvault_storage::LocalBlobStore;

/// A service over a temporary blob root and an in-memory metadata store.
pub struct Harness {
    pub dir: TempDir,
    pub blobs: Arc<LocalBlobStore>,
    pub metadata: MemoryMetadataStore,
    pub service: VersionService,
    pub ctx: RequestContext,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_versioning(default_versioning()).await
    }

    pub async fn with_versioning(versioning: VersioningConfig) -> Self {
        let metadata = MemoryMetadataStore::new();
        Self::build(metadata.clone(), Arc::new(metadata), versioning, default_storage()).await
    }

    pub async fn with_records(
        records: Arc<dyn VersionRecordStore>,
        metadata: MemoryMetadataStore,
    ) -> Self {
        Self::build(metadata, records, default_versioning(), default_storage()).await
    }

    pub async fn with_storage(storage: StorageConfig) -> Self {
        let metadata = MemoryMetadataStore::new();
        Self::build(metadata.clone(), Arc::new(metadata), default_versioning(), storage).await
    }

    async fn build(
        metadata: MemoryMetadataStore,
        records: Arc<dyn VersionRecordStore>,
        versioning: VersioningConfig,
        storage: StorageConfig,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(LocalBlobStore::open(dir.path()).await.unwrap());
        let service = VersionService::new(
            Arc::new(metadata.clone()),
            records,
            blobs.clone(),
            &storage,
            &versioning,
        );
        Self {
            dir,
            blobs,
            metadata,
            service,
            ctx: RequestContext::new(UserId::new()),
        }
    }

    pub async fn document(&self) -> DocumentId {
        self.metadata.create_document("Test document").await.unwrap().id
    }

    pub async fn upload(&self, document_id: DocumentId, name: &str, body: &str) -> AppResult<Version> {
        self.service
            .upload_version(
                &self.ctx,
                document_id,
                UploadRequest::from_bytes(name, Some("text/plain".to_string()), body.to_string()),
            )
            .await
    }

    /// Names of every file under the blob root.
    pub fn blob_files(&self) -> HashSet<String> {
        std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

pub fn default_versioning() -> VersioningConfig {
    VersioningConfig {
        max_allocation_attempts: 3,
        retry_backoff_ms: 1,
    }
}

pub fn default_storage() -> StorageConfig {
    StorageConfig {
        key_prefix: "doc".to_string(),
        ..StorageConfig::default()
    }
}

/// How [`ScriptedRecords`] treats `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBehavior {
    /// Delegate to the inner store.
    Delegate,
    /// Fail with a database error.
    Fail,
    /// Always report a version-number conflict.
    Conflict,
    /// Signal `entered` and never complete.
    Hang,
}

/// Version record store that delegates reads to a memory store and follows
/// a script for writes.
#[derive(Debug)]
pub struct ScriptedRecords {
    pub inner: MemoryMetadataStore,
    pub behavior: CreateBehavior,
    pub entered: Arc<Notify>,
    pub create_calls: AtomicUsize,
}

impl ScriptedRecords {
    pub fn new(inner: MemoryMetadataStore, behavior: CreateBehavior) -> Self {
        Self {
            inner,
            behavior,
            entered: Arc::new(Notify::new()),
            create_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VersionRecordStore for ScriptedRecords {
    async fn create(&self, data: &NewVersion) -> AppResult<Version> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            CreateBehavior::Delegate => self.inner.create(data).await,
            CreateBehavior::Fail => Err(AppError::database("connection reset")),
            CreateBehavior::Conflict => Err(AppError::conflict("version number taken")),
            CreateBehavior::Hang => {
                self.entered.notify_one();
                std::future::pending().await
            }
        }
    }

    async fn find_by_id(&self, id: VersionId) -> AppResult<Option<Version>> {
        self.inner.find_by_id(id).await
    }

    async fn max_version_number(&self, document_id: DocumentId) -> AppResult<Option<i32>> {
        self.inner.max_version_number(document_id).await
    }

    async fn list_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        self.inner.list_by_document(document_id).await
    }

    async fn find_latest(&self, document_id: DocumentId) -> AppResult<Option<Version>> {
        self.inner.find_latest(document_id).await
    }

    async fn delete_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        self.inner.delete_by_document(document_id).await
    }
}

/// Version record store that commits a queued version right after the
/// next listing, as an upload finishing mid-deletion would.
#[derive(Debug)]
pub struct LateCommitRecords {
    pub inner: MemoryMetadataStore,
    pub late: Mutex<Option<NewVersion>>,
}

impl LateCommitRecords {
    pub fn new(inner: MemoryMetadataStore, late: NewVersion) -> Self {
        Self {
            inner,
            late: Mutex::new(Some(late)),
        }
    }
}

#[async_trait]
impl VersionRecordStore for LateCommitRecords {
    async fn create(&self, data: &NewVersion) -> AppResult<Version> {
        self.inner.create(data).await
    }

    async fn find_by_id(&self, id: VersionId) -> AppResult<Option<Version>> {
        self.inner.find_by_id(id).await
    }

    async fn max_version_number(&self, document_id: DocumentId) -> AppResult<Option<i32>> {
        self.inner.max_version_number(document_id).await
    }

    async fn list_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        let listed = self.inner.list_by_document(document_id).await?;
        let late = self.late.lock().unwrap().take();
        if let Some(late) = late {
            self.inner.create(&late).await?;
        }
        Ok(listed)
    }

    async fn find_latest(&self, document_id: DocumentId) -> AppResult<Option<Version>> {
        self.inner.find_latest(document_id).await
    }

    async fn delete_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        self.inner.delete_by_document(document_id).await
    }
}

/// Blob store whose deletes fail for keys containing a marker.
#[derive(Debug)]
pub struct StickyBlobs {
    pub inner: LocalBlobStore,
    pub sticky_marker: String,
}

#[async_trait]
impl BlobStore for StickyBlobs {
    fn backend(&self) -> &str {
        "sticky"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn put(&self, key: &str, stream: ByteStream) -> AppResult<u64> {
        self.inner.put(key, stream).await
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        if key.contains(&self.sticky_marker) {
            return Err(AppError::blob_io(format!("Device busy: {key}")));
        }
        self.inner.delete(key).await
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        self.inner.rename(from, to).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }
}
