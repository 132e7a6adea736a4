//! In-process metadata store.
//!
//! Holds documents and version records in memory behind a single
//! `tokio::sync::RwLock`. The uniqueness rules of the relational schema are
//! enforced here too: inserting a duplicate `(document_id, version_number)`
//! or a duplicate storage key fails with `Conflict`, so the coordinator's
//! retry loop behaves identically on both backends.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::{DocumentId, VersionId};
use docvault_entity::document::Document;
use docvault_entity::version::{NewVersion, Version};

use crate::repositories::{DocumentDirectory, VersionRecordStore};

#[derive(Debug, Default)]
struct Tables {
    documents: HashMap<DocumentId, Document>,
    /// Versions per document, kept in insertion order.
    versions: HashMap<DocumentId, Vec<Version>>,
}

/// Metadata store kept entirely in memory. Cloning shares the tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with the given title.
    pub async fn create_document(&self, title: &str) -> AppResult<Document> {
        let document = Document {
            id: DocumentId::new(),
            title: title.to_string(),
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .documents
            .insert(document.id, document.clone());
        Ok(document)
    }

    /// Find a document by ID.
    pub async fn find_document(&self, id: DocumentId) -> AppResult<Option<Document>> {
        Ok(self.tables.read().await.documents.get(&id).cloned())
    }

    /// Total number of version records across all documents.
    pub async fn version_count(&self) -> usize {
        self.tables.read().await.versions.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl VersionRecordStore for MemoryMetadataStore {
    async fn create(&self, data: &NewVersion) -> AppResult<Version> {
        let mut tables = self.tables.write().await;

        if !tables.documents.contains_key(&data.document_id) {
            return Err(AppError::document_not_found(data.document_id));
        }
        let key_taken = tables
            .versions
            .values()
            .flatten()
            .any(|v| v.storage_key == data.storage_key);
        if key_taken {
            return Err(AppError::conflict(format!(
                "Storage key '{}' already recorded",
                data.storage_key
            )));
        }

        let versions = tables.versions.entry(data.document_id).or_default();
        if versions
            .iter()
            .any(|v| v.version_number == data.version_number)
        {
            return Err(AppError::conflict(format!(
                "Version {} of document {} already exists",
                data.version_number, data.document_id
            )));
        }

        let version = data.clone().into_version(VersionId::new(), Utc::now());
        versions.push(version.clone());
        Ok(version)
    }

    async fn find_by_id(&self, id: VersionId) -> AppResult<Option<Version>> {
        let tables = self.tables.read().await;
        Ok(tables
            .versions
            .values()
            .flatten()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn max_version_number(&self, document_id: DocumentId) -> AppResult<Option<i32>> {
        let tables = self.tables.read().await;
        Ok(tables
            .versions
            .get(&document_id)
            .and_then(|versions| versions.iter().map(|v| v.version_number).max()))
    }

    async fn list_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        let tables = self.tables.read().await;
        let mut versions = tables
            .versions
            .get(&document_id)
            .cloned()
            .unwrap_or_default();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn find_latest(&self, document_id: DocumentId) -> AppResult<Option<Version>> {
        let tables = self.tables.read().await;
        Ok(tables.versions.get(&document_id).and_then(|versions| {
            versions
                .iter()
                .max_by_key(|v| v.version_number)
                .cloned()
        }))
    }

    async fn delete_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        let removed = self.tables.write().await.versions.remove(&document_id);
        Ok(removed.unwrap_or_default())
    }
}

#[async_trait]
impl DocumentDirectory for MemoryMetadataStore {
    async fn exists(&self, id: DocumentId) -> AppResult<bool> {
        Ok(self.tables.read().await.documents.contains_key(&id))
    }

    async fn delete(&self, id: DocumentId) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        tables.versions.remove(&id);
        Ok(tables.documents.remove(&id).is_some())
    }
}
