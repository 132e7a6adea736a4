//! PostgreSQL version record repository.

use async_trait::async_trait;
use sqlx::PgPool;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::{DocumentId, VersionId};
use docvault_entity::version::{NewVersion, Version};

use super::VersionRecordStore;

/// Unique constraint guarding per-document version numbers.
const VERSION_NUMBER_CONSTRAINT: &str = "document_versions_document_id_version_number_key";
/// Unique constraint on storage keys.
const STORAGE_KEY_CONSTRAINT: &str = "document_versions_storage_key_key";
/// Foreign key from a version to its document.
const DOCUMENT_FK_CONSTRAINT: &str = "document_versions_document_id_fkey";

/// Translate a violated constraint into the error the in-memory store
/// reports for the same insert.
fn constraint_error(constraint: &str, data: &NewVersion) -> Option<AppError> {
    match constraint {
        VERSION_NUMBER_CONSTRAINT => Some(AppError::conflict(format!(
            "Version {} of document {} already exists",
            data.version_number, data.document_id
        ))),
        STORAGE_KEY_CONSTRAINT => Some(AppError::conflict(format!(
            "Storage key '{}' already recorded",
            data.storage_key
        ))),
        DOCUMENT_FK_CONSTRAINT => Some(AppError::document_not_found(data.document_id)),
        _ => None,
    }
}

/// Repository for document version records.
#[derive(Debug, Clone)]
pub struct PgVersionRepository {
    pool: PgPool,
}

impl PgVersionRepository {
    /// Create a new version repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionRecordStore for PgVersionRepository {
    async fn create(&self, data: &NewVersion) -> AppResult<Version> {
        sqlx::query_as::<_, Version>(
            "INSERT INTO document_versions \
             (id, document_id, version_number, storage_key, file_name, file_size_bytes, mime_type, uploaded_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(VersionId::new())
        .bind(data.document_id)
        .bind(data.version_number)
        .bind(&data.storage_key)
        .bind(&data.file_name)
        .bind(data.file_size_bytes)
        .bind(&data.mime_type)
        .bind(data.uploaded_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let mapped = match &e {
                sqlx::Error::Database(db_err) => db_err
                    .constraint()
                    .and_then(|constraint| constraint_error(constraint, data)),
                _ => None,
            };
            mapped.unwrap_or_else(|| {
                AppError::with_source(ErrorKind::Database, "Failed to create version", e)
            })
        })
    }

    async fn find_by_id(&self, id: VersionId) -> AppResult<Option<Version>> {
        sqlx::query_as::<_, Version>("SELECT * FROM document_versions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find version", e))
    }

    async fn max_version_number(&self, document_id: DocumentId) -> AppResult<Option<i32>> {
        sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(version_number) FROM document_versions WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to read max version number", e)
        })
    }

    async fn list_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM document_versions WHERE document_id = $1 ORDER BY version_number DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list versions", e))
    }

    async fn find_latest(&self, document_id: DocumentId) -> AppResult<Option<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM document_versions WHERE document_id = $1 \
             ORDER BY version_number DESC LIMIT 1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find latest version", e)
        })
    }

    async fn delete_by_document(&self, document_id: DocumentId) -> AppResult<Vec<Version>> {
        sqlx::query_as::<_, Version>(
            "DELETE FROM document_versions WHERE document_id = $1 RETURNING *",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete versions", e))
    }
}

#[cfg(test)]
mod tests {
    use docvault_core::types::UserId;

    use super::*;

    fn draft() -> NewVersion {
        NewVersion {
            document_id: DocumentId::new(),
            version_number: 3,
            storage_key: "doc_k_v3_abc.dwg".to_string(),
            file_name: "k.dwg".to_string(),
            file_size_bytes: 10,
            mime_type: None,
            uploaded_by: UserId::new(),
        }
    }

    #[test]
    fn test_constraints_map_like_memory_store() {
        let data = draft();
        let kind = |c: &str| constraint_error(c, &data).map(|e| e.kind);

        assert_eq!(kind(VERSION_NUMBER_CONSTRAINT), Some(ErrorKind::Conflict));
        assert_eq!(kind(STORAGE_KEY_CONSTRAINT), Some(ErrorKind::Conflict));
        assert_eq!(kind(DOCUMENT_FK_CONSTRAINT), Some(ErrorKind::DocumentNotFound));
        assert_eq!(kind("document_versions_version_number_check"), None);
    }
}
