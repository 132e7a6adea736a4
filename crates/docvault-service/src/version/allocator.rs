//! Version number allocation.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use docvault_core::config::VersioningConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::DocumentId;
use docvault_database::repositories::VersionRecordStore;

/// Computes the next version number for a document.
///
/// The number is only a proposal: two uploads may read the same maximum.
/// The record store's unique `(document_id, version_number)` constraint
/// decides which one wins, and the loser retries with a fresh proposal.
#[derive(Debug, Clone)]
pub struct VersionAllocator {
    records: Arc<dyn VersionRecordStore>,
    max_attempts: u32,
    backoff: Duration,
}

impl VersionAllocator {
    /// Creates an allocator reading from `records`.
    pub fn new(records: Arc<dyn VersionRecordStore>, config: &VersioningConfig) -> Self {
        Self {
            records,
            max_attempts: config.max_allocation_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// `max + 1` over the document's existing versions, or `1`.
    pub async fn next_version_number(&self, document_id: DocumentId) -> AppResult<i32> {
        match self.records.max_version_number(document_id).await? {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                AppError::validation(format!(
                    "Document {document_id} has exhausted its version numbers"
                ))
            }),
        }
    }

    /// Number of persistence attempts per upload.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `attempt` (1-based): the base backoff
    /// scaled by the attempt, plus up to one base backoff of jitter.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.backoff.as_millis() as u64;
        if base == 0 {
            return Duration::ZERO;
        }
        let jitter = rand::thread_rng().gen_range(0..=base);
        Duration::from_millis(base.saturating_mul(u64::from(attempt)) + jitter)
    }
}

#[cfg(test)]
mod tests {
    use docvault_core::types::UserId;
    use docvault_database::MemoryMetadataStore;
    use docvault_entity::version::NewVersion;

    use super::*;

    fn config(attempts: u32, backoff_ms: u64) -> VersioningConfig {
        VersioningConfig {
            max_allocation_attempts: attempts,
            retry_backoff_ms: backoff_ms,
        }
    }

    #[tokio::test]
    async fn test_first_version_is_one() {
        let store = MemoryMetadataStore::new();
        let doc = store.create_document("Fresh").await.unwrap();
        let allocator = VersionAllocator::new(Arc::new(store), &config(3, 10));

        assert_eq!(allocator.next_version_number(doc.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_next_follows_max() {
        let store = MemoryMetadataStore::new();
        let doc = store.create_document("Busy").await.unwrap();
        for n in [1, 2, 7] {
            VersionRecordStore::create(
                &store,
                &NewVersion {
                    document_id: doc.id,
                    version_number: n,
                    storage_key: format!("k{n}"),
                    file_name: "a.txt".to_string(),
                    file_size_bytes: 0,
                    mime_type: None,
                    uploaded_by: UserId::new(),
                },
            )
            .await
            .unwrap();
        }
        let allocator = VersionAllocator::new(Arc::new(store), &config(3, 10));

        assert_eq!(allocator.next_version_number(doc.id).await.unwrap(), 8);
    }

    #[test]
    fn test_retry_delay_bounds() {
        let allocator = VersionAllocator::new(Arc::new(MemoryMetadataStore::new()), &config(3, 10));
        for attempt in 1..=3 {
            let delay = allocator.retry_delay(attempt).as_millis() as u64;
            assert!(delay >= 10 * u64::from(attempt));
            assert!(delay <= 10 * u64::from(attempt) + 10);
        }

        let instant = VersionAllocator::new(Arc::new(MemoryMetadataStore::new()), &config(0, 0));
        assert_eq!(instant.retry_delay(5), Duration::ZERO);
        assert_eq!(instant.max_attempts(), 1);
    }
}
