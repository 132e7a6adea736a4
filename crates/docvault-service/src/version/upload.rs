//! Upload inputs, stages, and the orphan-blob guard.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures::StreamExt;
use tracing::{debug, warn};

use docvault_core::traits::blob_store::{BlobStore, ByteStream, stream_from_bytes};

/// Longest accepted MIME type, in bytes.
pub const MAX_MIME_TYPE_BYTES: usize = 100;

/// A payload to store as the next version of a document.
pub struct UploadRequest {
    /// Original file name; only its extension reaches the storage key.
    pub file_name: String,
    /// MIME type reported by the uploader.
    pub mime_type: Option<String>,
    /// Payload bytes. Consumed exactly once.
    pub payload: ByteStream,
}

impl UploadRequest {
    /// Creates a streaming upload request.
    pub fn new(file_name: impl Into<String>, mime_type: Option<String>, payload: ByteStream) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type,
            payload,
        }
    }

    /// Creates an upload request for an in-memory payload.
    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self::new(file_name, mime_type, stream_from_bytes(data.into()))
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Progress of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Computing the next version number.
    Allocating,
    /// Storage key chosen; nothing written yet.
    KeyGenerated,
    /// Payload stored; no record references it yet.
    BlobWritten,
    /// Record persisted; the upload is complete.
    RecordPersisted,
    /// The upload failed and its blob, if any, was discarded.
    Failed,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocating => write!(f, "allocating"),
            Self::KeyGenerated => write!(f, "key_generated"),
            Self::BlobWritten => write!(f, "blob_written"),
            Self::RecordPersisted => write!(f, "record_persisted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Wrap `payload` so it fails once more than `limit` bytes have passed.
///
/// The returned flag is set when the limit tripped, which lets the caller
/// tell an oversized upload apart from a storage failure.
pub(crate) fn limit_size(payload: ByteStream, limit: u64) -> (ByteStream, Arc<AtomicBool>) {
    let exceeded = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&exceeded);
    let mut seen = 0u64;

    let limited = payload.map(move |chunk| {
        let chunk = chunk?;
        seen += chunk.len() as u64;
        if seen > limit {
            flag.store(true, Ordering::Relaxed);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("payload exceeds {limit} bytes"),
            ));
        }
        Ok(chunk)
    });

    (Box::pin(limited), exceeded)
}

/// Deletes a written blob unless disarmed.
///
/// Covers the one path explicit cleanup cannot: the upload future being
/// dropped between the blob write and the record write. The delete is
/// spawned on the current Tokio runtime since `Drop` cannot await.
pub(crate) struct OrphanGuard {
    blobs: Arc<dyn BlobStore>,
    key: String,
    armed: bool,
}

impl OrphanGuard {
    pub(crate) fn new(blobs: Arc<dyn BlobStore>, key: String) -> Self {
        Self {
            blobs,
            key,
            armed: true,
        }
    }

    /// Key currently protected by the guard.
    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// Follow the blob to its new key after a rename.
    pub(crate) fn rekey(&mut self, key: String) {
        self.key = key;
    }

    /// The blob is referenced by a record or already removed.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for OrphanGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let key = std::mem::take(&mut self.key);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let blobs = Arc::clone(&self.blobs);
                debug!(storage_key = %key, "Upload abandoned, removing orphan blob");
                handle.spawn(async move {
                    if let Err(e) = blobs.delete(&key).await {
                        warn!(storage_key = %key, error = %e, "Failed to remove orphan blob");
                    }
                });
            }
            Err(_) => {
                warn!(storage_key = %key, "No runtime to remove orphan blob");
            }
        }
    }
}
