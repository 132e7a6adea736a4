//! Local filesystem blob store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::blob_store::{BlobStore, ByteStream};

/// Name of the file written by the writability probe.
const PROBE_FILE: &str = ".docvault-probe";

/// Blob store that keeps one file per key under a single root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open an existing root directory, verifying it is writable.
    pub async fn open(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref();
        let meta = fs::metadata(root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Storage root is not accessible: {}", root.display()),
                e,
            )
        })?;
        if !meta.is_dir() {
            return Err(AppError::configuration(format!(
                "Storage root is not a directory: {}",
                root.display()
            )));
        }

        let store = Self {
            root: root.to_path_buf(),
        };
        store.probe_write().await.map_err(|e| {
            AppError::configuration(format!(
                "Storage root is not writable: {}: {}",
                root.display(),
                e.message
            ))
        })?;
        Ok(store)
    }

    /// Create the root directory if needed, then open it.
    pub async fn create(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref();
        fs::create_dir_all(root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::BlobIo,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Self::open(root).await
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path inside the root.
    ///
    /// Runs before any I/O; a key that could name anything outside the root
    /// is rejected with `InvalidFileName`.
    fn key_path(&self, key: &str) -> AppResult<PathBuf> {
        if key.is_empty() || key.contains('\0') {
            return Err(AppError::invalid_file_name(format!(
                "Invalid storage key: {key:?}"
            )));
        }
        if key
            .split(['/', '\\'])
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(AppError::invalid_file_name(format!(
                "Path traversal not allowed: {key}"
            )));
        }
        if Path::new(key)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::invalid_file_name(format!(
                "Storage key contains unsafe path component: {key}"
            )));
        }
        Ok(self.root.join(key))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::BlobIo,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    async fn probe_write(&self) -> AppResult<()> {
        let probe = self.root.join(PROBE_FILE);
        fs::write(&probe, b"ok").await.map_err(|e| {
            AppError::with_source(ErrorKind::BlobIo, "Failed to write probe file", e)
        })?;
        fs::remove_file(&probe).await.map_err(|e| {
            AppError::with_source(ErrorKind::BlobIo, "Failed to remove probe file", e)
        })?;
        Ok(())
    }

    /// Stream `stream` into `path`, returning the byte count.
    async fn write_file(&self, path: &Path, key: &str, mut stream: ByteStream) -> AppResult<u64> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            AppError::with_source(ErrorKind::BlobIo, format!("Failed to create blob: {key}"), e)
        })?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::with_source(ErrorKind::BlobIo, format!("Payload read error: {key}"), e)
            })?;
            total_bytes += chunk.len() as u64;
            file.write_all(&chunk).await.map_err(|e| {
                AppError::with_source(ErrorKind::BlobIo, format!("Failed to write blob: {key}"), e)
            })?;
        }

        file.flush().await.map_err(|e| {
            AppError::with_source(ErrorKind::BlobIo, format!("Failed to flush blob: {key}"), e)
        })?;
        file.sync_all().await.map_err(|e| {
            AppError::with_source(ErrorKind::BlobIo, format!("Failed to sync blob: {key}"), e)
        })?;
        Ok(total_bytes)
    }
}

/// Staging file of an in-flight `put`.
///
/// Removed on drop unless committed, so a failed write and a dropped
/// `put` future both leave nothing behind. The unlink is synchronous
/// because `Drop` cannot await.
struct StagingFile {
    path: PathBuf,
    committed: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file was renamed to its final key.
    fn committed(&mut self) {
        self.committed = true;
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed staging file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staging file"
            ),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn backend(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(self.probe_write().await.is_ok()),
            _ => Ok(false),
        }
    }

    async fn put(&self, key: &str, stream: ByteStream) -> AppResult<u64> {
        let full_path = self.key_path(key)?;
        self.ensure_parent(&full_path).await?;

        // Readers never observe a half-written blob under its final key.
        let mut staging = StagingFile::new(full_path.with_file_name(format!(
            ".{}.partial",
            full_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        )));

        let total_bytes = self.write_file(staging.path(), key, stream).await?;
        fs::rename(staging.path(), &full_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::BlobIo, format!("Failed to commit blob: {key}"), e)
        })?;
        staging.committed();

        debug!(key, bytes = total_bytes, "Wrote blob");
        Ok(total_bytes)
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        let full_path = self.key_path(key)?;
        let file = fs::File::open(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::BlobNotFound,
                format!("Blob not found or unreadable: {key}"),
                e,
            )
        })?;

        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_path = self.key_path(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::BlobIo,
                format!("Failed to delete blob: {key}"),
                e,
            )),
        }
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.key_path(from)?;
        let to_path = self.key_path(to)?;
        self.ensure_parent(&to_path).await?;

        fs::rename(&from_path, &to_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::with_source(
                    ErrorKind::BlobNotFound,
                    format!("Blob not found: {from}"),
                    e,
                )
            } else {
                AppError::with_source(
                    ErrorKind::BlobIo,
                    format!("Failed to rename {from} -> {to}"),
                    e,
                )
            }
        })?;
        debug!(from, to, "Renamed blob");
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_path = self.key_path(key)?;
        fs::try_exists(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::BlobIo,
                format!("Failed to stat blob: {key}"),
                e,
            )
        })
    }
}
