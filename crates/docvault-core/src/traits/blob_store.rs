//! Blob store trait for durable, key-addressed payload storage.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// A byte stream type used for reading and writing blob contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Wrap an in-memory payload as a single-chunk [`ByteStream`].
pub fn stream_from_bytes(data: Bytes) -> ByteStream {
    Box::pin(futures::stream::once(async move { Ok(data) }))
}

/// Durable key-value byte storage.
///
/// Keys are opaque strings produced by the storage key generator. Every
/// implementation must reject keys that would escape its namespace before
/// performing any I/O.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g., "local").
    fn backend(&self) -> &str;

    /// Check whether the backend is reachable and writable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write a byte stream under `key`, replacing existing content.
    ///
    /// Returns the number of bytes written.
    async fn put(&self, key: &str, stream: ByteStream) -> AppResult<u64>;

    /// Write an in-memory payload under `key`.
    async fn put_bytes(&self, key: &str, data: Bytes) -> AppResult<u64> {
        self.put(key, stream_from_bytes(data)).await
    }

    /// Open the blob stored under `key`.
    ///
    /// Fails with `BlobNotFound` when the key is absent or unreadable.
    async fn get(&self, key: &str) -> AppResult<ByteStream>;

    /// Delete the blob stored under `key`. An absent key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Move a blob to a new key.
    async fn rename(&self, from: &str, to: &str) -> AppResult<()>;

    /// Check whether a blob exists under `key`.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}
