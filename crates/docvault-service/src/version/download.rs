//! Download handle returned for a resolved version.

use std::fmt;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::blob_store::ByteStream;
use docvault_entity::version::Version;

/// Content type used when the uploader did not supply one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An opened version payload plus what a response needs to frame it.
pub struct DownloadHandle {
    /// The resolved version record.
    pub version: Version,
    /// Payload stream opened from the blob store.
    pub stream: ByteStream,
    /// MIME type to serve.
    pub content_type: String,
    /// Original file name for attachment framing.
    pub file_name: String,
}

impl DownloadHandle {
    pub(crate) fn new(version: Version, stream: ByteStream) -> Self {
        let content_type = version
            .mime_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let file_name = version.file_name.clone();
        Self {
            version,
            stream,
            content_type,
            file_name,
        }
    }

    /// `Content-Disposition` value that forces a download.
    pub fn content_disposition(&self) -> String {
        let mut escaped = String::with_capacity(self.file_name.len());
        for c in self.file_name.chars() {
            match c {
                '"' | '\\' => {
                    escaped.push('\\');
                    escaped.push(c);
                }
                c if c.is_control() => {}
                c => escaped.push(c),
            }
        }
        format!("attachment; filename=\"{escaped}\"")
    }

    /// Read the whole payload into memory.
    pub async fn into_bytes(mut self) -> AppResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::with_source(
                    ErrorKind::BlobIo,
                    format!("Failed to read blob: {}", self.version.storage_key),
                    e,
                )
            })?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Debug for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadHandle")
            .field("version_id", &self.version.id)
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use docvault_core::traits::blob_store::stream_from_bytes;
    use docvault_core::types::{DocumentId, UserId, VersionId};

    use super::*;

    fn version(file_name: &str, mime_type: Option<&str>) -> Version {
        Version {
            id: VersionId::new(),
            document_id: DocumentId::new(),
            version_number: 1,
            storage_key: "doc_x_v1_00".to_string(),
            file_name: file_name.to_string(),
            file_size_bytes: 5,
            mime_type: mime_type.map(str::to_string),
            uploaded_by: UserId::new(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_content_type_defaults() {
        let handle = DownloadHandle::new(version("a.bin", None), stream_from_bytes(Bytes::new()));
        assert_eq!(handle.content_type, DEFAULT_CONTENT_TYPE);

        let handle = DownloadHandle::new(
            version("a.pdf", Some("application/pdf")),
            stream_from_bytes(Bytes::new()),
        );
        assert_eq!(handle.content_type, "application/pdf");
    }

    #[test]
    fn test_content_disposition_escapes() {
        let handle = DownloadHandle::new(
            version("my \"final\"\\draft.txt", None),
            stream_from_bytes(Bytes::new()),
        );
        assert_eq!(
            handle.content_disposition(),
            r#"attachment; filename="my \"final\"\\draft.txt""#
        );
    }

    #[tokio::test]
    async fn test_into_bytes() {
        let handle = DownloadHandle::new(
            version("a.txt", Some("text/plain")),
            stream_from_bytes(Bytes::from("hello")),
        );
        assert_eq!(handle.into_bytes().await.unwrap(), Bytes::from("hello"));
    }
}
