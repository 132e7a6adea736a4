//! Unified application error types for DocVault.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Error kind categorization used across the entire workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No document exists with the supplied identifier.
    DocumentNotFound,
    /// No version record exists with the supplied identifier.
    VersionNotFound,
    /// A file name or storage key failed traversal-safety validation.
    InvalidFileName,
    /// Input violated a size or format limit.
    Validation,
    /// A unique constraint rejected a write.
    Conflict,
    /// Version allocation kept colliding with concurrent uploads.
    VersionConflict,
    /// A blob referenced by a version record is missing or unreadable.
    BlobNotFound,
    /// The blob storage medium failed.
    BlobIo,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether the caller may retry the whole operation unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::VersionConflict | Self::Database)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentNotFound => write!(f, "DOCUMENT_NOT_FOUND"),
            Self::VersionNotFound => write!(f, "VERSION_NOT_FOUND"),
            Self::InvalidFileName => write!(f, "INVALID_FILE_NAME"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::VersionConflict => write!(f, "VERSION_ALLOCATION_CONFLICT"),
            Self::BlobNotFound => write!(f, "BLOB_NOT_FOUND"),
            Self::BlobIo => write!(f, "BLOB_IO"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout DocVault.
///
/// Crate-specific failures (sqlx, I/O, config) are mapped into `AppError`
/// using `From` impls or explicit `.map_err()` calls, keeping the original
/// error as the `source`.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a document-not-found error.
    pub fn document_not_found(document_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::DocumentNotFound,
            format!("Document {document_id} not found"),
        )
    }

    /// Create a version-not-found error.
    pub fn version_not_found(version_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::VersionNotFound,
            format!("Version {version_id} not found"),
        )
    }

    /// Create an invalid-file-name error.
    pub fn invalid_file_name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFileName, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a version-allocation-conflict error.
    pub fn version_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VersionConflict, message)
    }

    /// Create a blob-not-found error.
    pub fn blob_not_found(key: &str) -> Self {
        Self::new(ErrorKind::BlobNotFound, format!("Blob not found: {key}"))
    }

    /// Create a blob I/O error.
    pub fn blob_io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BlobIo, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error is a unique-constraint conflict.
    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::Conflict
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::BlobIo, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
