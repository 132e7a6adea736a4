//! # docvault-service
//!
//! Business logic for DocVault. [`VersionService`] coordinates the version
//! record store, the blob store, and the storage key generator to upload,
//! list, download, and delete document versions while keeping the set of
//! stored blobs consistent with the set of version records.
//!
//! Services follow constructor injection: all collaborators are provided at
//! construction time via `Arc` references.

pub mod context;
pub mod ratelimit;
pub mod version;

pub use context::RequestContext;
pub use ratelimit::RegistrationRateLimiter;
pub use version::{
    BlobDeletionFailure, DeletionReport, DownloadHandle, UploadRequest, UploadStage,
    VersionAllocator, VersionService,
};
