//! Document version lifecycle: allocation, upload, listing, download, and
//! deletion.

pub mod allocator;
pub mod deletion;
pub mod download;
pub mod service;
pub mod upload;

pub use allocator::VersionAllocator;
pub use deletion::{BlobDeletionFailure, DeletionReport};
pub use download::DownloadHandle;
pub use service::VersionService;
pub use upload::{UploadRequest, UploadStage};
