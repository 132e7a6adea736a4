//! Blob store backends.

pub mod local;

pub use local::LocalBlobStore;
