//! # docvault-storage
//!
//! Blob store backends and storage key generation for DocVault. Keys are
//! produced by [`StorageKeyGenerator`] and stored through an implementation
//! of [`docvault_core::traits::BlobStore`].

pub mod key;
pub mod providers;

pub use key::StorageKeyGenerator;
pub use providers::local::LocalBlobStore;
