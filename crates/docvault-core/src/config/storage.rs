//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Blob store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory every storage key is resolved against.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Fixed prefix of generated storage keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Maximum accepted payload size in bytes (default 100 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            key_prefix: default_key_prefix(),
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_root_path() -> String {
    "./data/blobs".to_string()
}

fn default_key_prefix() -> String {
    "doc".to_string()
}

fn default_max_upload() -> u64 {
    104_857_600 // 100 MB
}
