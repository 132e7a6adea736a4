//! Version allocation settings.

use serde::{Deserialize, Serialize};

/// Retry policy for version-number allocation under concurrent uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Number of persistence attempts before giving up with a
    /// version allocation conflict.
    #[serde(default = "default_max_attempts")]
    pub max_allocation_attempts: u32,
    /// Base backoff between attempts, in milliseconds. Scaled by the
    /// attempt number and jittered.
    #[serde(default = "default_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            max_allocation_attempts: default_max_attempts(),
            retry_backoff_ms: default_backoff(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> u64 {
    10
}
