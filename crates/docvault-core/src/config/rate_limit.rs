//! Registration rate limiter settings.

use serde::{Deserialize, Serialize};

/// Token bucket parameters and bucket cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens per bucket, and tokens added at each refill.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Length of one refill interval in seconds.
    #[serde(default = "default_refill_period")]
    pub refill_period_seconds: u64,
    /// Buckets untouched for this long are evicted.
    #[serde(default = "default_idle_eviction")]
    pub idle_eviction_seconds: u64,
    /// Upper bound on the number of tracked keys.
    #[serde(default = "default_max_tracked_keys")]
    pub max_tracked_keys: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_period_seconds: default_refill_period(),
            idle_eviction_seconds: default_idle_eviction(),
            max_tracked_keys: default_max_tracked_keys(),
        }
    }
}

fn default_capacity() -> u32 {
    5
}

fn default_refill_period() -> u64 {
    3600
}

fn default_idle_eviction() -> u64 {
    7200
}

fn default_max_tracked_keys() -> u64 {
    10_000
}
