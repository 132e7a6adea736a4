//! Token bucket rate limiter for the registration endpoint.
//!
//! Each key (typically a client IP) owns a bucket holding up to `capacity`
//! tokens. Refill is interval-based: every full refill period the bucket
//! regains `capacity` tokens, clamped to capacity, instead of trickling
//! tokens in continuously. Buckets live in a bounded cache and are evicted
//! after a period without use; an evicted key starts again with a full
//! bucket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::debug;

use docvault_core::config::RateLimitConfig;

#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    /// Start of the current refill interval.
    interval_start: Instant,
}

/// Per-key registration rate limiter.
#[derive(Clone)]
pub struct RegistrationRateLimiter {
    /// Key → bucket state.
    buckets: Cache<String, Arc<Mutex<TokenBucket>>>,
    /// Tokens per bucket and per refill.
    capacity: u32,
    /// Length of one refill interval.
    refill_period: Duration,
}

impl std::fmt::Debug for RegistrationRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRateLimiter")
            .field("capacity", &self.capacity)
            .field("refill_period", &self.refill_period)
            .finish()
    }
}

impl RegistrationRateLimiter {
    /// Creates a rate limiter from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        let buckets = Cache::builder()
            .max_capacity(config.max_tracked_keys)
            .time_to_idle(Duration::from_secs(config.idle_eviction_seconds))
            .build();

        Self {
            buckets,
            capacity: config.capacity,
            refill_period: Duration::from_secs(config.refill_period_seconds),
        }
    }

    /// Attempts to consume a token for `key`.
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now()).await
    }

    /// Attempts to consume a token for `key` as of `now`.
    pub async fn check_at(&self, key: &str, now: Instant) -> bool {
        let capacity = self.capacity;
        let bucket = self
            .buckets
            .get_with(key.to_string(), async move {
                Arc::new(Mutex::new(TokenBucket {
                    tokens: capacity,
                    interval_start: now,
                }))
            })
            .await;

        let mut bucket = bucket.lock().await;
        self.refill(&mut bucket, now);

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            debug!(key, "Registration rate limit exceeded");
            false
        }
    }

    /// Number of keys currently holding a bucket.
    pub async fn tracked_keys(&self) -> u64 {
        self.buckets.run_pending_tasks().await;
        self.buckets.entry_count()
    }

    fn refill(&self, bucket: &mut TokenBucket, now: Instant) {
        if self.refill_period.is_zero() {
            bucket.tokens = self.capacity;
            return;
        }
        let elapsed = now.saturating_duration_since(bucket.interval_start);
        let periods = elapsed.as_nanos() / self.refill_period.as_nanos();
        if periods == 0 {
            return;
        }
        let gained = u128::from(self.capacity).saturating_mul(periods);
        bucket.tokens = (u128::from(bucket.tokens) + gained).min(u128::from(self.capacity)) as u32;
        bucket.interval_start += self.refill_period * periods.min(u128::from(u32::MAX)) as u32;
    }
}
