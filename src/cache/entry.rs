//! Cache Entry Module
//!
//! Defines a cached result set and its age check.

use std::time::Duration;

use crate::models::ResultRecord;

// == Cache Entry ==
/// A cached result set with its creation time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Results in merge order
    pub results: Vec<ResultRecord>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now_ms`.
    pub fn new(results: Vec<ResultRecord>, now_ms: u64) -> Self {
        Self {
            results,
            created_at: now_ms,
        }
    }

    // == Age ==
    /// Milliseconds since creation. Zero if the clock went backwards.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }

    // == Is Expired ==
    /// Checks if the entry is stale.
    ///
    /// Boundary condition: an entry whose age equals the TTL is already
    /// expired, so a result is never served once the full TTL has elapsed.
    pub fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        u128::from(self.age_ms(now_ms)) >= ttl.as_millis()
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64, ttl: Duration) -> u64 {
        (ttl.as_millis() as u64).saturating_sub(self.age_ms(now_ms))
    }
}
