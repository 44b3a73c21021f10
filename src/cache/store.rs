//! Result Cache Module
//!
//! Main cache engine combining HashMap storage with an eviction queue and
//! lazy TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, EvictionPolicy, EvictionQueue};
use crate::clock::SharedClock;
use crate::models::{ResultRecord, SearchMode};

// == Key Helpers ==
/// Normalizes query text for cache lookups: trimmed and lowercased.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Builds the cache key for a (query, mode) pair.
pub fn cache_key(query: &str, mode: SearchMode) -> String {
    format!("{}_{}", normalize_query(query), mode)
}

// == Result Cache ==
/// Bounded TTL cache of merged search results.
#[derive(Debug)]
pub struct ResultCache {
    /// Key to cached result set
    entries: HashMap<String, CacheEntry>,
    /// Eviction candidates
    queue: EvictionQueue,
    stats: CacheStats,
    max_entries: usize,
    ttl: Duration,
    policy: EvictionPolicy,
    clock: SharedClock,
}

impl ResultCache {
    // == Constructor ==
    /// Creates a new ResultCache.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of result sets held at once
    /// * `ttl` - Lifetime of a result set
    /// * `policy` - Eviction order once full
    /// * `clock` - Time source for stamping and expiry
    pub fn new(
        max_entries: usize,
        ttl: Duration,
        policy: EvictionPolicy,
        clock: SharedClock,
    ) -> Self {
        Self {
            entries: HashMap::new(),
            queue: EvictionQueue::new(),
            stats: CacheStats::new(),
            max_entries,
            ttl,
            policy,
            clock,
        }
    }

    // == Get ==
    /// Returns cached results for the query and mode if present and fresh.
    ///
    /// A stale entry is removed by the read that discovers it.
    pub fn get(&mut self, query: &str, mode: SearchMode) -> Option<Vec<ResultRecord>> {
        let key = cache_key(query, mode);
        let now = self.clock.now_ms();

        let expired = match self.entries.get(&key) {
            Some(entry) => entry.is_expired(now, self.ttl),
            None => {
                self.stats.record_miss();
                debug!(key = %key, "cache miss");
                return None;
            }
        };

        if expired {
            self.remove_key(&key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            debug!(key = %key, "cache entry expired");
            return None;
        }

        if self.policy == EvictionPolicy::Recency {
            self.queue.touch(&key);
        }
        self.stats.record_hit();
        debug!(key = %key, "cache hit");
        self.entries.get(&key).map(|entry| entry.results.clone())
    }

    // == Set ==
    /// Stores results for the query and mode, replacing any prior entry.
    ///
    /// Replacing an existing key refreshes its timestamp and never evicts
    /// another key. A new key arriving at capacity evicts one entry first.
    pub fn set(&mut self, query: &str, mode: SearchMode, results: Vec<ResultRecord>) {
        if self.max_entries == 0 {
            return;
        }

        let key = cache_key(query, mode);
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.queue.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!(key = %evicted, "cache entry evicted");
            }
        }

        let entry = CacheEntry::new(results, self.clock.now_ms());
        self.entries.insert(key.clone(), entry);
        self.queue.touch(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Contains ==
    /// True if a fresh entry exists. Does not touch stats or order.
    pub fn contains(&self, query: &str, mode: SearchMode) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(&cache_key(query, mode))
            .is_some_and(|entry| !entry.is_expired(now, self.ttl))
    }

    // == Cleanup Expired ==
    /// Removes all stale entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_key(key);
        }
        self.stats.record_expirations(expired.len());
        expired.len()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.queue.clear();
        self.stats.set_total_entries(0);
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn remove_key(&mut self, key: &str) {
        self.entries.remove(key);
        self.queue.remove(key);
        self.stats.set_total_entries(self.entries.len());
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::SourceKind;
    use serde_json::json;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(600);

    fn record(name: &str) -> ResultRecord {
        let fields = json!({ "name": name }).as_object().cloned().unwrap();
        ResultRecord::tagged(SourceKind::Page, fields)
    }

    fn cache(max: usize, policy: EvictionPolicy) -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        (ResultCache::new(max, TTL, policy, clock.clone()), clock)
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(cache_key("  Hello World ", SearchMode::Pages), "hello world_Pages");
        assert_eq!(cache_key("x", SearchMode::Both), "x_Both");
    }

    #[test]
    fn test_set_and_get() {
        let (mut cache, _) = cache(10, EvictionPolicy::Insertion);
        cache.set("hello", SearchMode::Pages, vec![record("A")]);

        assert_eq!(cache.get("hello", SearchMode::Pages), Some(vec![record("A")]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let (mut cache, _) = cache(10, EvictionPolicy::Insertion);
        cache.set("Hello", SearchMode::Pages, vec![record("A")]);
        assert!(cache.get("HELLO ", SearchMode::Pages).is_some());
    }

    #[test]
    fn test_mode_is_part_of_key() {
        let (mut cache, _) = cache(10, EvictionPolicy::Insertion);
        cache.set("hello", SearchMode::Pages, vec![record("A")]);
        assert!(cache.get("hello", SearchMode::Both).is_none());
    }

    #[test]
    fn test_get_nonexistent_counts_miss() {
        let (mut cache, _) = cache(10, EvictionPolicy::Insertion);
        assert!(cache.get("nothing", SearchMode::Pages).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_ttl_just_before_and_after() {
        let (mut cache, clock) = cache(10, EvictionPolicy::Insertion);
        cache.set("q", SearchMode::Pages, vec![record("A")]);

        clock.advance(TTL - Duration::from_millis(1));
        assert!(cache.get("q", SearchMode::Pages).is_some());

        clock.advance(Duration::from_millis(2));
        assert!(cache.get("q", SearchMode::Pages).is_none());
        assert_eq!(cache.len(), 0, "stale entry is removed on read");
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_overwrite_replaces_and_refreshes() {
        let (mut cache, clock) = cache(10, EvictionPolicy::Insertion);
        cache.set("q", SearchMode::Pages, vec![record("old")]);

        clock.advance(TTL - Duration::from_secs(1));
        cache.set("q", SearchMode::Pages, vec![record("new"), record("newer")]);

        clock.advance(Duration::from_secs(2));
        assert_eq!(
            cache.get("q", SearchMode::Pages),
            Some(vec![record("new"), record("newer")])
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_first_inserted() {
        let (mut cache, _) = cache(3, EvictionPolicy::Insertion);
        for q in ["a", "b", "c", "d"] {
            cache.set(q, SearchMode::Pages, vec![record(q)]);
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.get("a", SearchMode::Pages).is_none());
        assert!(cache.get("d", SearchMode::Pages).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_insertion_policy_ignores_reads() {
        let (mut cache, _) = cache(3, EvictionPolicy::Insertion);
        for q in ["a", "b", "c"] {
            cache.set(q, SearchMode::Pages, vec![]);
        }
        cache.get("a", SearchMode::Pages);
        cache.set("d", SearchMode::Pages, vec![]);

        assert!(!cache.contains("a", SearchMode::Pages));
        assert!(cache.contains("b", SearchMode::Pages));
    }

    #[test]
    fn test_recency_policy_touch_on_get() {
        let (mut cache, _) = cache(3, EvictionPolicy::Recency);
        for q in ["a", "b", "c"] {
            cache.set(q, SearchMode::Pages, vec![]);
        }
        cache.get("a", SearchMode::Pages);
        cache.set("d", SearchMode::Pages, vec![]);

        assert!(cache.contains("a", SearchMode::Pages));
        assert!(!cache.contains("b", SearchMode::Pages));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let (mut cache, _) = cache(2, EvictionPolicy::Insertion);
        cache.set("a", SearchMode::Pages, vec![]);
        cache.set("b", SearchMode::Pages, vec![]);
        cache.set("a", SearchMode::Pages, vec![record("A")]);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("b", SearchMode::Pages));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let (mut cache, _) = cache(0, EvictionPolicy::Insertion);
        cache.set("a", SearchMode::Pages, vec![record("A")]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_expired() {
        let (mut cache, clock) = cache(10, EvictionPolicy::Insertion);
        cache.set("old", SearchMode::Pages, vec![]);
        clock.advance(Duration::from_secs(400));
        cache.set("young", SearchMode::Pages, vec![]);
        clock.advance(Duration::from_secs(300));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("young", SearchMode::Pages));
    }

    #[test]
    fn test_clear() {
        let (mut cache, _) = cache(10, EvictionPolicy::Insertion);
        cache.set("a", SearchMode::Pages, vec![]);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_stats() {
        let (mut cache, _) = cache(10, EvictionPolicy::Insertion);
        cache.set("a", SearchMode::Pages, vec![]);
        cache.get("a", SearchMode::Pages);
        cache.get("b", SearchMode::Pages);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
