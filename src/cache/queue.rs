//! Eviction Queue Module
//!
//! Tracks the order in which cached keys become eviction candidates.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

// == Eviction Policy ==
/// Which order the cache evicts in once it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Oldest insertion goes first; reads do not change the order.
    #[default]
    Insertion,
    /// Least recently read or written goes first.
    Recency,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Insertion => f.write_str("insertion"),
            EvictionPolicy::Recency => f.write_str("recency"),
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insertion" | "fifo" => Ok(EvictionPolicy::Insertion),
            "recency" | "lru" => Ok(EvictionPolicy::Recency),
            other => Err(SearchError::Config(format!(
                "unknown eviction policy '{other}'"
            ))),
        }
    }
}

// == Eviction Queue ==
/// Keys ordered by eviction priority.
///
/// - Front = newest
/// - Back = next to evict
#[derive(Debug, Default)]
pub struct EvictionQueue {
    order: VecDeque<String>,
}

impl EvictionQueue {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Moves a key to the front, adding it if unknown.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the next key to evict.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
