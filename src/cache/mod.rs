//! Cache Module
//!
//! In-memory result cache keyed by normalized query and search mode, with
//! TTL expiration checked on read and bounded capacity.

mod entry;
mod queue;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use queue::{EvictionPolicy, EvictionQueue};
pub use stats::CacheStats;
pub use store::{cache_key, normalize_query, ResultCache};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Cache handle shared between the orchestrator and background tasks.
pub type SharedCache = Arc<RwLock<ResultCache>>;

// == Public Constants ==
/// Default number of cached result sets
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default lifetime of a cached result set in seconds
pub const DEFAULT_TTL_SECS: u64 = 10 * 60;
