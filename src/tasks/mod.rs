//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the search stack
//! is up.
//!
//! # Tasks
//! - TTL Cleanup: Purges expired cached result sets at configured intervals
//! - Warm-up: Sends throwaway searches to keep the upstream responsive

mod cleanup;
mod warmup;

pub use cleanup::spawn_cleanup_task;
pub use warmup::{spawn_warmup_task, warm_once, warmup_query, WARMUP_INITIAL_DELAY, WARMUP_KEYWORDS};
