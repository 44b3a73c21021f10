//! TTL Cleanup Task
//!
//! Background task that periodically purges expired cached result sets.
//! Reads already drop stale entries lazily; this keeps memory bounded for
//! queries that are never asked again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that periodically removes expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between runs
/// and taking the cache write lock only for the purge itself.
///
/// # Arguments
/// * `cache` - Result cache shared with the orchestrator
/// * `interval` - Time between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during shutdown.
pub fn spawn_cleanup_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval = ?interval, "starting cache cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                info!(removed, "cache cleanup removed expired entries");
            } else {
                debug!("cache cleanup found no expired entries");
            }
        }
    })
}
