//! Upstream Warm-up Task
//!
//! Periodically sends a throwaway search of common words so the search
//! server stays warm between user queries. Results are discarded and never
//! cached; failures are only logged at debug level.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::coordinator::RequestCoordinator;
use crate::error::Result;
use crate::models::SearchMode;
use crate::token::TokenStore;

/// Delay before the first warm-up after startup
pub const WARMUP_INITIAL_DELAY: Duration = Duration::from_secs(2);

/// Common words the warm-up queries are built from
pub const WARMUP_KEYWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "this", "that", "have", "will", "been", "about", "would",
    "think", "their", "time", "there", "could", "people", "other", "first", "after", "should",
    "because", "through", "during", "before", "however", "between", "never", "under", "know",
    "world", "place", "year", "work", "life", "company", "business", "service", "product",
    "information", "technology",
];

/// Builds a query of two or three random keywords, repeats allowed.
pub fn warmup_query<R: Rng>(rng: &mut R) -> String {
    let count = rng.gen_range(2..=3);
    (0..count)
        .filter_map(|_| WARMUP_KEYWORDS.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs one warm-up search, returning how many records came back.
pub async fn warm_once(
    coordinator: &RequestCoordinator,
    tokens: &TokenStore,
    mode: SearchMode,
) -> Result<usize> {
    // ThreadRng is not Send; build the query before the first await.
    let query = warmup_query(&mut rand::thread_rng());
    let token = tokens.token().await?;
    let outcome = coordinator.warm(&query, mode, &token).await;
    debug!(query = %query, records = outcome.records.len(), "warm-up search completed");
    Ok(outcome.records.len())
}

/// Spawns the periodic warm-up task.
///
/// # Arguments
/// * `coordinator` - Issues the warm-up searches without cancelling user searches
/// * `tokens` - Supplies the session token
/// * `mode` - Sources to warm
/// * `initial_delay` - Wait before the first run
/// * `interval` - Time between later runs
pub fn spawn_warmup_task(
    coordinator: Arc<RequestCoordinator>,
    tokens: Arc<TokenStore>,
    mode: SearchMode,
    initial_delay: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval = ?interval, "starting warm-up task");
        tokio::time::sleep(initial_delay).await;

        loop {
            if let Err(e) = warm_once(&coordinator, &tokens, mode).await {
                debug!(error = %e, "warm-up search failed");
            }
            tokio::time::sleep(interval).await;
        }
    })
}
