//! Request Coordinator Module
//!
//! Issues the upstream calls for a search and guarantees that only the most
//! recently started search can produce results.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::outcome::{SearchOutcome, SourceReport};
use super::retry::{with_retry, Attempted, RetryPolicy};
use crate::error::{Result, SearchError};
use crate::models::{RawRecord, ResultRecord, SearchMode, SiteParams, SourceKind};
use crate::upstream::SharedUpstream;

/// The one search allowed to be in flight.
#[derive(Debug)]
struct ActiveSearch {
    generation: u64,
    cancel: CancellationToken,
}

// == Request Coordinator ==
pub struct RequestCoordinator {
    upstream: SharedUpstream,
    params: SiteParams,
    policy: RetryPolicy,
    /// Cancellation handle of the current search
    active: Mutex<Option<ActiveSearch>>,
    generation: AtomicU64,
}

impl RequestCoordinator {
    // == Constructor ==
    pub fn new(upstream: SharedUpstream, params: SiteParams, policy: RetryPolicy) -> Self {
        Self {
            upstream,
            params,
            policy,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn params(&self) -> &SiteParams {
        &self.params
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    // == Search ==
    /// Runs a search against every source `mode` names.
    ///
    /// Starting a search cancels the previous one before any request is
    /// issued. Sources fail independently: a source that exhausts its retries
    /// contributes no records and is reported in the outcome, never as an
    /// error. The only error is [`SearchError::Cancelled`], returned when a
    /// newer search superseded this one; its results are discarded.
    pub async fn search(&self, query: &str, mode: SearchMode, token: &str) -> Result<SearchOutcome> {
        let (generation, cancel) = self.begin().await;
        debug!(generation, %mode, "search started");

        let gathered = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = self.gather(query, mode, token) => Some(outcome),
        };

        self.finish(generation).await;

        match gathered {
            // A response that lands after the abort signal is still stale.
            Some(outcome) if !cancel.is_cancelled() => {
                debug!(generation, records = outcome.records.len(), "search completed");
                Ok(outcome)
            }
            _ => {
                debug!(generation, "search superseded");
                Err(SearchError::Cancelled)
            }
        }
    }

    // == Cancel ==
    /// Cancels the in-flight search, if any.
    pub async fn cancel(&self) {
        if let Some(active) = self.active.lock().await.take() {
            active.cancel.cancel();
            debug!(generation = active.generation, "search cancelled");
        }
    }

    /// True while a search started through [`search`](Self::search) is running.
    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    // == Warm ==
    /// Queries the sources without claiming the active handle.
    ///
    /// Used for background warm-up: it neither cancels nor can be cancelled
    /// by user searches.
    pub async fn warm(&self, query: &str, mode: SearchMode, token: &str) -> SearchOutcome {
        self.gather(query, mode, token).await
    }

    // == Suggestions ==
    /// Fetches suggestions with the same retry policy as searches.
    pub async fn suggestions(&self, query: &str, token: &str) -> Result<Vec<Value>> {
        let upstream = &*self.upstream;
        let params = &self.params;
        with_retry(&self.policy, "suggestions", move || {
            upstream.suggestions(query, params, token)
        })
        .await
        .result
    }

    /// Replaces the active handle, cancelling the one it displaces.
    async fn begin(&self) -> (u64, CancellationToken) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.cancel.cancel();
            debug!(generation = previous.generation, "superseding in-flight search");
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        *active = Some(ActiveSearch {
            generation,
            cancel: cancel.clone(),
        });
        (generation, cancel)
    }

    /// Releases the active handle if it still belongs to `generation`.
    async fn finish(&self, generation: u64) {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|a| a.generation == generation) {
            *active = None;
        }
    }

    /// Queries all sources concurrently and merges them in mode order.
    async fn gather(&self, query: &str, mode: SearchMode, token: &str) -> SearchOutcome {
        let fetches = mode
            .sources()
            .iter()
            .map(|&source| self.fetch_source(source, query, token));
        let settled = join_all(fetches).await;

        let mut outcome = SearchOutcome::default();
        for (source, Attempted { result, attempts }) in settled {
            match result {
                Ok(raw) => {
                    outcome.sources.push(SourceReport {
                        source,
                        attempts,
                        count: raw.len(),
                        error: None,
                    });
                    outcome
                        .records
                        .extend(raw.into_iter().map(|r| ResultRecord::tagged(source, r)));
                }
                Err(err) => {
                    warn!(%source, attempts, error = %err, "search source failed");
                    outcome.sources.push(SourceReport {
                        source,
                        attempts,
                        count: 0,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        outcome
    }

    async fn fetch_source(
        &self,
        source: SourceKind,
        query: &str,
        token: &str,
    ) -> (SourceKind, Attempted<Vec<RawRecord>>) {
        let upstream = &*self.upstream;
        let params = &self.params;
        let attempted = with_retry(&self.policy, source.as_str(), move || {
            upstream.search(source, query, params, token)
        })
        .await;
        (source, attempted)
    }
}

impl std::fmt::Debug for RequestCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoordinator")
            .field("params", &self.params)
            .field("policy", &self.policy)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
