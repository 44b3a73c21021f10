//! Search Orchestrator
//!
//! Turns user input into searches: debounces typing, serves cache hits
//! without touching the network, collapses duplicate in-flight searches and
//! renders only the most recent search.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::debounce::{DebouncePolicy, Debouncer};
use super::render::{RenderEvent, SharedSink};
use crate::cache::{cache_key, normalize_query, SharedCache};
use crate::coordinator::RequestCoordinator;
use crate::error::{Result, SearchError};
use crate::models::SearchMode;
use crate::token::TokenStore;

/// User-facing message for any failed search
pub const SEARCH_ERROR_MESSAGE: &str = "Error performing search. Please try again later.";

/// Input from the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    /// The input text changed; searched after the debounce delay.
    InputChanged(String),
    /// Enter pressed or search button clicked.
    Submit(String),
    /// A suggestion was picked.
    SuggestionSelected(String),
}

struct Inner {
    cache: SharedCache,
    coordinator: Arc<RequestCoordinator>,
    tokens: Arc<TokenStore>,
    sink: SharedSink,
    mode: SearchMode,
    debounce: DebouncePolicy,
    debouncer: Debouncer,
    /// Generation of the most recently started search
    latest: AtomicU64,
    /// Cache key -> generation of the search fetching it
    in_flight: Mutex<HashMap<String, u64>>,
}

/// Removes its in-flight registration when the search ends.
struct InFlight<'a> {
    map: &'a Mutex<HashMap<String, u64>>,
    key: String,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if map.get(&self.key) == Some(&self.generation) {
            map.remove(&self.key);
        }
    }
}

// == Search Orchestrator ==
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SearchOrchestrator {
    inner: Arc<Inner>,
}

impl SearchOrchestrator {
    // == Constructor ==
    /// # Arguments
    /// * `cache` - Result cache shared with the cleanup task
    /// * `coordinator` - Issues the upstream searches
    /// * `tokens` - Supplies the session token for each search
    /// * `sink` - Receives render events
    /// * `mode` - Sources every search consults
    /// * `debounce` - Typing delay policy
    pub fn new(
        cache: SharedCache,
        coordinator: Arc<RequestCoordinator>,
        tokens: Arc<TokenStore>,
        sink: SharedSink,
        mode: SearchMode,
        debounce: DebouncePolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                coordinator,
                tokens,
                sink,
                mode,
                debounce,
                debouncer: Debouncer::new(),
                latest: AtomicU64::new(0),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.inner.cache
    }

    pub fn mode(&self) -> SearchMode {
        self.inner.mode
    }

    // == Dispatch ==
    /// Handles one input event.
    ///
    /// Typing schedules a debounced search; submitting or picking a
    /// suggestion searches immediately and drops any pending debounce.
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, command: SearchCommand) {
        match command {
            SearchCommand::InputChanged(text) => match self.inner.debounce.delay_for(&text) {
                Some(delay) => {
                    let this = self.clone();
                    self.inner
                        .debouncer
                        .schedule(delay, async move { this.search_now(&text).await });
                }
                None => self.inner.debouncer.cancel(),
            },
            SearchCommand::Submit(text) | SearchCommand::SuggestionSelected(text) => {
                self.inner.debouncer.cancel();
                let this = self.clone();
                tokio::spawn(async move { this.search_now(&text).await });
            }
        }
    }

    // == Search ==
    /// Searches for `query` right away and renders the outcome.
    pub async fn search_now(&self, query: &str) {
        let inner = &*self.inner;
        let query = normalize_query(query);
        if query.is_empty() {
            return;
        }
        let key = cache_key(&query, inner.mode);

        let cached = inner.cache.write().await.get(&query, inner.mode);
        if let Some(records) = cached {
            // A cache hit supersedes any slower network search.
            inner.latest.fetch_add(1, Ordering::SeqCst);
            inner.coordinator.cancel().await;
            debug!(query = %query, count = records.len(), "serving cached results");
            inner.sink.render(RenderEvent::Results {
                query,
                records,
                cached: true,
            });
            return;
        }

        let Some(in_flight) = self.claim(&key) else {
            debug!(query = %query, "identical search already in flight");
            return;
        };
        let generation = in_flight.generation;
        inner.sink.render(RenderEvent::Loading {
            query: query.clone(),
        });

        let token = match inner.tokens.token().await {
            Ok(token) => token,
            Err(e) => {
                self.fail(generation, query, &e);
                return;
            }
        };

        let outcome = match inner.coordinator.search(&query, inner.mode, &token).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => return,
            Err(e) => {
                self.fail(generation, query, &e);
                return;
            }
        };

        if !self.is_latest(generation) {
            debug!(query = %query, "discarding superseded results");
            return;
        }

        match outcome.into_result() {
            Err(e) => self.fail(generation, query, &e),
            Ok(records) if records.is_empty() => {
                inner.sink.render(RenderEvent::NoResults { query });
            }
            Ok(records) => {
                info!(count = records.len(), "search completed");
                inner
                    .cache
                    .write()
                    .await
                    .set(&query, inner.mode, records.clone());
                if self.is_latest(generation) {
                    inner.sink.render(RenderEvent::Results {
                        query,
                        records,
                        cached: false,
                    });
                }
            }
        }
    }

    // == Suggestions ==
    /// Fetches type-ahead suggestions for `query`.
    ///
    /// Queries below the minimum length yield nothing without a request.
    pub async fn suggest(&self, query: &str) -> Result<Vec<Value>> {
        let inner = &*self.inner;
        let query = normalize_query(query);
        if query.is_empty() || query.chars().count() < inner.debounce.min_query_len {
            return Ok(Vec::new());
        }
        let token = inner.tokens.token().await?;
        inner.coordinator.suggestions(&query, &token).await
    }

    /// Starts a new generation for `key` unless the latest search already
    /// fetches it.
    fn claim(&self, key: &str) -> Option<InFlight<'_>> {
        let inner = &*self.inner;
        let mut map = inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if map.get(key) == Some(&inner.latest.load(Ordering::SeqCst)) {
            return None;
        }

        let generation = inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        map.insert(key.to_string(), generation);
        Some(InFlight {
            map: &inner.in_flight,
            key: key.to_string(),
            generation,
        })
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.inner.latest.load(Ordering::SeqCst) == generation
    }

    fn fail(&self, generation: u64, query: String, error: &SearchError) {
        warn!(error = %error, "search failed");
        if self.is_latest(generation) {
            self.inner.sink.render(RenderEvent::Error {
                query,
                message: SEARCH_ERROR_MESSAGE.to_string(),
            });
        }
    }
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("mode", &self.inner.mode)
            .field("debounce", &self.inner.debounce)
            .field("latest", &self.inner.latest.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
