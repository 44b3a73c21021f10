//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use site_search::cache::EvictionPolicy;
use site_search::models::{RawRecord, SiteParams, TokenRequest};
use site_search::orchestrator::{CollectingSink, DebouncePolicy};
use site_search::token::MemoryStorage;
use site_search::upstream::Upstream;
use site_search::{
    ManualClock, RequestCoordinator, ResultCache, RetryPolicy, SearchError, SearchMode,
    SearchOrchestrator, SourceKind, TokenStore,
};
use tokio::sync::RwLock;

/// Never-expiring token: the claims segment decodes to `{}`.
pub const TOKEN: &str = "h.e30.s";

/// In-process search server with scriptable delays and failures.
///
/// Each successful search returns `count` records (one by default) named
/// after the query.
#[derive(Default)]
pub struct ScriptedUpstream {
    calls: Mutex<Vec<(SourceKind, String)>>,
    token_calls: AtomicU32,
    delays: Mutex<HashMap<String, Duration>>,
    failures: Mutex<HashMap<SourceKind, (u32, SearchError)>>,
    counts: Mutex<HashMap<SourceKind, usize>>,
    empty: Mutex<HashSet<String>>,
    token_error: Mutex<Option<SearchError>>,
}

impl ScriptedUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Delays every search for `query`.
    pub fn delay(&self, query: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(query.to_string(), delay);
    }

    /// Fails the next `times` searches against `source`.
    pub fn fail(&self, source: SourceKind, times: u32, error: SearchError) {
        self.failures.lock().unwrap().insert(source, (times, error));
    }

    pub fn fail_always(&self, source: SourceKind, error: SearchError) {
        self.fail(source, u32::MAX, error);
    }

    /// Makes `source` return `count` records per search.
    pub fn records_per_search(&self, source: SourceKind, count: usize) {
        self.counts.lock().unwrap().insert(source, count);
    }

    /// Makes searches for `query` match nothing.
    pub fn no_matches(&self, query: &str) {
        self.empty.lock().unwrap().insert(query.to_string());
    }

    pub fn fail_tokens(&self, error: SearchError) {
        *self.token_error.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<(SourceKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, query)| query).collect()
    }

    pub fn calls_to(&self, source: SourceKind) -> usize {
        self.calls().iter().filter(|(s, _)| *s == source).count()
    }

    pub fn token_calls(&self) -> u32 {
        self.token_calls.load(Ordering::SeqCst)
    }

    fn scripted_failure(&self, source: SourceKind) -> Option<SearchError> {
        let mut failures = self.failures.lock().unwrap();
        let (remaining, error) = failures.get_mut(&source)?;
        if *remaining == 0 {
            return None;
        }
        if *remaining != u32::MAX {
            *remaining -= 1;
        }
        Some(error.clone())
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn issue_token(&self, _request: &TokenRequest) -> site_search::Result<String> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        match self.token_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(TOKEN.to_string()),
        }
    }

    async fn search(
        &self,
        source: SourceKind,
        query: &str,
        _params: &SiteParams,
        _token: &str,
    ) -> site_search::Result<Vec<RawRecord>> {
        self.calls.lock().unwrap().push((source, query.to_string()));

        let delay = self.delays.lock().unwrap().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.scripted_failure(source) {
            return Err(error);
        }
        if self.empty.lock().unwrap().contains(query) {
            return Ok(Vec::new());
        }

        let count = self.counts.lock().unwrap().get(&source).copied().unwrap_or(1);
        Ok((0..count)
            .map(|i| {
                json!({ "name": query, "rank": i })
                    .as_object()
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }

    async fn suggestions(
        &self,
        query: &str,
        _params: &SiteParams,
        _token: &str,
    ) -> site_search::Result<Vec<Value>> {
        Ok(vec![json!(format!("{query} suggestion"))])
    }
}

pub fn retry_policy() -> RetryPolicy {
    RetryPolicy {
        retries: 2,
        delay: Duration::from_millis(300),
        timeout: Duration::from_secs(10),
    }
}

pub fn coordinator(upstream: &Arc<ScriptedUpstream>, policy: RetryPolicy) -> Arc<RequestCoordinator> {
    Arc::new(RequestCoordinator::new(
        upstream.clone(),
        SiteParams::new("acme"),
        policy,
    ))
}

/// Everything an orchestrator test needs to observe.
pub struct Harness {
    pub upstream: Arc<ScriptedUpstream>,
    pub sink: Arc<CollectingSink>,
    pub clock: Arc<ManualClock>,
    pub orchestrator: SearchOrchestrator,
}

pub fn harness(mode: SearchMode) -> Harness {
    let upstream = ScriptedUpstream::new();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = Arc::new(RwLock::new(ResultCache::new(
        100,
        Duration::from_secs(600),
        EvictionPolicy::Insertion,
        clock.clone(),
    )));
    let tokens = Arc::new(TokenStore::new(
        upstream.clone(),
        Arc::new(MemoryStorage::new()),
        clock.clone(),
        "acme",
        "tests",
    ));
    let sink = Arc::new(CollectingSink::new());
    let orchestrator = SearchOrchestrator::new(
        cache,
        coordinator(&upstream, retry_policy()),
        tokens,
        sink.clone(),
        mode,
        DebouncePolicy::default(),
    );

    Harness {
        upstream,
        sink,
        clock,
        orchestrator,
    }
}
