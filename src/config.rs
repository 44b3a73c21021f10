//! Configuration Module
//!
//! Handles loading and validating search configuration from environment
//! variables.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{EvictionPolicy, DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS};
use crate::coordinator::RetryPolicy;
use crate::error::{Result, SearchError};
use crate::models::{SearchMode, SiteParams};
use crate::orchestrator::DebouncePolicy;

/// Search server used when `SEARCH_BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "https://search-server.long-rain-28bb.workers.dev";

/// Default `User-Agent` sent upstream and reported at token issuance
pub const DEFAULT_USER_AGENT: &str = concat!("site-search/", env!("CARGO_PKG_VERSION"));

/// Search configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Search server base URL
    pub base_url: String,
    /// Site identifier sent with every request
    pub site_name: String,
    /// Sources every search consults
    pub mode: SearchMode,
    /// CMS collections to search
    pub collections: Vec<String>,
    /// CMS fields matched against the query
    pub search_fields: Vec<String>,
    /// CMS fields returned for display
    pub display_fields: Vec<String>,
    /// Optional cap on results per source
    pub limit: Option<u32>,
    /// Maximum number of cached result sets
    pub max_entries: usize,
    /// Lifetime of a cached result set
    pub cache_ttl: Duration,
    /// Which entry goes first when the cache is full
    pub eviction: EvictionPolicy,
    /// Per-attempt upstream deadline
    pub request_timeout: Duration,
    /// Extra attempts after a retryable failure
    pub retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    /// Debounce delay for short queries
    pub debounce: Duration,
    /// Debounce ceiling for longer queries
    pub debounce_max: Duration,
    /// Shortest query that triggers a search
    pub min_query_length: usize,
    /// Cache cleanup interval; zero disables the task
    pub cleanup_interval: Duration,
    /// Warm-up interval; zero disables the task
    pub warmup_interval: Duration,
    /// Results per rendered page
    pub items_per_page: usize,
    /// JSON file for persisted visitor state; in-memory when unset
    pub storage_path: Option<PathBuf>,
    /// `User-Agent` header value
    pub user_agent: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SEARCH_BASE_URL` - Search server (default: hosted search server)
    /// - `SEARCH_SITE_NAME` - Site identifier; derived from `SEARCH_HOST` when unset
    /// - `SEARCH_MODE` - `Pages`, `Collection` or `Both` (default: Both)
    /// - `SEARCH_COLLECTIONS`, `SEARCH_FIELDS`, `SEARCH_DISPLAY_FIELDS` - JSON string arrays
    /// - `SEARCH_LIMIT` - Results per source (default: server decides)
    /// - `CACHE_MAX_ENTRIES` - Cached result sets (default: 100)
    /// - `CACHE_TTL` - Cache lifetime in seconds (default: 600)
    /// - `CACHE_EVICTION` - `insertion` or `recency` (default: insertion)
    /// - `REQUEST_TIMEOUT_MS` - Per-attempt timeout (default: 30000)
    /// - `REQUEST_RETRIES` - Retries per source (default: 2)
    /// - `RETRY_DELAY_MS` - Delay between attempts (default: 1000)
    /// - `DEBOUNCE_MS` / `DEBOUNCE_MAX_MS` - Typing delay (default: 100 / 500)
    /// - `MIN_QUERY_LENGTH` - Shortest searched query (default: 2)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `WARMUP_INTERVAL` - Warm-up frequency in seconds (default: 300)
    /// - `ITEMS_PER_PAGE` - Results per page (default: 10)
    /// - `STORAGE_PATH` - Visitor state file (default: in-memory)
    /// - `SEARCH_USER_AGENT` - User agent (default: `site-search/<version>`)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from `(variable, value)` pairs instead of the process
    /// environment.
    pub fn from_vars<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let vars: HashMap<&str, &str> = vars.into_iter().collect();
        Self::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let millis = |key: &str, default: Duration| {
            parsed(key).map(Duration::from_millis).unwrap_or(default)
        };
        let secs = |key: &str, default: Duration| {
            parsed(key).map(Duration::from_secs).unwrap_or(default)
        };
        let list = |key: &str| {
            lookup(key)
                .and_then(|v| serde_json::from_str::<Vec<String>>(&v).ok())
                .unwrap_or_default()
        };

        let site_name = lookup("SEARCH_SITE_NAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| lookup("SEARCH_HOST").map(|host| site_name_from_host(&host)))
            .unwrap_or(defaults.site_name);

        Self {
            base_url: lookup("SEARCH_BASE_URL").unwrap_or(defaults.base_url),
            site_name,
            mode: lookup("SEARCH_MODE")
                .and_then(|v| SearchMode::from_str(&v).ok())
                .unwrap_or(defaults.mode),
            collections: list("SEARCH_COLLECTIONS"),
            search_fields: list("SEARCH_FIELDS"),
            display_fields: list("SEARCH_DISPLAY_FIELDS"),
            limit: lookup("SEARCH_LIMIT").and_then(|v| v.trim().parse().ok()),
            max_entries: parsed("CACHE_MAX_ENTRIES")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_entries),
            cache_ttl: secs("CACHE_TTL", defaults.cache_ttl),
            eviction: lookup("CACHE_EVICTION")
                .and_then(|v| EvictionPolicy::from_str(&v).ok())
                .unwrap_or(defaults.eviction),
            request_timeout: millis("REQUEST_TIMEOUT_MS", defaults.request_timeout),
            retries: parsed("REQUEST_RETRIES")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.retries),
            retry_delay: millis("RETRY_DELAY_MS", defaults.retry_delay),
            debounce: millis("DEBOUNCE_MS", defaults.debounce),
            debounce_max: millis("DEBOUNCE_MAX_MS", defaults.debounce_max),
            min_query_length: parsed("MIN_QUERY_LENGTH")
                .map(|v| v as usize)
                .unwrap_or(defaults.min_query_length),
            cleanup_interval: secs("CLEANUP_INTERVAL", defaults.cleanup_interval),
            warmup_interval: secs("WARMUP_INTERVAL", defaults.warmup_interval),
            items_per_page: parsed("ITEMS_PER_PAGE")
                .map(|v| v as usize)
                .unwrap_or(defaults.items_per_page),
            storage_path: lookup("STORAGE_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            user_agent: lookup("SEARCH_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    /// Rejects values the search stack cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SearchError::Config(format!(
                "SEARCH_BASE_URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.site_name.trim().is_empty() {
            return Err(SearchError::Config("site name must not be empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(SearchError::Config("REQUEST_TIMEOUT_MS must be positive".to_string()));
        }
        if self.debounce > self.debounce_max {
            return Err(SearchError::Config(
                "DEBOUNCE_MS must not exceed DEBOUNCE_MAX_MS".to_string(),
            ));
        }
        if self.items_per_page == 0 {
            return Err(SearchError::Config("ITEMS_PER_PAGE must be positive".to_string()));
        }
        Ok(())
    }

    pub fn site_params(&self) -> SiteParams {
        SiteParams {
            site_name: self.site_name.clone(),
            collections: self.collections.clone(),
            search_fields: self.search_fields.clone(),
            display_fields: self.display_fields.clone(),
            limit: self.limit,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            delay: self.retry_delay,
            timeout: self.request_timeout,
        }
    }

    pub fn debounce_policy(&self) -> DebouncePolicy {
        DebouncePolicy {
            base: self.debounce,
            max: self.debounce_max,
            min_query_len: self.min_query_length,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        let debounce = DebouncePolicy::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_name: "default".to_string(),
            mode: SearchMode::default(),
            collections: Vec::new(),
            search_fields: Vec::new(),
            display_fields: Vec::new(),
            limit: None,
            max_entries: DEFAULT_MAX_ENTRIES,
            cache_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            eviction: EvictionPolicy::default(),
            request_timeout: retry.timeout,
            retries: retry.retries,
            retry_delay: retry.delay,
            debounce: debounce.base,
            debounce_max: debounce.max,
            min_query_length: debounce.min_query_len,
            cleanup_interval: Duration::from_secs(60),
            warmup_interval: Duration::from_secs(300),
            items_per_page: 10,
            storage_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Site name for a host: `www.` stripped, then the first label.
///
/// `www.acme.com` and `acme.webflow.io` both map to `acme`.
pub fn site_name_from_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    host.split('.').next().unwrap_or_default().to_string()
}
