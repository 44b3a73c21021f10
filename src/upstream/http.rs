//! HTTP implementation of the search server endpoints.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::Upstream;
use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::models::{
    RawRecord, ResultsResponse, SiteParams, SourceKind, SuggestionsResponse, TokenRequest,
    TokenResponse,
};

const TOKEN_PATH: &str = "/api/visitor-token";
const PAGE_SEARCH_PATH: &str = "/api/search-index";
const CMS_SEARCH_PATH: &str = "/api/search-cms";
const SUGGESTIONS_PATH: &str = "/api/suggestions";

/// `reqwest` client bound to one search server.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    http: reqwest::Client,
    base_url: Arc<str>,
    timeout: Duration,
}

impl HttpUpstream {
    /// Builds a client for `base_url`.
    ///
    /// `timeout` is a backstop on the whole exchange; the coordinator applies
    /// its own per-attempt deadline on top.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, &config.user_agent, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, err: reqwest::Error) -> SearchError {
        if err.is_timeout() {
            SearchError::Timeout(self.timeout)
        } else {
            SearchError::Network(err.to_string())
        }
    }

    /// Sends a request and decodes a JSON body from a 2xx response.
    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let start = Instant::now();
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        debug!(status = %status, elapsed = ?start.elapsed(), "upstream responded");
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| SearchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn issue_token(&self, request: &TokenRequest) -> Result<String> {
        let response: TokenResponse = self
            .send_json(self.http.post(self.url(TOKEN_PATH)).json(request))
            .await?;
        Ok(response.token)
    }

    async fn search(
        &self,
        source: SourceKind,
        query: &str,
        params: &SiteParams,
        token: &str,
    ) -> Result<Vec<RawRecord>> {
        let (path, pairs) = match source {
            SourceKind::Page => (PAGE_SEARCH_PATH, params.page_query(query)),
            SourceKind::Cms => (CMS_SEARCH_PATH, params.cms_query(query)),
        };

        let response: ResultsResponse = self
            .send_json(self.http.get(self.url(path)).query(&pairs).bearer_auth(token))
            .await?;
        Ok(response.results)
    }

    async fn suggestions(&self, query: &str, params: &SiteParams, token: &str) -> Result<Vec<Value>> {
        let pairs = params.suggestions_query(query);
        let response: SuggestionsResponse = self
            .send_json(
                self.http
                    .get(self.url(SUGGESTIONS_PATH))
                    .query(&pairs)
                    .bearer_auth(token),
            )
            .await?;
        Ok(response.suggestions)
    }
}
