//! Upstream Module
//!
//! The search server seen as a black box: token issuance, page and CMS
//! search, and suggestions. [`HttpUpstream`] talks to the real endpoints;
//! tests substitute scripted implementations.

mod http;

pub use http::HttpUpstream;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{RawRecord, SiteParams, SourceKind, TokenRequest};

/// Remote search server.
///
/// Implementations perform exactly one network exchange per call. Timeouts,
/// retries and cancellation are layered on by the caller, so dropping a
/// returned future must abort the underlying request.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Exchanges a visitor identity for a session token.
    async fn issue_token(&self, request: &TokenRequest) -> Result<String>;

    /// Runs one search against a single source.
    async fn search(
        &self,
        source: SourceKind,
        query: &str,
        params: &SiteParams,
        token: &str,
    ) -> Result<Vec<RawRecord>>;

    /// Fetches type-ahead suggestions.
    async fn suggestions(&self, query: &str, params: &SiteParams, token: &str) -> Result<Vec<Value>>;
}

/// Upstream handle shared by the token store, coordinator and tasks.
pub type SharedUpstream = Arc<dyn Upstream>;
