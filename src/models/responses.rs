//! Response models
//!
//! Bodies returned by the search server.

use serde::Deserialize;
use serde_json::Value;

use super::record::RawRecord;

/// Body of `POST /api/visitor-token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `GET /api/search-index` and `GET /api/search-cms`.
///
/// A missing `results` field reads as an empty list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub results: Vec<RawRecord>,
}

/// Body of `GET /api/suggestions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<Value>,
}
