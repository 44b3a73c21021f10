//! Outgoing request models
//!
//! Bodies and query strings sent to the search server.

use serde::Serialize;

/// Body for `POST /api/visitor-token`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub visitor_id: String,
    pub user_agent: String,
    pub site_name: String,
}

/// Per-site search parameters shared by every upstream call.
///
/// List parameters travel as JSON-encoded strings
/// (`collections=["blog","news"]`), which is what the server expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteParams {
    /// Site identifier, usually the first label of the host name
    pub site_name: String,
    /// CMS collections to search
    pub collections: Vec<String>,
    /// CMS fields matched against the query
    pub search_fields: Vec<String>,
    /// CMS fields returned for display
    pub display_fields: Vec<String>,
    /// Optional cap on results per source
    pub limit: Option<u32>,
}

/// Query string as ordered key/value pairs.
pub type QueryPairs = Vec<(&'static str, String)>;

impl SiteParams {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            ..Default::default()
        }
    }

    /// Query for `GET /api/search-index`.
    pub fn page_query(&self, query: &str) -> QueryPairs {
        let mut pairs = vec![
            ("query", query.to_string()),
            ("siteName", self.site_name.clone()),
        ];
        self.push_limit(&mut pairs);
        pairs
    }

    /// Query for `GET /api/search-cms`.
    pub fn cms_query(&self, query: &str) -> QueryPairs {
        let mut pairs = vec![
            ("query", query.to_string()),
            ("siteName", self.site_name.clone()),
            ("collections", json_list(&self.collections)),
            ("searchFields", json_list(&self.search_fields)),
            ("displayFields", json_list(&self.display_fields)),
        ];
        self.push_limit(&mut pairs);
        pairs
    }

    /// Query for `GET /api/suggestions`.
    pub fn suggestions_query(&self, query: &str) -> QueryPairs {
        vec![
            ("query", query.to_string()),
            ("siteName", self.site_name.clone()),
            ("collections", json_list(&self.collections)),
            ("searchFields", json_list(&self.search_fields)),
        ]
    }

    fn push_limit(&self, pairs: &mut QueryPairs) {
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
    }
}

fn json_list(items: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}
