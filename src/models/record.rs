//! Result records and search modes
//!
//! A result record is whatever JSON object an upstream endpoint returns,
//! tagged with the endpoint that produced it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SearchError;

/// Untagged record as returned by an upstream endpoint.
pub type RawRecord = Map<String, Value>;

// == Source Kind ==
/// Which upstream endpoint produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Page index search
    Page,
    /// CMS collection search
    Cms,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Page => "page",
            SourceKind::Cms => "cms",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Search Mode ==
/// Which upstream endpoints a search consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchMode {
    Pages,
    Collection,
    #[default]
    Both,
}

impl SearchMode {
    /// Sources to query, in merge order (pages before cms).
    pub fn sources(&self) -> &'static [SourceKind] {
        match self {
            SearchMode::Pages => &[SourceKind::Page],
            SearchMode::Collection => &[SourceKind::Cms],
            SearchMode::Both => &[SourceKind::Page, SourceKind::Cms],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Pages => "Pages",
            SearchMode::Collection => "Collection",
            SearchMode::Both => "Both",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pages" | "page" => Ok(SearchMode::Pages),
            "collection" | "collections" | "cms" => Ok(SearchMode::Collection),
            "both" => Ok(SearchMode::Both),
            other => Err(SearchError::Config(format!("unknown search mode '{other}'"))),
        }
    }
}

// == Result Record ==
/// A single search hit: open-ended fields plus the producing source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "sourceKind")]
    pub source_kind: SourceKind,
    #[serde(flatten)]
    pub fields: RawRecord,
}

impl ResultRecord {
    /// Tags an upstream record with its source.
    ///
    /// A `sourceKind` field sent by the upstream is discarded; the tag
    /// always reflects the endpoint that was actually called.
    pub fn tagged(source_kind: SourceKind, mut fields: RawRecord) -> Self {
        fields.remove("sourceKind");
        Self {
            source_kind,
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Display title: `name`, then `title`, then "Untitled".
    pub fn title(&self) -> &str {
        self.str_field("name")
            .or_else(|| self.str_field("title"))
            .unwrap_or("Untitled")
    }

    /// Link target for the record.
    ///
    /// Page hits link to `publishedPath` or `slug`; CMS hits to `detailUrl`.
    pub fn detail_url(&self) -> &str {
        let url = match self.source_kind {
            SourceKind::Page => self
                .str_field("publishedPath")
                .or_else(|| self.str_field("slug")),
            SourceKind::Cms => self.str_field("detailUrl"),
        };
        url.unwrap_or("#")
    }

    /// The matched excerpt, cut to at most `max_chars` characters.
    pub fn matched_text(&self, max_chars: usize) -> Option<String> {
        self.str_field("matchedText")
            .map(|text| text.chars().take(max_chars).collect())
    }
}
