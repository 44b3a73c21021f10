//! Merged search results with per-source success tracking.

use serde::Serialize;

use crate::error::{Result, SearchError};
use crate::models::{ResultRecord, SourceKind};

/// How one source fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: SourceKind,
    pub attempts: u32,
    /// Records contributed
    pub count: usize,
    /// Final error when the source gave up
    pub error: Option<String>,
}

impl SourceReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Records from every successful source, pages before CMS.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub records: Vec<ResultRecord>,
    pub sources: Vec<SourceReport>,
}

impl SearchOutcome {
    /// True when sources were queried and none of them succeeded.
    ///
    /// Distinguishes "every upstream failed" from "no matches".
    pub fn all_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| !s.succeeded())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records, or [`SearchError::AllSourcesFailed`] when nothing succeeded.
    pub fn into_result(self) -> Result<Vec<ResultRecord>> {
        if self.all_failed() {
            let reasons: Vec<String> = self
                .sources
                .iter()
                .filter_map(|s| s.error.as_ref().map(|e| format!("{}: {e}", s.source)))
                .collect();
            return Err(SearchError::AllSourcesFailed(reasons.join("; ")));
        }
        Ok(self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(source: SourceKind, error: Option<&str>) -> SourceReport {
        SourceReport {
            source,
            attempts: 1,
            count: 0,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_but_successful_is_not_failure() {
        let outcome = SearchOutcome {
            records: vec![],
            sources: vec![report(SourceKind::Page, None)],
        };
        assert!(!outcome.all_failed());
        assert_eq!(outcome.into_result(), Ok(vec![]));
    }

    #[test]
    fn test_partial_failure_is_not_failure() {
        let outcome = SearchOutcome {
            records: vec![],
            sources: vec![
                report(SourceKind::Page, Some("timeout")),
                report(SourceKind::Cms, None),
            ],
        };
        assert!(!outcome.all_failed());
    }

    #[test]
    fn test_all_failed_reports_each_source() {
        let outcome = SearchOutcome {
            records: vec![],
            sources: vec![
                report(SourceKind::Page, Some("HTTP 500")),
                report(SourceKind::Cms, Some("reset")),
            ],
        };
        assert!(outcome.all_failed());
        assert_eq!(
            outcome.into_result(),
            Err(SearchError::AllSourcesFailed("page: HTTP 500; cms: reset".into()))
        );
    }

    #[test]
    fn test_no_sources_is_not_failure() {
        assert!(!SearchOutcome::default().all_failed());
    }
}
