//! Error types for the search client
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == Search Error Enum ==
/// Unified error type for the search client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// No session token could be obtained from the token endpoint
    #[error("Session token unavailable: {0}")]
    TokenUnavailable(String),

    /// Transport-level failure (connection refused, reset, DNS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// A single upstream attempt ran past its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status}")]
    Status { status: u16 },

    /// Upstream body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request was superseded by a newer one
    #[error("Request cancelled")]
    Cancelled,

    /// Every requested source failed
    #[error("All search sources failed: {0}")]
    AllSourcesFailed(String),

    /// Persisted visitor state could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),
}

impl SearchError {
    // == Is Retryable ==
    /// Returns true when another attempt against the same source may succeed.
    ///
    /// Timeouts, transport failures, rate limiting and server errors are
    /// transient. Client errors and undecodable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Network(_) | SearchError::Timeout(_) => true,
            SearchError::Status { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    // == Is Cancelled ==
    /// Returns true for the silent cancellation path.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}

// == Result Type Alias ==
/// Convenience Result type for the search client.
pub type Result<T> = std::result::Result<T, SearchError>;
