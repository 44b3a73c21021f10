//! Data models for the search client
//!
//! Result records, search modes, and the DTOs exchanged with the
//! search server.

pub mod page;
pub mod record;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use page::{paginate, Page};
pub use record::{RawRecord, ResultRecord, SearchMode, SourceKind};
pub use requests::{SiteParams, TokenRequest};
pub use responses::{ResultsResponse, SuggestionsResponse, TokenResponse};
