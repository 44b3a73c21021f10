//! Site Search - client core for a hosted site search service
//!
//! Debounced type-ahead search over page and CMS indexes with a TTL result
//! cache, session token management, per-source retries and cancellation of
//! superseded searches.

pub mod cache;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod tasks;
pub mod token;
pub mod upstream;

pub use cache::{ResultCache, SharedCache};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use coordinator::{RequestCoordinator, RetryPolicy, SearchOutcome};
pub use error::{Result, SearchError};
pub use models::{ResultRecord, SearchMode, SourceKind};
pub use orchestrator::{RenderEvent, RenderSink, SearchCommand, SearchOrchestrator};
pub use tasks::{spawn_cleanup_task, spawn_warmup_task};
pub use token::TokenStore;
pub use upstream::{HttpUpstream, Upstream};
