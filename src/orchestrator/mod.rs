//! Orchestrator Module
//!
//! Input handling for the search box: debouncing, cache lookups, duplicate
//! suppression and rendering.

mod debounce;
mod render;
mod search;

pub use debounce::{
    DebouncePolicy, Debouncer, DEFAULT_DEBOUNCE, DEFAULT_DEBOUNCE_MAX, DEFAULT_MIN_QUERY_LEN,
};
pub use render::{CollectingSink, RenderEvent, RenderSink, SharedSink};
pub use search::{SearchCommand, SearchOrchestrator, SEARCH_ERROR_MESSAGE};
