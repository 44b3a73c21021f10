//! Coordinator Module
//!
//! Fans a search out to the upstream sources with per-attempt timeouts and
//! bounded retries, and cancels superseded searches.

mod outcome;
mod request;
mod retry;

pub use outcome::{SearchOutcome, SourceReport};
pub use request::RequestCoordinator;
pub use retry::{with_retry, Attempted, RetryPolicy};
