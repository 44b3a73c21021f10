//! Bounded retry with a fixed backoff and a per-attempt deadline.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, SearchError};

/// Default retries after the first attempt
pub const DEFAULT_RETRIES: u32 = 2;

/// Default pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default deadline for a single attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// == Retry Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u32,
    /// Fixed pause before each retry
    pub delay: Duration,
    /// Deadline for each attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Final result of a retried operation and how many attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

// == With Retry ==
/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts()` attempts have been made.
///
/// Each attempt is bounded by `policy.timeout`; an attempt that overruns is
/// dropped and reported as [`SearchError::Timeout`].
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let result = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(policy.timeout)),
        };

        match result {
            Err(err) if err.is_retryable() && attempts < policy.max_attempts() => {
                debug!(
                    source = label,
                    attempt = attempts,
                    error = %err,
                    "attempt failed, retrying in {:?}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
            }
            result => return Attempted { result, attempts },
        }
    }
}
