//! Debounce timing for type-ahead input.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default delay for short queries
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default ceiling on the delay for longer queries
pub const DEFAULT_DEBOUNCE_MAX: Duration = Duration::from_millis(500);

/// Default minimum query length, in characters, that triggers a search
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;

/// How long to wait after a keystroke before searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    pub base: Duration,
    pub max: Duration,
    pub min_query_len: usize,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_DEBOUNCE,
            max: DEFAULT_DEBOUNCE_MAX,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
        }
    }
}

impl DebouncePolicy {
    /// Delay before searching for `query`, or `None` when it is too short.
    ///
    /// Queries of up to two characters wait `base`; longer ones wait twice
    /// that, capped at `max`.
    pub fn delay_for(&self, query: &str) -> Option<Duration> {
        let len = query.trim().chars().count();
        if len == 0 || len < self.min_query_len {
            return None;
        }
        if len <= 2 {
            Some(self.base)
        } else {
            Some((self.base * 2).min(self.max))
        }
    }
}

// == Debouncer ==
/// Holds at most one pending timer.
///
/// Scheduling replaces the pending timer. Once a timer fires its job runs on
/// its own task, so later scheduling no longer affects it.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `job` after `delay` unless rescheduled or cancelled first.
    pub fn schedule<F>(&self, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(job);
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drops the pending timer, if any.
    pub fn cancel(&self) {
        if let Some(pending) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pending.abort();
        }
    }
}
