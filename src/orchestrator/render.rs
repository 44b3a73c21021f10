//! Render events handed to the presentation layer.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::models::ResultRecord;

/// What the presentation layer should show next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    /// A network search started.
    Loading { query: String },
    /// Results to display, served from the cache when `cached` is set.
    Results {
        query: String,
        records: Vec<ResultRecord>,
        cached: bool,
    },
    /// Every source answered and none had a match.
    NoResults { query: String },
    /// The search could not be performed.
    Error { query: String, message: String },
}

impl RenderEvent {
    pub fn query(&self) -> &str {
        match self {
            RenderEvent::Loading { query }
            | RenderEvent::Results { query, .. }
            | RenderEvent::NoResults { query }
            | RenderEvent::Error { query, .. } => query,
        }
    }
}

/// Receives render events. Implementations must not block.
pub trait RenderSink: Send + Sync {
    fn render(&self, event: RenderEvent);
}

pub type SharedSink = Arc<dyn RenderSink>;

// == Collecting Sink ==
/// Records every event in order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<RenderEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl RenderSink for CollectingSink {
    fn render(&self, event: RenderEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
