//! Signal kinds and listener errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signals published on the [`EventBus`](super::EventBus)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskEvent {
    /// Task data changed; views should re-fetch and suggestion caches are stale
    Refresh,
    /// Fixed-period tick, for consumers that poll
    IntervalTick,
}

impl TaskEvent {
    /// Signal name as exposed to collaborators
    pub fn event_type(&self) -> &'static str {
        match self {
            TaskEvent::Refresh => "refresh",
            TaskEvent::IntervalTick => "interval-tick",
        }
    }
}

impl std::fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_type())
    }
}

/// A listener that did not complete
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Listener {id} failed on {event}: {message}")]
    Failed { id: u64, event: TaskEvent, message: String },

    #[error("Listener {id} panicked on {event}")]
    Panicked { id: u64, event: TaskEvent },
}
