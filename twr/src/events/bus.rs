//! Event Bus - typed publish/subscribe for refresh and tick signals
//!
//! Listeners registered with [`EventBus::on`] run synchronously inside
//! [`EventBus::emit`], in registration order. Async consumers can instead
//! [`subscribe`](EventBus::subscribe) to a tokio broadcast channel.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::types::{ListenerError, TaskEvent};

/// Default broadcast channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Synchronous event listener
pub type Listener = Arc<dyn Fn(TaskEvent) -> eyre::Result<()> + Send + Sync>;

/// Handle returned by [`EventBus::on`], used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: u64,
    event: TaskEvent,
    listener: Listener,
}

/// Central bus for [`TaskEvent`]s
pub struct EventBus {
    tx: broadcast::Sender<TaskEvent>,
    listeners: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create a new event bus with the given broadcast capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Register `listener` for `event`
    pub fn on<F>(&self, event: TaskEvent, listener: F) -> ListenerId
    where
        F: Fn(TaskEvent) -> eyre::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, %event, "EventBus::on: registering listener");
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                id,
                event,
                listener: Arc::new(listener),
            });
        ListenerId(id)
    }

    /// Unregister one listener; false if it was not registered
    pub fn off(&self, id: ListenerId) -> bool {
        debug!(id = id.0, "EventBus::off: called");
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|r| r.id != id.0);
        listeners.len() != before
    }

    /// Unregister every listener for `event`, returning how many were removed
    pub fn off_all(&self, event: TaskEvent) -> usize {
        debug!(%event, "EventBus::off_all: called");
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|r| r.event != event);
        before - listeners.len()
    }

    /// Number of listeners registered for `event`
    pub fn listener_count(&self, event: TaskEvent) -> usize {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        listeners.iter().filter(|r| r.event == event).count()
    }

    /// Deliver `event` to every listener, then to broadcast subscribers
    ///
    /// A listener that errors or panics does not stop the others. Failures are
    /// logged and returned.
    pub fn emit(&self, event: TaskEvent) -> Vec<ListenerError> {
        let targets: Vec<(u64, Listener)> = {
            let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            listeners
                .iter()
                .filter(|r| r.event == event)
                .map(|r| (r.id, r.listener.clone()))
                .collect()
        };
        debug!(%event, listeners = targets.len(), "EventBus::emit");

        let mut failures = Vec::new();
        for (id, listener) in targets {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(id, %event, error = %e, "Event listener failed");
                    failures.push(ListenerError::Failed {
                        id,
                        event,
                        message: e.to_string(),
                    });
                }
                Err(_) => {
                    warn!(id, %event, "Event listener panicked");
                    failures.push(ListenerError::Panicked { id, event });
                }
            }
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
        failures
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Get the number of active broadcast subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
