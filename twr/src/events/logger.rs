//! Background tasks attached to the event bus

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::bus::EventBus;
use super::types::TaskEvent;

/// Emit [`TaskEvent::IntervalTick`] every `period`, starting one period from now
///
/// Ticks fire whether or not anything changed. Abort the returned handle to stop.
pub fn spawn_interval_ticker(bus: Arc<EventBus>, period: Duration) -> JoinHandle<()> {
    debug!(?period, "spawn_interval_ticker: called");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            bus.emit(TaskEvent::IntervalTick);
        }
    })
}

/// Record every event on the bus at debug level until the bus is dropped
pub fn spawn_event_logger(bus: &EventBus) -> JoinHandle<()> {
    debug!("spawn_event_logger: starting event logger");
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(event_type = event.event_type(), "EventLogger: event"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "EventLogger: lagged behind, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("EventLogger: channel closed, shutting down");
                    break;
                }
            }
        }
    })
}
