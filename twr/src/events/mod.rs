//! Refresh and tick signals
//!
//! Two signals are published: [`TaskEvent::Refresh`] after every successful
//! mutation (or a manual trigger), and [`TaskEvent::IntervalTick`] on a fixed
//! period. Views re-fetch their reports when either fires.
//!
//! ```text
//!   TaskCommands ──Refresh──┐        ┌──> listeners (sync, registration order)
//!   interval ticker ─Tick───┼─> EventBus
//!   manual refresh ─Refresh─┘        └──> broadcast subscribers (async)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = Arc::new(EventBus::with_default_capacity());
//! let id = bus.on(TaskEvent::Refresh, |_| {
//!     println!("reload");
//!     Ok(())
//! });
//! let ticker = spawn_interval_ticker(bus.clone(), Duration::from_secs(10));
//! bus.emit(TaskEvent::Refresh);
//! bus.off(id);
//! ticker.abort();
//! ```

mod bus;
mod logger;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, Listener, ListenerId};
pub use logger::{spawn_event_logger, spawn_interval_ticker};
pub use types::{ListenerError, TaskEvent};
