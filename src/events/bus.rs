//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so that every job unit, the
//! dispatcher and the trigger can publish without blocking.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Receivers:
//!   job unit 1 ──┐
//!   job unit N ──┼──────► Bus ─────┬──► submission listener ──► SubscriberSet
//!   dispatcher ──┤  (broadcast)    └──► Orchestrator::subscribe() receivers
//!   trigger    ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: a slow receiver never stalls a job.
//! - **Bounded**: receivers lagging more than `capacity` events observe `Lagged(n)`.
//! - **No persistence**: events sent while nobody listens are lost.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone; every clone publishes into the same ring buffer.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers (dropped if there are none).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::Drained));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::DrainStarted));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::DrainStarted);
    }
}
