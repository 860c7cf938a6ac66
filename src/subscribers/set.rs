//! # Non-blocking event fan-out to multiple subscribers.
//!
//! ```text
//! emit(event)
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` uses `try_send` and returns immediately
//! - **Per-subscriber FIFO**; no ordering across subscribers
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Isolation**: a panicking subscriber is caught (`catch_unwind`) and keeps running
//!
//! **Warning**: `AssertUnwindSafe` is used; a subscriber that panics while holding a
//! lock may leave its own state inconsistent.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for event subscribers.
///
/// Workers live as long as the set; [`SubscriberSet::shutdown`] closes the queues
/// and waits for every worker to process what it already received.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(worker(sub, rx, bus.clone())));
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to all subscribers without waiting for them.
    ///
    /// Overflow of a `SubscriberOverflow` event is not re-published (no feedback loop).
    pub fn emit(&self, event: &Event) {
        if self.channels.is_empty() {
            return;
        }
        let event = Arc::new(event.clone());
        let is_internal = event.is_subscriber_internal();

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_internal {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes all queues and waits for the workers to finish.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

async fn worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            bus.publish(Event::subscriber_panicked(
                sub.name(),
                crate::core::panic_message(panic.as_ref()),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Subscribe for Exploder {
        async fn on_event(&self, _ev: &Event) {
            panic!("subscriber blew up");
        }
        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_flushes_on_shutdown() {
        let bus = Bus::new(16);
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone()], bus);

        set.emit(&Event::new(EventKind::SubmitStarted));
        set.emit(&Event::new(EventKind::JobStarted));
        set.emit(&Event::new(EventKind::Drained));
        set.shutdown().await;

        assert_eq!(
            *rec.0.lock().unwrap(),
            vec![
                EventKind::SubmitStarted,
                EventKind::JobStarted,
                EventKind::Drained
            ]
        );
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Exploder)], bus);

        set.emit(&Event::new(EventKind::JobStarted));
        set.shutdown().await;

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.task.as_deref(), Some("exploder"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber blew up"));
    }
}
