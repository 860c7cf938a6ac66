//! # Core subscriber trait
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) – they do **not** block the
//!   publisher nor other subscribers.
//! - Each subscriber declares its queue capacity via [`Subscribe::queue_capacity`].
//!   On overflow, events for that subscriber are dropped and a
//!   `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use async_trait::async_trait;
//! use jobvisor::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct RunningTotal(AtomicI64);
//!
//! #[async_trait]
//! impl Subscribe for RunningTotal {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::JobCompleted {
//!             self.0.fetch_add(ev.value.unwrap_or(0), Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "running_total" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
