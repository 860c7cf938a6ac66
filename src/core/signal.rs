//! # Single-shot cancellation broadcast.
//!
//! [`CancelSignal`] pairs a [`CancellationToken`] with the **cause** of the first
//! fire. Firing is idempotent: the first caller records its cause and cancels the
//! token; later calls (from any number of tasks, concurrently) are no-ops.
//!
//! ```text
//!   StopHandle::stop() ───────┐
//!   stop_on_signal / after ───┼──► CancelSignal::fire(cause) ──► token.cancel()
//!   first job failure ────────┘      (first cause wins)           │
//!                                                                 ▼
//!                              dispatcher · producer · trigger · tick tasks
//! ```

use std::sync::{Arc, OnceLock};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::events::{Bus, Event, EventKind};

/// Why cancellation fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// Requested from outside (stop handle, OS signal, timer).
    External,
    /// A job or tick failure was latched.
    Failure,
}

/// Idempotent, broadcast cancellation signal.
#[derive(Debug, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    cause: OnceLock<CancelCause>,
}

impl CancelSignal {
    /// Creates an active (not fired) signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Returns `true` if this call was the one that fired it.
    pub fn fire(&self, cause: CancelCause) -> bool {
        let won = self.cause.set(cause).is_ok();
        self.token.cancel();
        won
    }

    /// Whether the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cause of the first fire, if any.
    pub fn cause(&self) -> Option<CancelCause> {
        self.cause.get().copied()
    }

    /// Completes once the signal fires (immediately if it already did).
    pub fn fired(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// The underlying token; cancelled exactly when the signal fires.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Cloneable handle for requesting an external stop.
///
/// Obtained from [`Orchestrator::stop_handle`](crate::Orchestrator::stop_handle).
/// A stop is a clean shutdown, not a failure: in-flight jobs finish, the
/// outcome reports what completed.
#[derive(Clone, Debug)]
pub struct StopHandle {
    signal: Arc<CancelSignal>,
    bus: Bus,
}

impl StopHandle {
    pub(crate) fn new(signal: Arc<CancelSignal>, bus: Bus) -> Self {
        Self { signal, bus }
    }

    /// Requests a stop. Safe to call any number of times from anywhere.
    pub fn stop(&self) {
        self.stop_with("handle");
    }

    /// Whether cancellation fired (for any cause).
    pub fn is_stopped(&self) -> bool {
        self.signal.is_fired()
    }

    /// Completes once cancellation fires (for any cause).
    pub async fn stopped(&self) {
        self.signal.fired().await
    }

    pub(crate) fn stop_with(&self, source: &'static str) {
        if self.signal.fire(CancelCause::External) {
            self.bus
                .publish(Event::new(EventKind::StopRequested).with_reason(source));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cause_wins_and_refire_is_noop() {
        let sig = CancelSignal::new();
        assert!(!sig.is_fired());
        assert!(sig.fire(CancelCause::Failure));
        assert!(!sig.fire(CancelCause::External));
        assert!(sig.is_fired());
        assert_eq!(sig.cause(), Some(CancelCause::Failure));
    }

    #[tokio::test]
    async fn concurrent_fires_have_exactly_one_winner() {
        let sig = Arc::new(CancelSignal::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let sig = sig.clone();
            handles.push(tokio::spawn(async move {
                let cause = if i % 2 == 0 {
                    CancelCause::External
                } else {
                    CancelCause::Failure
                };
                sig.fire(cause)
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        sig.fired().await;
    }

    #[tokio::test]
    async fn stop_publishes_once() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let handle = StopHandle::new(Arc::new(CancelSignal::new()), bus.clone());

        handle.stop();
        handle.clone().stop();
        bus.publish(Event::new(EventKind::Drained));

        assert!(handle.is_stopped());
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::StopRequested);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Drained);
    }
}
