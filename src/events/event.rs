//! # Runtime events emitted while a submission runs.
//!
//! The [`EventKind`] enum classifies events into:
//! - **Submission events**: start, stop request, failure latch, drain
//! - **Job events**: started, completed, failed, timed out, discarded
//! - **Trigger events**: tick fired / failed
//! - **Subscriber events**: overflow / panic of a subscriber worker
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Delivery through the bus preserves publish order per receiver,
//! but events from concurrent jobs interleave in completion order.
//!
//! ## Example
//! ```rust
//! use jobvisor::{Event, EventKind, Job};
//!
//! let ev = Event::new(EventKind::JobCompleted)
//!     .with_job(&Job::new(3, 10))
//!     .with_value(55);
//!
//! assert_eq!(ev.job, Some(3));
//! assert_eq!(ev.input, Some(10));
//! assert_eq!(ev.value, Some(55));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::jobs::Job;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Submission events ===
    /// `submit` moved the orchestrator from `Idle` to `Running`.
    ///
    /// Sets: `value` (number of jobs in the batch).
    SubmitStarted,

    /// An external stop was requested (handle, OS signal or timer).
    ///
    /// Sets: `reason` (stop source).
    StopRequested,

    /// The first failure was latched; cancellation fired.
    ///
    /// Sets: `job`/`input` (absent for tick failures), `task` (tick failures), `reason`.
    FailureLatched,

    /// Dispatch stopped accepting jobs; in-flight jobs are draining.
    DrainStarted,

    /// Every launched job finished and the result stream closed.
    ///
    /// Sets: `value` (aggregated total, when no failure).
    Drained,

    // === Job events ===
    /// A job was dispatched and its execution started.
    JobStarted,

    /// A job produced a value.
    ///
    /// Sets: `value`, `elapsed_ms`.
    JobCompleted,

    /// A job failed.
    ///
    /// Sets: `reason`.
    JobFailed,

    /// A job exceeded the configured timeout (always followed by `JobFailed`).
    ///
    /// Sets: `timeout_ms`.
    TimeoutHit,

    /// A job was still in the intake when dispatch stopped; it never ran.
    JobDiscarded,

    /// A job result arrived after a failure was latched and was dropped.
    ResultDiscarded,

    // === Trigger events ===
    /// The periodic task was invoked.
    ///
    /// Sets: `task`, `tick` (0 = the immediate invocation).
    TickFired,

    /// A periodic task invocation returned an error or panicked.
    ///
    /// Sets: `task`, `reason`.
    TickFailed,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic message).
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Job id, if the event concerns a job.
    pub job: Option<u64>,
    /// Job input, if the event concerns a job.
    pub input: Option<i64>,
    /// Job result, batch size or aggregated total (see [`EventKind`]).
    pub value: Option<i64>,
    /// Periodic task or subscriber name.
    pub task: Option<Arc<str>>,
    /// Tick number for trigger events.
    pub tick: Option<u64>,
    /// Human-readable reason (errors, overflow details, stop source).
    pub reason: Option<Arc<str>>,
    /// Job timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Execution time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            job: None,
            input: None,
            value: None,
            task: None,
            tick: None,
            reason: None,
            timeout_ms: None,
            elapsed_ms: None,
        }
    }

    /// Attaches job id and input.
    #[inline]
    pub fn with_job(mut self, job: &Job) -> Self {
        self.job = Some(job.id);
        self.input = Some(job.input);
        self
    }

    /// Attaches a value (result, batch size or total).
    #[inline]
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    /// Attaches a task or subscriber name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a tick number.
    #[inline]
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an execution time (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// Whether this event was emitted by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
