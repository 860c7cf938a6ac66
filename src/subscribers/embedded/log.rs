//! # LogWriter: events as `tracing` records
//!
//! Install a `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output
//! ```text
//! INFO jobvisor: submit started jobs=3
//! INFO jobvisor: job started job=2 input=5
//! WARN jobvisor: job failed job=2 input=5 reason="error: five"
//! WARN jobvisor: failure latched job=2 reason="error: five"
//! INFO jobvisor: drain started
//! INFO jobvisor: drained total=None
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        let task = e.task.as_deref().unwrap_or("");
        match e.kind {
            EventKind::SubmitStarted => info!(jobs = e.value, "submit started"),
            EventKind::StopRequested => info!(source = reason, "stop requested"),
            EventKind::FailureLatched => {
                warn!(job = e.job, task, reason, "failure latched")
            }
            EventKind::DrainStarted => info!("drain started"),
            EventKind::Drained => info!(total = e.value, "drained"),
            EventKind::JobStarted => info!(job = e.job, input = e.input, "job started"),
            EventKind::JobCompleted => info!(
                job = e.job,
                input = e.input,
                value = e.value,
                elapsed_ms = e.elapsed_ms,
                "job completed"
            ),
            EventKind::JobFailed => warn!(job = e.job, input = e.input, reason, "job failed"),
            EventKind::TimeoutHit => {
                warn!(job = e.job, timeout_ms = e.timeout_ms, "job timed out")
            }
            EventKind::JobDiscarded => info!(job = e.job, input = e.input, "job discarded"),
            EventKind::ResultDiscarded => {
                debug!(job = e.job, value = e.value, "result discarded")
            }
            EventKind::TickFired => debug!(task, tick = e.tick, "tick"),
            EventKind::TickFailed => warn!(task, reason, "tick failed"),
            EventKind::SubscriberOverflow => warn!(subscriber = task, reason, "subscriber overflow"),
            EventKind::SubscriberPanicked => warn!(subscriber = task, reason, "subscriber panicked"),
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
