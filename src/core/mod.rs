//! Runtime core: dispatch, cancellation and lifecycle.
//!
//! The main entry point is [`Orchestrator`], which runs one batch of jobs through a
//! [`Pipeline`] and surfaces the aggregate [`Outcome`] or the first failure.
//! The pipeline and the [`PeriodicTrigger`] are public building blocks and can be
//! driven directly.
//!
//! Internal modules:
//! - [`orchestrator`]: submission flow, result aggregation, drain;
//! - [`pipeline`]: bounded intake, concurrent dispatch loop, result stream;
//! - [`trigger`]: fire-immediately-then-periodically task driver;
//! - [`runner`]: executes one job with timeout/panic capture and event publishing;
//! - [`signal`]: one-shot cancellation with cause, external stop handle;
//! - [`latch`]: first-failure-wins slot;
//! - [`state`]: lifecycle state machine;
//! - [`shutdown`]: cross-platform OS signal and timer stop sources.

mod builder;
mod config;
mod latch;
mod orchestrator;
mod pipeline;
mod runner;
mod shutdown;
mod signal;
mod state;
mod trigger;

pub use builder::OrchestratorBuilder;
pub use config::Config;
pub use latch::FailureLatch;
pub use orchestrator::{Orchestrator, Outcome};
pub use pipeline::{
    DispatchHandle, DispatchReport, Intake, Pipeline, PipelineParams, ResultStream,
};
pub use runner::run_job;
pub use shutdown::wait_for_shutdown_signal;
pub use signal::{CancelCause, CancelSignal, StopHandle};
pub use state::State;
pub use trigger::PeriodicTrigger;

/// Renders a captured panic payload as text.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
