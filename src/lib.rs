//! # jobvisor
//!
//! **Jobvisor** runs a bounded batch of integer jobs concurrently, streams their
//! results back as they complete, and stops everything cleanly on the first
//! failure or on an external stop request.
//!
//! It is built from three pieces that can also be used on their own:
//! a [`PeriodicTrigger`] (run a task now, then every interval), a [`Pipeline`]
//! (bounded intake, concurrent dispatch, result stream) and the [`Orchestrator`]
//! tying them together under one cancellation signal.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   jobs ──► producer ──► Intake (bounded) ──► dispatch loop ──┬─► job unit #1 ─┐
//!                                                  │           ├─► job unit #2 ─┤
//!                         CancelSignal ────────────┤           └─► job unit #N ─┤
//!                        ▲          ▲              │                            ▼
//!                        │          │              │               ResultStream (bounded)
//!                 StopHandle   FailureLatch ◄──────┼─── first failure ──┐       │
//!            (stop / signal /  (first wins)        │                    │       ▼
//!                 timer)                           │                 Orchestrator::aggregate
//!                                                  ▼                            │
//!                                           PeriodicTrigger                     ▼
//!                                        (child of CancelSignal)    Ok(Outcome) | Err(first)
//!
//!   every component ── publish ──► Bus ──► submission listener ──► SubscriberSet ──► Subscribe
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──submit──► Running ──dispatch stops──► Draining ──results closed──► Done
//!
//! dispatch stops when:
//!   - the intake is exhausted (all jobs launched), or
//!   - the cancel signal fires (StopHandle, OS signal, timer, first failure)
//!
//! on stop: jobs still buffered in the intake are discarded,
//!          jobs already running finish and report,
//!          the result stream closes after the last report.
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                              |
//! |-------------------|-------------------------------------------------------------------|-------------------------------------------------|
//! | **Orchestration** | Submit a batch, get the sum or the first failure.                 | [`Orchestrator`], [`Outcome`], [`StopHandle`]   |
//! | **Pipeline**      | Bounded intake, concurrent dispatch, completion-order results.    | [`Pipeline`], [`Intake`], [`ResultStream`]      |
//! | **Trigger**       | Fire immediately, then periodically, until cancelled.             | [`PeriodicTrigger`], [`Task`], [`TaskFn`]       |
//! | **Jobs**          | Plug in any async integer computation.                            | [`Execute`], [`ExecFn`], [`SumTo`], [`Job`]     |
//! | **Subscriber API**| Observe the run (logging, metrics, progress).                     | [`Subscribe`], [`Event`], [`EventKind`]         |
//! | **Errors**        | Typed errors for jobs, intake and orchestration.                  | [`JobError`], [`RuntimeError`], [`SubmitError`] |
//! | **Configuration** | Capacities, concurrency cap, per-job timeout.                     | [`Config`]                                      |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber emitting `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use jobvisor::{Config, Job, Orchestrator, SumTo};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::builder(Config::default(), SumTo::arc(Duration::from_millis(1)))
//!         .build();
//!
//!     let outcome = orch.submit(Job::batch([1, 5, 10])).await?;
//!     assert_eq!(outcome.total, 71);
//!
//!     orch.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod jobs;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    CancelCause, CancelSignal, Config, DispatchHandle, DispatchReport, FailureLatch, Intake,
    Orchestrator, OrchestratorBuilder, Outcome, PeriodicTrigger, Pipeline, PipelineParams,
    ResultStream, State, StopHandle, run_job, wait_for_shutdown_signal,
};
pub use error::{JobError, RuntimeError, SubmitError};
pub use events::{Bus, Event, EventKind};
pub use jobs::{
    BoxJobFuture, BoxTaskFuture, ExecFn, Execute, ExecutorRef, Job, JobFailure, JobOutput,
    JobReport, SumTo, Task, TaskFn, TaskRef, gauss,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
