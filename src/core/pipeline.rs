//! # Job channel pipeline.
//!
//! A bounded **intake**, one **dispatch loop** and a **result stream**:
//!
//! ```text
//!  Intake::send ──► [intake (bounded)] ──► dispatch loop ──spawn──► job unit ─┐
//!  Intake::send ──┘                           │     ▲                 job unit ─┼──► [results] ──► ResultStream
//!                                             │     └── JoinSet (tracked)      │
//!                                             ▼                     job unit ─┘
//!                                  signal fired / intake exhausted
//!                                             │
//!                          close intake, discard leftovers, drain JoinSet,
//!                          drop sender ──► ResultStream yields None
//! ```
//!
//! ## Dispatch loop (biased select, cancellation first)
//! - `signal.fired()` → stop dispatching
//! - finished unit in the `JoinSet` → reap
//! - job received → wait for an execution slot (cancellable), spawn a unit
//! - intake closed and empty → stop dispatching
//!
//! ## Guarantees
//! - Every launched job produces exactly one [`JobReport`] on the stream (unless
//!   the stream itself was dropped, in which case the report is silently dropped).
//! - The stream closes only after every launched unit finished: the dispatcher
//!   drains its `JoinSet` before dropping its sender, and each unit holds its own.
//! - Jobs still buffered when dispatch stops are counted as discarded and never run.
//! - The first failure is recorded in the [`FailureLatch`] **before** the
//!   cancellation signal fires.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::Config,
        latch::FailureLatch,
        runner::run_job,
        signal::{CancelCause, CancelSignal},
    },
    error::{RuntimeError, SubmitError},
    events::{Bus, Event, EventKind},
    jobs::{ExecutorRef, Job, JobFailure, JobReport},
};

/// Sizing and limits of one pipeline.
#[derive(Clone, Debug)]
pub struct PipelineParams {
    /// Intake buffer capacity (min 1).
    pub intake_capacity: usize,
    /// Result stream buffer capacity (min 1).
    pub output_capacity: usize,
    /// Maximum concurrently executing jobs (`None` = unlimited).
    pub max_concurrent: Option<usize>,
    /// Per-job timeout (`None` = none).
    pub job_timeout: Option<Duration>,
}

impl PipelineParams {
    /// Derives parameters from `cfg` for a batch of `batch` jobs.
    pub fn for_batch(cfg: &Config, batch: usize) -> Self {
        Self {
            intake_capacity: cfg.intake_capacity_for(batch),
            output_capacity: cfg.output_capacity_clamped(),
            max_concurrent: cfg.concurrency_limit(),
            job_timeout: cfg.timeout(),
        }
    }
}

/// Producer side of the pipeline. Cloneable; the intake closes for good once
/// every clone is dropped or dispatch stops.
#[derive(Clone, Debug)]
pub struct Intake {
    tx: mpsc::Sender<Job>,
}

impl Intake {
    /// Pushes a job, waiting while the intake is full.
    ///
    /// Fails with [`SubmitError::Closed`] once dispatch stopped; a producer blocked
    /// on a full intake is released with that error.
    pub async fn send(&self, job: Job) -> Result<(), SubmitError> {
        self.tx.send(job).await.map_err(|_| SubmitError::Closed)
    }

    /// Pushes a job without waiting.
    pub fn try_send(&self, job: Job) -> Result<(), SubmitError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    /// Whether dispatch stopped accepting jobs.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the pipeline: reports in completion order.
///
/// Yields `None` once every launched job has been reported.
#[derive(Debug)]
pub struct ResultStream {
    rx: mpsc::Receiver<JobReport>,
}

impl ResultStream {
    /// Receives the next report.
    pub async fn recv(&mut self) -> Option<JobReport> {
        self.rx.recv().await
    }
}

impl Stream for ResultStream {
    type Item = JobReport;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<JobReport>> {
        self.rx.poll_recv(cx)
    }
}

/// Dispatch statistics, returned when the dispatch loop finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Jobs whose execution was started.
    pub dispatched: usize,
    /// Jobs received but never started because dispatch stopped.
    pub discarded: usize,
    /// Cancellation ended dispatch while the intake was still open.
    pub interrupted: bool,
}

/// Handle on the running dispatch loop.
#[derive(Debug)]
pub struct DispatchHandle {
    join: JoinHandle<DispatchReport>,
    stopped: CancellationToken,
}

impl DispatchHandle {
    /// Whether dispatch stopped accepting jobs (drain may still be in progress).
    pub fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    /// Completes once dispatch stops accepting jobs.
    pub async fn stopped(&self) {
        self.stopped.cancelled().await
    }

    /// Waits for the dispatch loop to finish draining.
    pub async fn join(self) -> Result<DispatchReport, RuntimeError> {
        self.join.await.map_err(|e| RuntimeError::DispatcherLost {
            reason: e.to_string(),
        })
    }
}

/// A running pipeline, split into its three endpoints.
#[derive(Debug)]
pub struct Pipeline {
    /// Producer endpoint.
    pub intake: Intake,
    /// Consumer endpoint.
    pub results: ResultStream,
    /// Dispatch loop handle.
    pub dispatch: DispatchHandle,
}

impl Pipeline {
    /// Spawns the dispatch loop and returns the pipeline endpoints.
    ///
    /// Must be called inside a tokio runtime. The loop stops when `signal` fires
    /// or when every [`Intake`] clone is dropped and the buffer is empty.
    pub fn spawn(
        exec: ExecutorRef,
        params: PipelineParams,
        signal: Arc<CancelSignal>,
        latch: Arc<FailureLatch>,
        bus: Bus,
    ) -> Self {
        let (in_tx, in_rx) = mpsc::channel(params.intake_capacity.max(1));
        let (out_tx, out_rx) = mpsc::channel(params.output_capacity.max(1));
        let stopped = CancellationToken::new();

        let dispatcher = Dispatcher {
            exec,
            intake: in_rx,
            out: out_tx,
            semaphore: params.max_concurrent.map(|n| Arc::new(Semaphore::new(n))),
            timeout: params.job_timeout,
            signal,
            latch,
            bus,
            stopped: stopped.clone(),
        };

        Self {
            intake: Intake { tx: in_tx },
            results: ResultStream { rx: out_rx },
            dispatch: DispatchHandle {
                join: tokio::spawn(dispatcher.run()),
                stopped,
            },
        }
    }
}

/// Execution slot: a permit when concurrency is capped.
type Slot = Option<OwnedSemaphorePermit>;

struct Dispatcher {
    exec: ExecutorRef,
    intake: mpsc::Receiver<Job>,
    out: mpsc::Sender<JobReport>,
    semaphore: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
    signal: Arc<CancelSignal>,
    latch: Arc<FailureLatch>,
    bus: Bus,
    stopped: CancellationToken,
}

impl Dispatcher {
    async fn run(mut self) -> DispatchReport {
        let _stopped_on_exit = self.stopped.clone().drop_guard();
        let mut units: JoinSet<()> = JoinSet::new();
        let mut report = DispatchReport::default();

        loop {
            let job = tokio::select! {
                biased;
                _ = self.signal.fired() => {
                    report.interrupted = true;
                    break;
                }
                Some(res) = units.join_next(), if !units.is_empty() => {
                    reap(res);
                    continue;
                }
                next = self.intake.recv() => match next {
                    Some(job) => job,
                    None => break,
                },
            };

            let Some(slot) = self.acquire().await else {
                report.interrupted = true;
                self.discard(&job, &mut report);
                break;
            };
            self.launch(&mut units, job, slot);
            report.dispatched += 1;
        }

        self.stopped.cancel();
        self.bus.publish(Event::new(EventKind::DrainStarted));

        self.intake.close();
        while let Ok(job) = self.intake.try_recv() {
            self.discard(&job, &mut report);
        }
        while let Some(res) = units.join_next().await {
            reap(res);
        }
        report
    }

    /// Waits for an execution slot; `None` if cancellation fired first.
    async fn acquire(&self) -> Option<Slot> {
        let Some(sem) = &self.semaphore else {
            return Some(None);
        };
        tokio::select! {
            biased;
            _ = self.signal.fired() => None,
            permit = sem.clone().acquire_owned() => permit.ok().map(Some),
        }
    }

    fn launch(&self, units: &mut JoinSet<()>, job: Job, slot: Slot) {
        let exec = Arc::clone(&self.exec);
        let out = self.out.clone();
        let signal = Arc::clone(&self.signal);
        let latch = Arc::clone(&self.latch);
        let bus = self.bus.clone();
        let timeout = self.timeout;

        units.spawn(async move {
            let report = run_job(exec.as_ref(), job, timeout, &bus).await;
            drop(slot);
            if let Err(failure) = &report {
                latch_failure(&latch, &signal, &bus, failure);
            }
            // Receiver gone means nobody wants results any more.
            let _ = out.send(report).await;
        });
    }

    fn discard(&self, job: &Job, report: &mut DispatchReport) {
        report.discarded += 1;
        self.bus
            .publish(Event::new(EventKind::JobDiscarded).with_job(job));
    }
}

/// Latches `failure` if it is the first one, then fires cancellation.
fn latch_failure(latch: &FailureLatch, signal: &CancelSignal, bus: &Bus, failure: &JobFailure) {
    let won = latch.record(RuntimeError::JobFailed {
        job: failure.job,
        error: failure.error.clone(),
    });
    if !won {
        return;
    }
    signal.fire(CancelCause::Failure);
    bus.publish(
        Event::new(EventKind::FailureLatched)
            .with_job(&failure.job)
            .with_reason(failure.error.as_message()),
    );
}

fn reap(res: Result<(), JoinError>) {
    if let Err(e) = res {
        tracing::error!(error = %e, "job unit terminated abnormally");
    }
}
