//! # Orchestrator: one bounded batch, first-failure cancellation, clean drain.
//!
//! The [`Orchestrator`] owns the cancellation signal, the first-failure latch and
//! the lifecycle of one [`Pipeline`] run. [`Orchestrator::submit`] feeds a batch
//! of jobs into the pipeline while results are being consumed, runs the periodic
//! trigger (if configured) under the same cancellation, and returns once every
//! launched job has been reported.
//!
//! ## High-level flow
//! ```text
//! submit(jobs)
//!   ├─► state Idle → Running, publish SubmitStarted
//!   ├─► Pipeline::spawn(executor, params, signal, latch, bus)
//!   ├─► producer task: jobs ──► Intake (stops early on cancellation)
//!   ├─► trigger task:  PeriodicTrigger::run(child of signal)
//!   ├─► aggregate ResultStream   ║   dispatch stopped → state Draining
//!   ├─► stream closed → join dispatcher, producer; stop and join trigger
//!   └─► state Done, publish Drained
//!         ├─ latch holds a failure → Err(first failure)
//!         └─ otherwise             → Ok(Outcome { total, ... })
//! ```
//!
//! ## Cancellation sources
//! - [`StopHandle::stop`] / OS signal / timer → clean stop; `Outcome::stopped` is set
//!   when it cut dispatch short
//! - first job failure (or periodic task failure) → latched, then signal fired
//!
//! In both cases jobs already executing run to completion before `submit` returns.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::Config,
        latch::FailureLatch,
        pipeline::{Intake, Pipeline, PipelineParams, ResultStream},
        signal::{CancelCause, CancelSignal, StopHandle},
        state::{State, StateCell},
        trigger::PeriodicTrigger,
    },
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    jobs::{BoxTaskFuture, ExecutorRef, Job, Task, TaskRef},
    subscribers::SubscriberSet,
};

/// Successful result of a submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Sum of all produced results.
    pub total: i64,
    /// Number of jobs that produced a result.
    pub completed: usize,
    /// Number of jobs whose execution started.
    pub dispatched: usize,
    /// Number of submitted jobs that never started (stop requested first).
    pub discarded: usize,
    /// Number of periodic task invocations.
    pub ticks: u64,
    /// Whether an external stop ended dispatch before every job was launched.
    ///
    /// A stop arriving once all jobs were already running leaves this `false`.
    pub stopped: bool,
}

impl Outcome {
    /// Whether every submitted job was executed.
    pub fn is_complete(&self) -> bool {
        self.discarded == 0
    }
}

/// Runs one batch of jobs through a pipeline and surfaces the aggregate outcome.
pub struct Orchestrator {
    cfg: Config,
    exec: ExecutorRef,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    signal: Arc<CancelSignal>,
    latch: Arc<FailureLatch>,
    state: StateCell,
    trigger: Option<PeriodicTrigger>,
}

impl Orchestrator {
    pub(crate) fn new_internal(
        cfg: Config,
        exec: ExecutorRef,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        trigger: Option<(std::time::Duration, TaskRef)>,
    ) -> Self {
        let signal = Arc::new(CancelSignal::new());
        let latch = Arc::new(FailureLatch::new());
        let trigger = trigger.map(|(interval, task)| {
            let task: TaskRef = Arc::new(Escalate {
                inner: task,
                latch: Arc::clone(&latch),
                signal: Arc::clone(&signal),
                bus: bus.clone(),
            });
            PeriodicTrigger::new(task, interval, bus.clone())
        });

        Self {
            cfg,
            exec,
            bus,
            subs,
            signal,
            latch,
            state: StateCell::new(),
            trigger,
        }
    }

    /// Handle for requesting an external stop (usable before and during `submit`).
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(Arc::clone(&self.signal), self.bus.clone())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state.get()
    }

    /// Receiver observing lifecycle transitions.
    pub fn watch_state(&self) -> watch::Receiver<State> {
        self.state.watch()
    }

    /// Raw event receiver (events published after this call).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs `jobs` to completion, stop or first failure.
    ///
    /// Can be called once; later calls return [`RuntimeError::AlreadySubmitted`].
    ///
    /// ### Returns
    /// - `Ok(Outcome)` when no job failed (including after an external stop)
    /// - `Err(RuntimeError::JobFailed | TickFailed)` with the first failure otherwise
    pub async fn submit<I>(&self, jobs: I) -> Result<Outcome, RuntimeError>
    where
        I: IntoIterator<Item = Job>,
    {
        if !self.state.advance(State::Idle, State::Running) {
            return Err(RuntimeError::AlreadySubmitted);
        }
        let jobs: Vec<Job> = jobs.into_iter().collect();
        let batch = jobs.len();
        let listener = self.subscriber_listener();
        self.bus
            .publish(Event::new(EventKind::SubmitStarted).with_value(batch as i64));

        let Pipeline {
            intake,
            results,
            dispatch,
        } = Pipeline::spawn(
            Arc::clone(&self.exec),
            PipelineParams::for_batch(&self.cfg, batch),
            Arc::clone(&self.signal),
            Arc::clone(&self.latch),
            self.bus.clone(),
        );
        let producer = tokio::spawn(produce(intake, jobs, Arc::clone(&self.signal)));

        let tick_stop = self.signal.token().child_token();
        let ticker = self.trigger.clone().map(|trigger| {
            let stop = tick_stop.clone();
            tokio::spawn(async move { trigger.run(stop).await })
        });

        let ((total, completed), ()) = tokio::join!(self.aggregate(results), async {
            dispatch.stopped().await;
            self.state.advance(State::Running, State::Draining);
        });

        let report = dispatch.join().await;
        if let Err(e) = producer.await {
            tracing::error!(error = %e, "producer terminated abnormally");
        }
        tick_stop.cancel();
        let ticks = match ticker {
            Some(h) => h.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "periodic trigger terminated abnormally");
                0
            }),
            None => 0,
        };
        self.state.advance(State::Draining, State::Done);

        let result = match (self.latch.take(), report) {
            (Some(first), _) => Err(first),
            (None, Err(lost)) => Err(lost),
            (None, Ok(report)) => Ok(Outcome {
                total,
                completed,
                dispatched: report.dispatched,
                discarded: batch.saturating_sub(report.dispatched),
                ticks,
                stopped: report.interrupted
                    && self.signal.cause() == Some(CancelCause::External),
            }),
        };

        let mut drained = Event::new(EventKind::Drained);
        if let Ok(outcome) = &result {
            drained = drained.with_value(outcome.total);
        }
        self.bus.publish(drained);

        if let Some((handle, done)) = listener {
            done.cancel();
            let _ = handle.await;
        }
        result
    }

    /// Closes subscriber queues and waits for subscribers to process what they received.
    pub async fn shutdown(self) {
        if let Ok(set) = Arc::try_unwrap(self.subs) {
            set.shutdown().await;
        }
    }

    /// Sums successful results; results arriving after a latched failure are dropped.
    async fn aggregate(&self, mut results: ResultStream) -> (i64, usize) {
        let mut total: i64 = 0;
        let mut completed = 0;

        while let Some(report) = results.recv().await {
            let Ok(out) = report else {
                continue;
            };
            if self.latch.is_set() {
                self.bus.publish(
                    Event::new(EventKind::ResultDiscarded)
                        .with_job(&out.job)
                        .with_value(out.value),
                );
                continue;
            }
            total = total.saturating_add(out.value);
            completed += 1;
        }
        (total, completed)
    }

    /// Forwards bus events to the subscriber set until told to stop, then flushes.
    fn subscriber_listener(&self) -> Option<(JoinHandle<()>, CancellationToken)> {
        if self.subs.is_empty() {
            return None;
        }
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let done = CancellationToken::new();
        let stop = done.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
        });
        Some((handle, done))
    }
}

/// Pushes jobs into the intake in order until done, cancelled or closed.
async fn produce(intake: Intake, jobs: Vec<Job>, signal: Arc<CancelSignal>) {
    for job in jobs {
        tokio::select! {
            biased;
            _ = signal.fired() => return,
            res = intake.send(job) => if res.is_err() { return },
        }
    }
}

/// Periodic task wrapper: a failing invocation becomes the submission's first failure.
struct Escalate {
    inner: TaskRef,
    latch: Arc<FailureLatch>,
    signal: Arc<CancelSignal>,
    bus: Bus,
}

impl Task for Escalate {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
        let fut = self.inner.spawn(ctx);
        let name = self.inner.name().to_string();
        let latch = Arc::clone(&self.latch);
        let signal = Arc::clone(&self.signal);
        let bus = self.bus.clone();

        Box::pin(async move {
            let res = fut.await;
            if let Err(error) = &res {
                let first = error.is_failure()
                    && latch.record(RuntimeError::TickFailed {
                        task: name.clone(),
                        error: error.clone(),
                    });
                if first {
                    signal.fire(CancelCause::Failure);
                    bus.publish(
                        Event::new(EventKind::FailureLatched)
                            .with_task(name)
                            .with_reason(error.as_message()),
                    );
                }
            }
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time;

    use super::*;
    use crate::error::JobError;
    use crate::jobs::{ExecFn, SumTo, TaskFn, gauss};
    use crate::subscribers::Subscribe;

    fn summer(step_ms: u64) -> ExecutorRef {
        Arc::new(SumTo::new(Duration::from_millis(step_ms)))
    }

    /// Fails on input 5; each job sleeps `delay(input)` first.
    fn five_fails(delay: fn(i64) -> u64) -> ExecutorRef {
        ExecFn::arc("five_fails", move |n: i64| async move {
            time::sleep(Duration::from_millis(delay(n))).await;
            if n == 5 {
                return Err(JobError::fail("five is cursed"));
            }
            Ok(gauss(n))
        })
    }

    fn orchestrator(exec: ExecutorRef) -> Orchestrator {
        Orchestrator::builder(Config::default(), exec).build()
    }

    #[tokio::test(start_paused = true)]
    async fn sums_all_jobs() {
        let orch = orchestrator(summer(10));
        let outcome = orch.submit(Job::batch([1, 5, 10])).await.unwrap();

        assert_eq!(outcome.total, 71);
        assert_eq!(outcome.completed, 3);
        assert_eq!(outcome.dispatched, 3);
        assert!(outcome.is_complete());
        assert!(!outcome.stopped);
        assert_eq!(orch.state(), State::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_finishes_immediately() {
        let orch = orchestrator(summer(10));
        assert_eq!(orch.submit(Vec::new()).await.unwrap(), Outcome::default());
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_wins_when_it_finishes_last() {
        let orch = orchestrator(five_fails(|n| if n == 5 { 200 } else { n as u64 }));
        let err = orch.submit(Job::batch([1, 5, 10])).await.unwrap_err();

        assert_eq!(
            err,
            RuntimeError::JobFailed {
                job: Job::new(2, 5),
                error: JobError::fail("five is cursed"),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_wins_when_it_finishes_first() {
        let orch = orchestrator(five_fails(|n| if n == 5 { 1 } else { 100 }));
        let mut rx = orch.subscribe();
        let err = orch.submit(Job::batch([1, 5, 10])).await.unwrap_err();

        assert_eq!(err.job_error(), Some(&JobError::fail("five is cursed")));
        let discarded = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| e.kind == EventKind::ResultDiscarded)
            .count();
        assert_eq!(discarded, 2, "jobs 1 and 10 were in flight and their results dropped");
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_job_is_a_failure() {
        let exec: ExecutorRef = ExecFn::arc("panics", |n: i64| async move {
            if n == 3 {
                panic!("three");
            }
            Ok::<_, JobError>(n)
        });
        let err = orchestrator(exec)
            .submit(Job::batch([1, 2, 3]))
            .await
            .unwrap_err();
        assert_eq!(
            err.job_error(),
            Some(&JobError::Panicked {
                info: "three".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn executor_panicking_before_its_future_is_a_failure() {
        let exec: ExecutorRef = ExecFn::arc("eager", |n: i64| {
            if n == 5 {
                panic!("job five refused");
            }
            async move { Ok::<_, JobError>(gauss(n)) }
        });
        let err = orchestrator(exec)
            .submit(Job::batch([1, 5, 10]))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RuntimeError::JobFailed {
                job: Job::new(2, 5),
                error: JobError::Panicked {
                    info: "job five refused".into()
                },
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn external_stop_keeps_finished_and_in_flight_work() {
        let cfg = Config {
            max_concurrent: 2,
            ..Config::default()
        };
        let orch = Orchestrator::builder(cfg, summer(10)).build();
        orch.stop_handle().stop_after(Duration::from_millis(30));

        let outcome = orch.submit(Job::batch([1, 5, 10, 20])).await.unwrap();

        assert!(outcome.stopped);
        assert_eq!(outcome.total, 1 + 15 + 55);
        assert_eq!(outcome.completed, 3);
        assert_eq!(outcome.dispatched, 3);
        assert_eq!(outcome.discarded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_repeatedly_and_concurrently_is_safe() {
        let orch = orchestrator(summer(10));
        let stop = orch.stop_handle();
        let mut rx = orch.subscribe();

        let stoppers: Vec<_> = (0..8)
            .map(|_| {
                let stop = stop.clone();
                tokio::spawn(async move {
                    time::sleep(Duration::from_millis(25)).await;
                    stop.stop();
                    stop.stop();
                })
            })
            .collect();

        let outcome = orch.submit(Job::batch([1, 5, 10])).await.unwrap();
        for s in stoppers {
            s.await.unwrap();
        }

        assert!(!outcome.stopped, "every job was already running");
        assert_eq!(outcome.total, 71);
        let requests = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| e.kind == EventKind::StopRequested)
            .count();
        assert_eq!(requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_after_last_dispatch_is_not_reported_as_stopped() {
        let cfg = Config {
            max_concurrent: 1,
            ..Config::default()
        };
        let orch = Orchestrator::builder(cfg, summer(10)).build();
        orch.stop_handle().stop_after(Duration::from_millis(25));

        // job 2 starts at 10ms, the last one before the stop at 25ms
        let outcome = orch.submit(Job::batch([1, 3])).await.unwrap();
        assert_eq!(outcome.total, 1 + 6);
        assert_eq!(outcome.discarded, 0);
        assert!(!outcome.stopped);
        assert!(orch.stop_handle().is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_submit_discards_everything() {
        let orch = orchestrator(summer(10));
        orch.stop_handle().stop();

        let outcome = orch.submit(Job::batch([1, 5, 10])).await.unwrap();
        assert!(outcome.stopped);
        assert_eq!(outcome.dispatched, 0);
        assert_eq!(outcome.discarded, 3);
        assert_eq!(outcome.total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_is_rejected() {
        let orch = orchestrator(summer(0));
        orch.submit(Job::batch([1])).await.unwrap();
        assert_eq!(
            orch.submit(Job::batch([1])).await,
            Err(RuntimeError::AlreadySubmitted)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn state_passes_through_draining() {
        let orch = orchestrator(summer(10));
        let mut states = orch.watch_state();
        let seen = tokio::spawn(async move {
            let mut seen = vec![*states.borrow_and_update()];
            while states.changed().await.is_ok() {
                let s = *states.borrow_and_update();
                seen.push(s);
                if s == State::Done {
                    break;
                }
            }
            seen
        });
        tokio::task::yield_now().await;

        orch.submit(Job::batch([3])).await.unwrap();
        assert_eq!(
            seen.await.unwrap(),
            vec![State::Idle, State::Running, State::Draining, State::Done]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_runs_alongside_and_stops_after_drain() {
        let clock = TaskFn::arc("clock", |_ctx: CancellationToken| async {
            Ok::<(), JobError>(())
        });
        let orch = Orchestrator::builder(Config::default(), summer(10))
            .with_trigger(Duration::from_millis(10), clock.clone())
            .build();

        let outcome = orch.submit(Job::batch([10])).await.unwrap();
        assert!((10..=12).contains(&outcome.ticks), "ticks = {}", outcome.ticks);
        assert_eq!(clock.invocations(), outcome.ticks);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(clock.invocations(), outcome.ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_tick_stops_the_submission() {
        let calls = Arc::new(AtomicU64::new(0));
        let tick: TaskRef = TaskFn::arc("timer", {
            let calls = calls.clone();
            move |_ctx: CancellationToken| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                        return Err(JobError::fail("timer generated error"));
                    }
                    Ok(())
                }
            }
        });
        let orch = Orchestrator::builder(Config::default(), summer(10))
            .with_trigger(Duration::from_millis(10), tick)
            .build();

        let err = orch.submit(Job::batch([10, 1])).await.unwrap_err();
        assert_eq!(
            err,
            RuntimeError::TickFailed {
                task: "timer".into(),
                error: JobError::fail("timer generated error"),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_runs_after_outcome() {
        let orch = orchestrator(summer(5));
        let mut rx = orch.subscribe();
        orch.stop_handle().stop_after(Duration::from_millis(20));

        orch.submit(Job::batch([2, 8, 30])).await.unwrap();
        let mut events: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.last().map(|e| e.kind), Some(EventKind::Drained));

        time::sleep(Duration::from_secs(5)).await;
        events.extend(std::iter::from_fn(|| rx.try_recv().ok()));
        assert_eq!(events.last().map(|e| e.kind), Some(EventKind::Drained));
    }

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

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_the_whole_submission() {
        let rec = Arc::new(Recorder::default());
        let orch = Orchestrator::builder(Config::default(), summer(1))
            .with_subscribers(vec![rec.clone()])
            .build();

        orch.submit(Job::batch([1, 2, 3])).await.unwrap();
        orch.shutdown().await;

        let kinds = rec.0.lock().unwrap().clone();
        assert_eq!(kinds.first(), Some(&EventKind::SubmitStarted));
        assert_eq!(kinds.last(), Some(&EventKind::Drained));
        let completed = kinds
            .iter()
            .filter(|k| **k == EventKind::JobCompleted)
            .count();
        assert_eq!(completed, 3);
        assert!(kinds.contains(&EventKind::DrainStarted));
    }
}
