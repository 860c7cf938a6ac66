//! # Periodic trigger.
//!
//! Invokes a [`Task`](crate::Task) once immediately and then every `interval`
//! until cancellation fires.
//!
//! ```text
//! run(cancel)
//!   ├─► spawn task (tick 0)
//!   └─► loop (biased select)
//!         ├─ cancel.cancelled()  → stop scheduling
//!         ├─ inflight.join_next → reap (TickFailed on error/panic)
//!         └─ ticker.tick()       → spawn task (tick n)
//!   then wait for invocations still running, return number fired
//! ```
//!
//! ## Rules
//! - Invocations are **not** awaited between ticks: they may overlap
//! - Each invocation gets a child token of `cancel`
//! - Cancellation is checked before every tick (biased), so a cancel between the
//!   immediate invocation and the first tick prevents any further invocation
//! - Errors and panics of an invocation are reported, never retried

use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    core::panic_message,
    error::JobError,
    events::{Bus, Event, EventKind},
    jobs::TaskRef,
};

/// Smallest accepted interval.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Runs a task immediately and then on a fixed interval.
#[derive(Clone)]
pub struct PeriodicTrigger {
    task: TaskRef,
    interval: Duration,
    bus: Bus,
}

impl PeriodicTrigger {
    /// Creates a trigger; `interval` is clamped to at least 1ms.
    pub fn new(task: TaskRef, interval: Duration, bus: Bus) -> Self {
        Self {
            task,
            interval: interval.max(MIN_INTERVAL),
            bus,
        }
    }

    /// Effective interval between invocations.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Name of the driven task.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Drives the task until `cancel` fires; returns how many invocations were started.
    ///
    /// Returns only after every started invocation finished.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        let mut inflight = JoinSet::new();
        let mut fired: u64 = 0;
        self.fire(&mut inflight, &cancel, &mut fired);

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(res) = inflight.join_next(), if !inflight.is_empty() => self.reap(res),
                _ = ticker.tick() => self.fire(&mut inflight, &cancel, &mut fired),
            }
        }

        while let Some(res) = inflight.join_next().await {
            self.reap(res);
        }
        fired
    }

    fn fire(
        &self,
        inflight: &mut JoinSet<Result<(), JobError>>,
        cancel: &CancellationToken,
        fired: &mut u64,
    ) {
        self.bus.publish(
            Event::new(EventKind::TickFired)
                .with_task(self.task.name())
                .with_tick(*fired),
        );
        inflight.spawn(self.task.spawn(cancel.child_token()));
        *fired += 1;
    }

    fn reap(&self, res: Result<Result<(), JobError>, JoinError>) {
        let reason = match res {
            Ok(Ok(())) | Ok(Err(JobError::Canceled)) => return,
            Ok(Err(e)) => e.as_message(),
            Err(je) if je.is_panic() => {
                format!("panic: {}", panic_message(je.into_panic().as_ref()))
            }
            Err(_) => return,
        };
        self.bus.publish(
            Event::new(EventKind::TickFailed)
                .with_task(self.task.name())
                .with_reason(reason),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::jobs::TaskFn;

    fn counter(count: Arc<AtomicU64>) -> TaskRef {
        TaskFn::arc("counter", move |_ctx: CancellationToken| {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok::<(), JobError>(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_every_interval() {
        let count = Arc::new(AtomicU64::new(0));
        let trigger = PeriodicTrigger::new(counter(count.clone()), Duration::from_millis(10), Bus::new(64));
        let cancel = CancellationToken::new();

        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { trigger.run(cancel).await }
        });
        time::sleep(Duration::from_millis(105)).await;
        cancel.cancel();
        let fired = run.await.unwrap();

        let extra = fired - 1;
        assert!((9..=11).contains(&extra), "fired {fired} times");
        assert_eq!(count.load(Ordering::SeqCst), fired);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_tick_leaves_only_immediate_run() {
        let count = Arc::new(AtomicU64::new(0));
        let trigger = PeriodicTrigger::new(counter(count.clone()), Duration::from_millis(50), Bus::new(8));
        let cancel = CancellationToken::new();

        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { trigger.run(cancel).await }
        });
        time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        assert_eq!(run.await.unwrap(), 1);
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invocations_overlap_and_are_awaited_on_stop() {
        let running = Arc::new(AtomicU64::new(0));
        let peak = Arc::new(AtomicU64::new(0));
        let task: TaskRef = TaskFn::arc("slow", {
            let (running, peak) = (running.clone(), peak.clone());
            move |_ctx: CancellationToken| {
                let (running, peak) = (running.clone(), peak.clone());
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    time::sleep(Duration::from_millis(35)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), JobError>(())
                }
            }
        });
        let trigger = PeriodicTrigger::new(task, Duration::from_millis(10), Bus::new(64));
        let cancel = CancellationToken::new();

        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { trigger.run(cancel).await }
        });
        time::sleep(Duration::from_millis(55)).await;
        cancel.cancel();
        run.await.unwrap();

        assert!(peak.load(Ordering::SeqCst) >= 3);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_reported_not_retried() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let task: TaskRef = TaskFn::arc("flaky", |_ctx: CancellationToken| async move {
            Err::<(), _>(JobError::fail("clock skew"))
        });
        let trigger = PeriodicTrigger::new(task, Duration::from_millis(10), bus);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(trigger.run(cancel).await, 1);

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::TickFired, EventKind::TickFailed]);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let task: TaskRef = TaskFn::arc("noop", |_ctx: CancellationToken| async {
            Ok::<(), JobError>(())
        });
        let trigger = PeriodicTrigger::new(task, Duration::ZERO, Bus::new(1));
        assert_eq!(trigger.interval(), MIN_INTERVAL);
    }
}
