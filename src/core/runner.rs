//! # Run a single job execution.
//!
//! Executes one [`Job`] with the caller's executor, an optional timeout and panic
//! capture, and publishes lifecycle events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:  JobStarted → execute() → Ok(v)      → JobCompleted
//! Failure:  JobStarted → execute() → Err(e)     → JobFailed
//! Panic:    JobStarted → execute() → panic      → JobFailed (Panicked)
//! Timeout:  JobStarted → limit exceeded         → TimeoutHit → JobFailed (Timeout)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `JobCompleted` or `JobFailed`
//! - A panic inside the executor becomes [`JobError::Panicked`], whether it happens
//!   in `execute()` itself or while the returned future is polled
//! - The execution is not cancellable: once started it runs to completion

use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant};

use crate::{
    core::panic_message,
    error::JobError,
    events::{Bus, Event, EventKind},
    jobs::{Execute, Job, JobFailure, JobOutput, JobReport},
};

/// Executes `job` once and returns its report.
pub async fn run_job<E: Execute + ?Sized>(
    exec: &E,
    job: Job,
    timeout: Option<Duration>,
    bus: &Bus,
) -> JobReport {
    bus.publish(Event::new(EventKind::JobStarted).with_job(&job));
    let started = Instant::now();

    // execute() itself may panic before handing out a future
    let fut = std::panic::AssertUnwindSafe(async { exec.execute(job.input).await })
        .catch_unwind();
    let res = match timeout {
        Some(dur) => match time::timeout(dur, fut).await {
            Ok(r) => r,
            Err(_elapsed) => {
                bus.publish(
                    Event::new(EventKind::TimeoutHit)
                        .with_job(&job)
                        .with_timeout(dur),
                );
                Ok(Err(JobError::Timeout { timeout: dur }))
            }
        },
        None => fut.await,
    };
    let res = res.unwrap_or_else(|panic| {
        Err(JobError::Panicked {
            info: panic_message(panic.as_ref()),
        })
    });

    let elapsed = started.elapsed();
    match res {
        Ok(value) => {
            bus.publish(
                Event::new(EventKind::JobCompleted)
                    .with_job(&job)
                    .with_value(value)
                    .with_elapsed(elapsed),
            );
            Ok(JobOutput {
                job,
                value,
                elapsed,
            })
        }
        Err(error) => {
            bus.publish(
                Event::new(EventKind::JobFailed)
                    .with_job(&job)
                    .with_reason(error.as_message())
                    .with_elapsed(elapsed),
            );
            Err(JobFailure { job, error })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{ExecFn, SumTo};

    #[tokio::test(start_paused = true)]
    async fn success_reports_value_and_events() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let job = Job::new(1, 10);

        let out = run_job(&SumTo::new(Duration::from_millis(1)), job, None, &bus)
            .await
            .unwrap();
        assert_eq!(out.value, 55);
        assert_eq!(out.elapsed, Duration::from_millis(10));

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::JobStarted);
        let done = rx.recv().await.unwrap();
        assert_eq!(done.kind, EventKind::JobCompleted);
        assert_eq!(done.value, Some(55));
    }

    #[tokio::test]
    async fn panic_becomes_failure() {
        let exec = ExecFn::new("explode", |n: i64| async move {
            if n == 5 {
                panic!("job five exploded");
            }
            Ok::<_, JobError>(n)
        });
        let bus = Bus::new(8);

        let failure = run_job(&exec, Job::new(2, 5), None, &bus).await.unwrap_err();
        assert_eq!(
            failure.error,
            JobError::Panicked {
                info: "job five exploded".into()
            }
        );
    }

    struct EagerPanic;

    impl Execute for EagerPanic {
        fn name(&self) -> &str {
            "eager_panic"
        }

        fn execute(&self, input: i64) -> crate::jobs::BoxJobFuture {
            if input == 5 {
                panic!("refused to build job {input}");
            }
            Box::pin(async move { Ok(input) })
        }
    }

    #[tokio::test]
    async fn panic_while_building_future_becomes_failure() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let failure = run_job(&EagerPanic, Job::new(2, 5), None, &bus)
            .await
            .unwrap_err();
        assert_eq!(
            failure.error,
            JobError::Panicked {
                info: "refused to build job 5".into()
            }
        );
        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::JobStarted, EventKind::JobFailed]);

        let ok = run_job(&EagerPanic, Job::new(1, 1), None, &bus).await.unwrap();
        assert_eq!(ok.value, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_publishes_timeout_then_failed() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let slow = SumTo::new(Duration::from_secs(1));

        let failure = run_job(&slow, Job::new(3, 10), Some(Duration::from_secs(2)), &bus)
            .await
            .unwrap_err();
        assert_eq!(failure.error.as_label(), "job_timeout");

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::JobStarted, EventKind::TimeoutHit, EventKind::JobFailed]
        );
    }
}
