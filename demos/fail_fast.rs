//! # First failure wins
//!
//! Demonstrates cancellation on failure:
//! - Job `5` fails after 50ms
//! - The failure is latched and dispatch stops immediately
//! - Jobs already running finish; their results are discarded
//! - A periodic task failing on its third run would stop the batch the same way
//!
//! Run with: `cargo run --example fail_fast --features logging`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobvisor::{
    Config, ExecFn, ExecutorRef, Job, JobError, LogWriter, Orchestrator, TaskFn, TaskRef, gauss,
};

fn flaky() -> ExecutorRef {
    ExecFn::arc("flaky", |n: i64| async move {
        tokio::time::sleep(Duration::from_millis(10 * n as u64)).await;
        if n == 5 {
            return Err(JobError::fail("five is cursed"));
        }
        Ok(gauss(n))
    })
}

fn timer() -> TaskRef {
    let calls = Arc::new(AtomicU64::new(0));
    TaskFn::arc("timer", move |_ctx: CancellationToken| {
        let calls = calls.clone();
        async move {
            if calls.fetch_add(1, Ordering::Relaxed) + 1 == 3 {
                return Err(JobError::fail("timer generated error"));
            }
            Ok(())
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config {
        max_concurrent: 2,
        ..Config::default()
    };

    let orch = Orchestrator::builder(cfg.clone(), flaky())
        .with_subscribers(vec![Arc::new(LogWriter::new())])
        .build();
    match orch.submit(Job::batch([1, 5, 10, 20])).await {
        Ok(outcome) => println!("unexpected success: {outcome:?}"),
        Err(e) => println!("job batch failed ({}): {e}", e.as_label()),
    }
    orch.shutdown().await;

    let orch = Orchestrator::builder(cfg, flaky())
        .with_subscribers(vec![Arc::new(LogWriter::new())])
        .with_trigger(Duration::from_millis(10), timer())
        .build();
    match orch.submit(Job::batch([10, 20])).await {
        Ok(outcome) => println!("unexpected success: {outcome:?}"),
        Err(e) => println!("timer batch failed ({}): {e}", e.as_label()),
    }
    orch.shutdown().await;
}
