//! # Concurrent summing jobs
//!
//! Demonstrates the happy path:
//! - A batch of jobs summing `1..=n` run concurrently
//! - Results are aggregated as they complete
//! - A clock task ticks every 100ms while the batch runs
//! - Ctrl-C stops dispatch cleanly (running jobs still finish)
//!
//! Run with: `RUST_LOG=info cargo run --example sum_jobs --features logging`

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobvisor::{Config, Job, LogWriter, Orchestrator, SumTo, TaskFn, TaskRef, gauss};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let clock: TaskRef = TaskFn::arc("clock", |_ctx: CancellationToken| async move {
        tracing::info!("tick");
        Ok(())
    });

    let inputs = [1, 5, 10];
    let orch = Orchestrator::builder(Config::default(), SumTo::arc(Duration::from_millis(100)))
        .with_subscribers(vec![Arc::new(LogWriter::new())])
        .with_trigger(Duration::from_millis(100), clock)
        .build();
    orch.stop_handle().stop_on_signal();

    let outcome = orch.submit(Job::batch(inputs)).await?;
    let expected: i64 = inputs.iter().map(|n| gauss(*n)).sum();
    println!(
        "total={} (expected {expected}) completed={} discarded={} ticks={} stopped={}",
        outcome.total, outcome.completed, outcome.discarded, outcome.ticks, outcome.stopped
    );

    orch.shutdown().await;
    Ok(())
}
