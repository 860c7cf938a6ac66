//! # Driving a pipeline by hand
//!
//! Demonstrates the low-level building blocks without an orchestrator:
//! - Feed an [`Intake`](jobvisor::Intake) from a producer task
//! - Consume the [`ResultStream`](jobvisor::ResultStream) with `futures::StreamExt`
//! - Stop after 250ms: buffered jobs are discarded, running jobs finish
//!
//! Run with: `cargo run --example pipeline`

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use jobvisor::{
    Bus, CancelCause, CancelSignal, Config, FailureLatch, Job, Pipeline, PipelineParams, SumTo,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config {
        intake_capacity: 4,
        max_concurrent: 3,
        ..Config::default()
    };
    let signal = Arc::new(CancelSignal::new());
    let latch = Arc::new(FailureLatch::new());
    let bus = Bus::new(cfg.bus_capacity_clamped());

    let Pipeline {
        intake,
        results,
        dispatch,
    } = Pipeline::spawn(
        SumTo::arc(Duration::from_millis(20)),
        PipelineParams::for_batch(&cfg, 0),
        signal.clone(),
        latch.clone(),
        bus,
    );

    tokio::spawn(async move {
        for job in Job::batch(1..=20) {
            if intake.send(job).await.is_err() {
                println!("intake closed, producer stops");
                break;
            }
        }
    });

    let stopper = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        stopper.fire(CancelCause::External);
    });

    let mut results = results;
    while let Some(report) = results.next().await {
        match report {
            Ok(out) => println!("job {} -> {} in {:?}", out.job, out.value, out.elapsed),
            Err(failure) => println!("job {} failed: {}", failure.job, failure.error),
        }
    }

    let report = dispatch.join().await?;
    println!(
        "dispatched={} discarded={} interrupted={} failure={:?}",
        report.dispatched,
        report.discarded,
        report.interrupted,
        latch.take()
    );
    Ok(())
}
