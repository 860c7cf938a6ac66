//! # Jobs, executors and periodic tasks.
//!
//! This module provides the job-related types:
//! - [`Job`] - a job descriptor (id + integer input)
//! - [`JobOutput`], [`JobFailure`], [`JobReport`] - what one execution produces
//! - [`Execute`] - trait for the caller-supplied job executor
//! - [`ExecFn`] - function-based executor, [`ExecutorRef`] - shared handle
//! - [`SumTo`] - built-in executor summing `1..=n` with a simulated work delay
//! - [`Task`] / [`TaskFn`] / [`TaskRef`] - periodic work driven by the trigger

mod exec_fn;
mod execute;
mod job;
mod sum;
mod task;
mod task_fn;

pub use exec_fn::ExecFn;
pub use execute::{BoxJobFuture, Execute, ExecutorRef};
pub use job::{Job, JobFailure, JobOutput, JobReport};
pub use sum::{SumTo, gauss};
pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
