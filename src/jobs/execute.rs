//! # Executor abstraction.
//!
//! The executor is the caller-supplied computation: a function from job input to
//! either a result or a [`JobError`]. The runtime invokes it, never overrides it.
//!
//! Executors do **not** receive a cancellation token: once a job has started it
//! is allowed to finish, even after the submission was cancelled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::JobError;

/// Boxed future returned by [`Execute::execute`].
pub type BoxJobFuture = Pin<Box<dyn Future<Output = Result<i64, JobError>> + Send + 'static>>;

/// Shared handle to an executor.
pub type ExecutorRef = Arc<dyn Execute>;

/// # Job executor.
///
/// Each call creates a **new** future that owns everything it needs; the same
/// executor runs many jobs concurrently.
///
/// # Example
/// ```
/// use jobvisor::{BoxJobFuture, Execute, JobError};
///
/// struct Double;
///
/// impl Execute for Double {
///     fn name(&self) -> &str { "double" }
///
///     fn execute(&self, input: i64) -> BoxJobFuture {
///         Box::pin(async move {
///             input.checked_mul(2).ok_or_else(|| JobError::fail("overflow"))
///         })
///     }
/// }
/// ```
pub trait Execute: Send + Sync + 'static {
    /// Returns a stable, human-readable executor name.
    fn name(&self) -> &str;

    /// Creates the future computing the result for `input`.
    fn execute(&self, input: i64) -> BoxJobFuture;
}
