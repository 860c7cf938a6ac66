//! # Periodic task abstraction.
//!
//! A [`Task`] is the unit of work the [`PeriodicTrigger`](crate::PeriodicTrigger)
//! invokes on every tick. It receives a [`CancellationToken`] that fires when the
//! submission is cancelled, and should check it to stop cooperatively.
//!
//! Invocations may overlap: the trigger does not wait for one to finish before
//! starting the next, so implementations must be safe to run concurrently.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::JobError;

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), JobError>> + Send + 'static>>;

/// Shared handle to a periodic task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable periodic unit.
///
/// Returning `Err(JobError::Canceled)` is a graceful exit; any other error is a
/// failure that stops the submission it belongs to.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use jobvisor::{BoxTaskFuture, Task};
///
/// struct Heartbeat;
///
/// impl Task for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Ok(());
///             }
///             // report liveness...
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Creates a new future for one invocation.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
