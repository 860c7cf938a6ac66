//! Closure-backed periodic task.
//!
//! The closure is called once per tick with that invocation's token and must hand
//! back a fresh future. Invocations can overlap, so anything the closure shares
//! between them has to be captured behind an `Arc`.
//!
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use jobvisor::{JobError, TaskFn, TaskRef};
//!
//! let heartbeat = TaskFn::arc("heartbeat", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(JobError::Canceled);
//!     }
//!     Ok(())
//! });
//! let t: TaskRef = heartbeat.clone();
//!
//! assert_eq!(t.name(), "heartbeat");
//! assert_eq!(heartbeat.invocations(), 0);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

use crate::error::JobError;
use crate::jobs::task::{BoxTaskFuture, Task};

/// [`Task`] built from a `Fn(CancellationToken) -> Future` closure.
pub struct TaskFn<F> {
    name: Arc<str>,
    invocations: AtomicU64,
    f: F,
}

impl<F> TaskFn<F> {
    pub fn new(name: impl Into<Arc<str>>, f: F) -> Self {
        Self {
            name: name.into(),
            invocations: AtomicU64::new(0),
            f,
        }
    }

    /// Like [`TaskFn::new`], already shared; coerces into a [`TaskRef`](crate::TaskRef).
    pub fn arc(name: impl Into<Arc<str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// How many futures this task has handed out so far.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn")
            .field("name", &self.name)
            .field("invocations", &self.invocations())
            .finish_non_exhaustive()
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        Box::pin((self.f)(ctx))
    }
}
