//! # Function-backed executor (`ExecFn`)
//!
//! [`ExecFn`] wraps a closure `F: Fn(i64) -> Fut`, producing a fresh future per job.
//!
//! ## Example
//! ```rust
//! use jobvisor::{ExecFn, ExecutorRef, JobError};
//!
//! let square: ExecutorRef = ExecFn::arc("square", |n: i64| async move {
//!     Ok::<_, JobError>(n * n)
//! });
//! assert_eq!(square.name(), "square");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use crate::error::JobError;
use crate::jobs::execute::{BoxJobFuture, Execute};

/// Function-backed executor implementation.
#[derive(Debug)]
pub struct ExecFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ExecFn<F> {
    /// Creates a new function-backed executor.
    ///
    /// Prefer [`ExecFn::arc`] when you immediately need an [`ExecutorRef`](crate::ExecutorRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the executor and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Execute for ExecFn<F>
where
    F: Fn(i64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<i64, JobError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, input: i64) -> BoxJobFuture {
        Box::pin((self.f)(input))
    }
}
