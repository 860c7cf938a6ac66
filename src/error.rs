//! Error types used by the jobvisor runtime and jobs.
//!
//! This module defines three enums:
//!
//! - [`JobError`]: a single job (or tick) execution failed. Failures are data: they are
//!   reported, latched and surfaced, never raised as panics.
//! - [`RuntimeError`]: the error half of a submission outcome, plus orchestration misuse.
//! - [`SubmitError`]: pushing into a pipeline intake failed.
//!
//! All of them provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::jobs::Job;

/// # Errors produced by job execution.
///
/// Returned by an [`Execute`](crate::Execute) implementation or a periodic
/// [`Task`](crate::Task), or synthesized by the runner (timeout, panic).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The computation failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The execution exceeded the configured job timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The computation panicked; the panic was captured by the runner.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The work observed cancellation and stopped early (graceful, not a failure).
    #[error("context cancelled")]
    Canceled,
}

impl JobError {
    /// Shorthand for [`JobError::Fail`].
    ///
    /// # Example
    /// ```
    /// use jobvisor::JobError;
    ///
    /// let err = JobError::fail("boom");
    /// assert_eq!(err.to_string(), "execution failed: boom");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        JobError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::JobError;
    /// use std::time::Duration;
    ///
    /// let err = JobError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "job_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Fail { .. } => "job_failed",
            JobError::Timeout { .. } => "job_timeout",
            JobError::Panicked { .. } => "job_panicked",
            JobError::Canceled => "job_canceled",
        }
    }

    /// Returns a human-readable message with error details.
    pub fn as_message(&self) -> String {
        match self {
            JobError::Fail { error } => format!("error: {error}"),
            JobError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            JobError::Panicked { info } => format!("panic: {info}"),
            JobError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Whether this error counts as a failure (everything except [`JobError::Canceled`]).
    pub fn is_failure(&self) -> bool {
        !matches!(self, JobError::Canceled)
    }
}

/// # Errors produced by the orchestration runtime.
///
/// [`RuntimeError::JobFailed`] and [`RuntimeError::TickFailed`] carry the first
/// failure of a submission (first-failure-wins); the others report misuse or an
/// internal fault.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The first job failure of the submission.
    #[error("job {job} failed: {error}")]
    JobFailed {
        /// The job that failed.
        job: Job,
        /// Why it failed.
        error: JobError,
    },

    /// The periodic task failed and stopped the submission.
    #[error("periodic task {task:?} failed: {error}")]
    TickFailed {
        /// Name of the periodic task.
        task: String,
        /// Why it failed.
        error: JobError,
    },

    /// `submit` was called on an orchestrator that already ran.
    #[error("orchestrator already submitted")]
    AlreadySubmitted,

    /// The dispatch loop terminated abnormally.
    #[error("dispatcher lost: {reason}")]
    DispatcherLost {
        /// Join error rendered as text.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::AlreadySubmitted.as_label(), "runtime_already_submitted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::JobFailed { .. } => "runtime_job_failed",
            RuntimeError::TickFailed { .. } => "runtime_tick_failed",
            RuntimeError::AlreadySubmitted => "runtime_already_submitted",
            RuntimeError::DispatcherLost { .. } => "runtime_dispatcher_lost",
        }
    }

    /// Returns a human-readable message with error details.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::JobFailed { job, error } => format!("job {job}: {}", error.as_message()),
            RuntimeError::TickFailed { task, error } => {
                format!("tick {task}: {}", error.as_message())
            }
            RuntimeError::AlreadySubmitted => "already submitted".to_string(),
            RuntimeError::DispatcherLost { reason } => format!("dispatcher lost: {reason}"),
        }
    }

    /// Returns the underlying job error, if this is an execution failure.
    pub fn job_error(&self) -> Option<&JobError> {
        match self {
            RuntimeError::JobFailed { error, .. } | RuntimeError::TickFailed { error, .. } => {
                Some(error)
            }
            _ => None,
        }
    }
}

/// Error returned when pushing a job into an [`Intake`](crate::Intake).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Intake buffer is full (try again later or use async `send`).
    #[error("intake full")]
    Full,

    /// The dispatcher stopped accepting jobs (cancelled or finished).
    #[error("intake closed")]
    Closed,
}
