//! # Job descriptors and execution reports.
//!
//! A [`Job`] is created by the caller, consumed exactly once by the dispatcher
//! and turned into exactly one [`JobReport`]: either a [`JobOutput`] or a
//! [`JobFailure`].

use std::fmt;
use std::time::Duration;

use crate::error::JobError;

/// Job descriptor: a caller-chosen id and the integer input ("job size").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Job {
    /// Caller-chosen identifier, used in events and errors.
    pub id: u64,
    /// Input handed to the executor.
    pub input: i64,
}

impl Job {
    /// Creates a new job descriptor.
    pub fn new(id: u64, input: i64) -> Self {
        Self { id, input }
    }

    /// Builds one job per input, numbering ids from 1 in iteration order.
    ///
    /// # Example
    /// ```
    /// use jobvisor::Job;
    ///
    /// let jobs = Job::batch([1, 5, 10]);
    /// assert_eq!(jobs[1], Job::new(2, 5));
    /// ```
    pub fn batch(inputs: impl IntoIterator<Item = i64>) -> Vec<Job> {
        inputs
            .into_iter()
            .zip(1u64..)
            .map(|(input, id)| Job::new(id, input))
            .collect()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}({})", self.id, self.input)
    }
}

/// Successful execution of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobOutput {
    /// The job that produced this value.
    pub job: Job,
    /// Computed result.
    pub value: i64,
    /// Wall time spent in the executor.
    pub elapsed: Duration,
}

/// Failed execution of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobFailure {
    /// The job that failed.
    pub job: Job,
    /// Why it failed.
    pub error: JobError,
}

/// One item of the result stream.
pub type JobReport = Result<JobOutput, JobFailure>;
