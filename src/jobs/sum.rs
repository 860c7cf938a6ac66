//! # Built-in summing executor.
//!
//! [`SumTo`] computes `1 + 2 + … + n`, sleeping `step` after every addend to
//! simulate work. [`gauss`] is the closed form, handy for checking results.

use std::sync::Arc;
use std::time::Duration;

use crate::error::JobError;
use crate::jobs::execute::{BoxJobFuture, Execute};

/// Closed form of `1 + 2 + … + n` (`0` for `n <= 0`).
///
/// # Example
/// ```
/// assert_eq!(jobvisor::gauss(10), 55);
/// assert_eq!(jobvisor::gauss(1) + jobvisor::gauss(5) + jobvisor::gauss(10), 71);
/// ```
pub fn gauss(n: i64) -> i64 {
    if n <= 0 { 0 } else { n * (n + 1) / 2 }
}

/// Executor summing `1..=input` with a per-addend delay.
///
/// Negative inputs fail with [`JobError::Fail`]; `0` sums to `0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SumTo {
    /// Simulated work delay per addend (`0` = no sleep).
    pub step: Duration,
}

impl SumTo {
    /// Creates the executor with the given per-addend delay.
    pub fn new(step: Duration) -> Self {
        Self { step }
    }

    /// Creates the executor and returns it as a shared handle.
    pub fn arc(step: Duration) -> Arc<Self> {
        Arc::new(Self::new(step))
    }
}

impl Execute for SumTo {
    fn name(&self) -> &str {
        "sum_to"
    }

    fn execute(&self, input: i64) -> BoxJobFuture {
        let step = self.step;
        Box::pin(async move {
            if input < 0 {
                return Err(JobError::fail(format!("negative job size {input}")));
            }
            let mut sum: i64 = 0;
            for i in 1..=input {
                sum = sum
                    .checked_add(i)
                    .ok_or_else(|| JobError::fail(format!("sum of first {input} overflows")))?;
                if !step.is_zero() {
                    tokio::time::sleep(step).await;
                }
            }
            Ok(sum)
        })
    }
}
