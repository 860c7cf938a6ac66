//! # Runtime configuration.
//!
//! Provides [`Config`], the settings shared by the orchestrator and its pipeline.
//!
//! ## Sentinel values
//! - `intake_capacity = 0` → sized to the submitted batch
//! - `max_concurrent = 0` → unlimited (no semaphore created)
//! - `job_timeout = 0s` → no timeout

use std::time::Duration;

/// Configuration for an orchestrator and its pipeline.
///
/// ## Field semantics
/// - `intake_capacity`: bounded intake buffer; producers wait when it is full
/// - `output_capacity`: bounded result stream buffer (min 1)
/// - `max_concurrent`: cap on jobs executing at the same time (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `job_timeout`: per-job execution limit (`0s` = none)
///
/// All fields are public; prefer the accessors over sprinkling sentinel checks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the intake buffer (`0` = batch size).
    pub intake_capacity: usize,

    /// Capacity of the result stream buffer.
    pub output_capacity: usize,

    /// Maximum number of jobs executing concurrently (`0` = unlimited).
    ///
    /// Waiting for a slot is a cancellable suspension point of the dispatcher.
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Receivers lagging behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Per-job timeout (`Duration::ZERO` = none).
    ///
    /// A job exceeding it fails with `JobError::Timeout`.
    pub job_timeout: Duration,
}

impl Config {
    /// Intake capacity for a batch of `batch` jobs (never 0).
    #[inline]
    pub fn intake_capacity_for(&self, batch: usize) -> usize {
        match self.intake_capacity {
            0 => batch.max(1),
            n => n,
        }
    }

    /// Result stream capacity clamped to a minimum of 1.
    #[inline]
    pub fn output_capacity_clamped(&self) -> usize {
        self.output_capacity.max(1)
    }

    /// Returns the concurrency limit as an `Option` (`None` = unlimited).
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the job timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        if self.job_timeout.is_zero() {
            None
        } else {
            Some(self.job_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `intake_capacity = 0` (batch size)
    /// - `output_capacity = 64`
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `job_timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            intake_capacity: 0,
            output_capacity: 64,
            max_concurrent: 0,
            bus_capacity: 1024,
            job_timeout: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_resolve() {
        let cfg = Config::default();
        assert_eq!(cfg.intake_capacity_for(3), 3);
        assert_eq!(cfg.intake_capacity_for(0), 1);
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.timeout(), None);

        let cfg = Config {
            intake_capacity: 2,
            output_capacity: 0,
            max_concurrent: 4,
            job_timeout: Duration::from_secs(1),
            ..Config::default()
        };
        assert_eq!(cfg.intake_capacity_for(100), 2);
        assert_eq!(cfg.output_capacity_clamped(), 1);
        assert_eq!(cfg.concurrency_limit(), Some(4));
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(1)));
    }
}
