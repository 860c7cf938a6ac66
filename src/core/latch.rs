//! # First-failure latch.
//!
//! A write-once cell: the first [`FailureLatch::record`] wins, every later call
//! is a silent no-op. The decision is taken under a mutex, so two racing
//! failures can never both win.

use std::sync::Mutex;

use crate::error::RuntimeError;

/// Write-once holder for the first failure of a submission.
#[derive(Debug, Default)]
pub struct FailureLatch {
    first: Mutex<Option<RuntimeError>>,
}

impl FailureLatch {
    /// Creates an empty latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `err` if no failure was recorded yet. Returns `true` if it won.
    pub fn record(&self, err: RuntimeError) -> bool {
        let mut first = self.first.lock().unwrap_or_else(|p| p.into_inner());
        if first.is_some() {
            return false;
        }
        *first = Some(err);
        true
    }

    /// Whether a failure was latched.
    pub fn is_set(&self) -> bool {
        self.first
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }

    /// Takes the latched failure out.
    pub fn take(&self) -> Option<RuntimeError> {
        self.first.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::JobError;
    use crate::jobs::Job;

    fn failed(id: u64) -> RuntimeError {
        RuntimeError::JobFailed {
            job: Job::new(id, id as i64),
            error: JobError::fail("boom"),
        }
    }

    #[test]
    fn first_record_wins() {
        let latch = FailureLatch::new();
        assert!(latch.record(failed(1)));
        assert!(!latch.record(failed(2)));
        assert_eq!(latch.take(), Some(failed(1)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_writers_have_one_winner() {
        let latch = Arc::new(FailureLatch::new());
        let handles: Vec<_> = (0..32)
            .map(|id| {
                let latch = latch.clone();
                tokio::spawn(async move { latch.record(failed(id)) })
            })
            .collect();

        let mut winners = 0;
        for h in handles {
            winners += h.await.unwrap() as usize;
        }
        assert_eq!(winners, 1);
        assert!(latch.is_set());
    }
}
