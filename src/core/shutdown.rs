//! # External stop sources.
//!
//! Timeouts and OS signals are not built into the core: they are external
//! triggers that fire the same cancellation as [`StopHandle::stop`].
//!
//! ## Signals
//! **Unix:** `SIGINT` (Ctrl-C), `SIGTERM`, `SIGQUIT`.
//! **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`].

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::signal::StopHandle;

/// Waits for a termination signal.
///
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Err` if signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

impl StopHandle {
    /// Stops on the next termination signal.
    ///
    /// The watcher task exits as soon as cancellation fires for any cause, so it
    /// never outlives the submission. If signal registration fails the watcher
    /// logs and exits without stopping.
    pub fn stop_on_signal(&self) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = handle.stopped() => {}
                res = wait_for_shutdown_signal() => match res {
                    Ok(()) => handle.stop_with("signal"),
                    Err(e) => tracing::warn!(error = %e, "failed to register shutdown signals"),
                }
            }
        })
    }

    /// Stops once `after` elapses, unless cancellation fired earlier.
    pub fn stop_after(&self, after: Duration) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = handle.stopped() => {}
                _ = tokio::time::sleep(after) => handle.stop_with("timeout"),
            }
        })
    }
}
