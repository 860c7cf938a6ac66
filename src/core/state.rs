//! # Orchestrator lifecycle.
//!
//! ```text
//!   Idle ──submit──► Running ──dispatch stops──► Draining ──stream closed──► Done
//! ```
//!
//! Dispatch stops on cancellation (stop request or first failure) or when the
//! intake is exhausted. `Draining` is never skipped: `Done` is only reached once
//! every launched job has finished.

use tokio::sync::watch;

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// Constructed, nothing submitted yet.
    Idle,
    /// Jobs are being dispatched.
    Running,
    /// Dispatch stopped; waiting for in-flight jobs.
    Draining,
    /// All launched jobs finished and the result stream closed (terminal).
    Done,
}

/// Watch-backed state holder enforcing forward, single-step transitions.
#[derive(Debug)]
pub(crate) struct StateCell {
    tx: watch::Sender<State>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(State::Idle);
        Self { tx }
    }

    pub(crate) fn get(&self) -> State {
        *self.tx.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<State> {
        self.tx.subscribe()
    }

    /// Moves `from -> to` atomically. Returns `false` if the current state is not `from`.
    pub(crate) fn advance(&self, from: State, to: State) -> bool {
        debug_assert!(next(from) == Some(to), "illegal transition {from:?} -> {to:?}");
        self.tx.send_if_modified(|cur| {
            if *cur == from {
                *cur = to;
                true
            } else {
                false
            }
        })
    }
}

fn next(s: State) -> Option<State> {
    match s {
        State::Idle => Some(State::Running),
        State::Running => Some(State::Draining),
        State::Draining => Some(State::Done),
        State::Done => None,
    }
}
