//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the orchestrator, the dispatch loop,
//! job runners, the periodic trigger and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator`, `Pipeline` dispatcher, `runner::run_job`,
//!   `PeriodicTrigger`, `StopHandle`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the orchestrator's per-submission listener (fans out to
//!   `SubscriberSet`) and any receiver obtained from `Orchestrator::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
