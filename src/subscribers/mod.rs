//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for observing a submission: logging,
//! metrics, progress bars. Each subscriber is driven by a dedicated worker fed by
//! a bounded queue owned by the [`SubscriberSet`], so a slow subscriber never
//! slows down jobs or other subscribers.
//!
//! ## Architecture
//! ```text
//! job units / dispatcher / trigger ── publish ──► Bus ──► submission listener
//!                                                              │
//!                                                   SubscriberSet::emit(&Event)
//!                                                   ┌──────────┼──────────┐
//!                                                   ▼          ▼          ▼
//!                                               LogWriter   Metrics    Custom
//! ```

mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
