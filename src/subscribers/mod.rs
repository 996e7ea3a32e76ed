//! # Event subscribers for the trackvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and the built-in [`TeeWriter`] log sink.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   runner/supervisor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                    │
//!                                                      ┌─────────────┼──────────┐
//!                                                      ▼             ▼          ▼
//!                                                  TeeWriter      Metrics    Custom
//!                                               (stdout + file)
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use trackvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct CrashCounter;
//!
//! #[async_trait]
//! impl Subscribe for CrashCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::ChildExited && event.exit_code != Some(0) {
//!             // increment crash counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "crash-counter"
//!     }
//! }
//! ```

mod set;
mod subscribe;
mod tee;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;
pub use tee::TeeWriter;
