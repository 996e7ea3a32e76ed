//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the supervisor loop, the attempt
//! runner and the child's output readers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`OutputStream`] event classification and
//!   payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor`, `runner::run_attempt`, the per-attempt
//!   output readers.
//! - **Consumer**: the supervisor's listener task, which fans events out to
//!   the [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, OutputStream};
