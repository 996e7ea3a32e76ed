//! # Runtime events emitted by the supervisor and the attempt runner.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: launch attempts and their exits
//! - **Relay events**: child output lines streamed as they are produced
//! - **Terminal events**: shutdown request, exhausted budget, finish
//!
//! The [`Event`] struct carries metadata such as timestamps, attempt
//! numbers, exit codes and relayed output lines.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. The tee log is written in `seq` order per subscriber, so
//! the log file and the terminal always agree on relative order.
//!
//! ## Example
//! ```rust
//! use trackvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::ChildExited)
//!     .with_attempt(3)
//!     .with_exit_code(1);
//!
//! assert_eq!(ev.kind, EventKind::ChildExited);
//! assert_eq!(ev.attempt, Some(3));
//! assert_eq!(ev.exit_code, Some(1));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Supervisor is up; the restart loop is about to start.
    ///
    /// Sets:
    /// - `reason`: rendered command line of the supervised program
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SupervisorStarted,

    /// A launch attempt is starting.
    ///
    /// Sets:
    /// - `attempt`: attempt number (1-based)
    /// - `budget`: total attempts allowed
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    AttemptStarting,

    /// One line of child stdout/stderr, relayed as it was produced.
    ///
    /// Sets:
    /// - `line`: the output line (without trailing newline)
    /// - `stream`: which pipe it came from
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ChildOutput,

    /// The child exited (or never started).
    ///
    /// Sets:
    /// - `attempt`: attempt number
    /// - `exit_code`: exit status code when the OS reported one
    /// - `reason`: description for codeless exits (signal death, spawn
    ///   failure)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ChildExited,

    /// A relaunch is scheduled after a failed attempt.
    ///
    /// Sets:
    /// - `attempt`: the attempt that just failed
    /// - `delay_ms`: wait before the next launch (ms)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RestartScheduled,

    /// The restart budget is spent; the supervisor gives up.
    ///
    /// Sets:
    /// - `attempt`: the final attempt number
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RestartsExhausted,

    /// An operator-issued termination signal was observed.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownRequested,

    /// The restart loop reached a terminal state; last event of a run.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SupervisorFinished,
}

/// Which child pipe an output line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for log prefixes)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Launch attempt number (1-based).
    pub attempt: Option<u32>,
    /// Total attempts allowed by the budget.
    pub budget: Option<u32>,
    /// Relaunch delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Exit status code, when the OS reported one.
    pub exit_code: Option<i32>,
    /// Relayed child output line.
    pub line: Option<Arc<str>>,
    /// Pipe the output line came from.
    pub stream: Option<OutputStream>,
    /// Human-readable reason (spawn failures, signal deaths).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            budget: None,
            delay_ms: None,
            exit_code: None,
            line: None,
            stream: None,
            reason: None,
        }
    }

    /// Attaches a 1-based attempt number.
    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attaches the total attempt budget.
    #[inline]
    pub fn with_budget(mut self, budget: u32) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Attaches a relaunch delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an exit status code.
    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Attaches one relayed output line and its source pipe.
    #[inline]
    pub fn with_line(mut self, stream: OutputStream, line: impl Into<Arc<str>>) -> Self {
        self.stream = Some(stream);
        self.line = Some(line.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
