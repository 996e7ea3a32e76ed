//! # Supervisor: the bounded-retry restart state machine.
//!
//! The [`Supervisor`] owns the event bus and the subscriber set, and drives
//! launch attempts of one child process to a terminal [`RunOutcome`]. It
//! runs exactly one child at a time; there is no concurrent fan-out.
//!
//! ## High-level flow
//! ```text
//! Supervisor::run(spec)
//!   - spawn signal watcher: OS signal → CancellationToken::cancel
//!   - run_with_shutdown(spec, token):
//!       - spawn listener: Bus ─► SubscriberSet::emit  (single consumer)
//!       - publish SupervisorStarted
//!       - attempt loop:
//!           attempt += 1
//!           publish AttemptStarting{ attempt, budget }
//!           runner::run_attempt(spec)
//!             ├─ Completed   → CleanExit
//!             ├─ Interrupted → Interrupted        (runner killed the child)
//!             └─ Failed
//!                  ├─ budget left → publish RestartScheduled, cancellable sleep
//!                  └─ budget gone → publish RestartsExhausted → Exhausted
//!       - publish SupervisorFinished
//!       - drop bus sender → listener drains backlog → SubscriberSet::shutdown
//!         (every queued line reaches the log before run() returns)
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially**; the attempt counter is 1-based and
//!   never resets.
//! - Cancellation is observed at **safe points**: before a launch, during
//!   the child wait (inside the runner) and during the relaunch sleep.
//! - Exactly one `ShutdownRequested` is published per interrupted run, by
//!   whichever point observed the cancellation first.
//! - The child's exit code is the only thing ever inspected: 0 is clean,
//!   everything else draws from the restart budget.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::child::ChildSpec;
use crate::config::Config;
use crate::core::runner::{self, AttemptOutcome};
use crate::core::shutdown;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Terminal state of one supervisor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The child exited 0; supervision ended on purpose.
    CleanExit {
        /// Launches performed, including the successful one.
        attempts: u32,
    },
    /// The restart budget is spent; the operator must investigate.
    Exhausted {
        /// Launches performed.
        attempts: u32,
        /// Exit code of the final attempt, when the OS reported one.
        last_code: Option<i32>,
    },
    /// An operator-issued termination signal preempted the run.
    Interrupted {
        /// Launches performed before the interrupt.
        attempts: u32,
    },
}

impl RunOutcome {
    /// Process exit code for the supervisor binary.
    ///
    /// Clean child exit and interactive cancellation are both 0; an
    /// exhausted budget is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::CleanExit { .. } | RunOutcome::Interrupted { .. } => 0,
            RunOutcome::Exhausted { .. } => 1,
        }
    }

    /// Number of launches performed.
    pub fn attempts(&self) -> u32 {
        match self {
            RunOutcome::CleanExit { attempts }
            | RunOutcome::Exhausted { attempts, .. }
            | RunOutcome::Interrupted { attempts } => *attempts,
        }
    }
}

/// Drives launch attempts of one child process to a terminal outcome.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Supervisor {
    /// Creates a supervisor with the given config and subscribers.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            bus,
            subscribers,
        }
    }

    /// Bus handle, for attaching extra receivers before the run starts.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs the child under supervision until a terminal outcome, honoring
    /// OS termination signals.
    ///
    /// This consumes the supervisor: one run per instance, and when it
    /// returns every subscriber queue has been drained.
    pub async fn run(self, spec: ChildSpec) -> RunOutcome {
        let token = CancellationToken::new();

        let signal_token = token.clone();
        let watcher = tokio::spawn(async move {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(()) => signal_token.cancel(),
                Err(e) => tracing::error!(error = %e, "signal listener failed"),
            }
        });

        let outcome = self.run_with_shutdown(spec, token).await;
        watcher.abort();
        outcome
    }

    /// Runs the child under supervision with an externally owned
    /// cancellation token instead of OS signals.
    ///
    /// Useful for embedding the supervisor in a larger runtime (and for
    /// tests). Cancelling `token` has exactly the effect of an operator
    /// interrupt: the running child is killed through its handle, any
    /// pending relaunch sleep aborts, and the outcome is
    /// [`RunOutcome::Interrupted`].
    pub async fn run_with_shutdown(self, spec: ChildSpec, token: CancellationToken) -> RunOutcome {
        let Supervisor {
            cfg,
            bus,
            subscribers,
        } = self;

        let set = SubscriberSet::new(subscribers);
        let mut rx = bus.subscribe();
        let listener = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "event listener lagged");
                        continue;
                    }
                }
            }
            set.shutdown().await;
        });

        bus.publish(Event::now(EventKind::SupervisorStarted).with_reason(spec.display_name()));
        let outcome = attempt_loop(&cfg, &bus, &spec, &token).await;
        bus.publish(Event::now(EventKind::SupervisorFinished));

        // Last sender gone: the listener drains the backlog, shuts the
        // subscriber set down, and only then does run() return.
        drop(bus);
        let _ = listener.await;

        outcome
    }
}

/// The bounded retry loop.
async fn attempt_loop(
    cfg: &Config,
    bus: &Bus,
    spec: &ChildSpec,
    token: &CancellationToken,
) -> RunOutcome {
    let budget = cfg.budget;
    let mut attempt: u32 = 0;

    loop {
        if token.is_cancelled() {
            bus.publish(Event::now(EventKind::ShutdownRequested));
            return RunOutcome::Interrupted { attempts: attempt };
        }
        if !budget.allows(attempt + 1) {
            // Only reachable with a zero-attempt budget.
            bus.publish(Event::now(EventKind::RestartsExhausted).with_attempt(attempt));
            return RunOutcome::Exhausted {
                attempts: attempt,
                last_code: None,
            };
        }

        attempt += 1;
        bus.publish(
            Event::now(EventKind::AttemptStarting)
                .with_attempt(attempt)
                .with_budget(budget.max_attempts),
        );

        match runner::run_attempt(spec, token, attempt, bus).await {
            AttemptOutcome::Completed => {
                return RunOutcome::CleanExit { attempts: attempt };
            }
            AttemptOutcome::Interrupted => {
                return RunOutcome::Interrupted { attempts: attempt };
            }
            AttemptOutcome::Failed { code } => {
                if budget.is_last(attempt) {
                    bus.publish(Event::now(EventKind::RestartsExhausted).with_attempt(attempt));
                    return RunOutcome::Exhausted {
                        attempts: attempt,
                        last_code: code,
                    };
                }

                let delay = cfg.backoff.delay(attempt);
                bus.publish(
                    Event::now(EventKind::RestartScheduled)
                        .with_attempt(attempt)
                        .with_delay(delay),
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => {
                        bus.publish(Event::now(EventKind::ShutdownRequested));
                        return RunOutcome::Interrupted { attempts: attempt };
                    }
                }
            }
        }
    }
}
