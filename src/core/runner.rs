//! # Run a single launch attempt of the supervised child.
//!
//! Executes one attempt: spawn the child from its [`ChildSpec`], stream its
//! stdout/stderr onto the [`Bus`] line-by-line as they are produced, wait
//! for exit or cancellation, and classify the result.
//!
//! ## Event flow
//! ```text
//! Success:
//!   spawn → ...output... → exit 0        → publish ChildExited{0}
//!
//! Crash:
//!   spawn → ...output... → exit n / signal → publish ChildExited{n|reason}
//!
//! Launch failure:
//!   spawn error → publish ChildExited{reason}    (same bucket as a crash)
//!
//! Cancellation:
//!   token cancelled → publish ShutdownRequested → kill child (direct
//!   handle, reaped) → Interrupted
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** `ChildExited` per attempt, except
//!   when cancelled (then `ShutdownRequested` takes its place).
//! - Output is streamed live, never buffered until exit.
//! - Both reader tasks are joined before the attempt returns, so all child
//!   output precedes the exit-classification line on the bus.
//! - A spawn failure is indistinguishable from a crash to the caller: both
//!   are `Failed` and draw from the same restart budget.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::child::ChildSpec;
use crate::events::{Bus, Event, EventKind, OutputStream};

/// Result of one launch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptOutcome {
    /// The child exited 0.
    Completed,
    /// The child exited non-zero, died to a signal, or never started.
    Failed {
        /// Exit code when the OS reported one.
        code: Option<i32>,
    },
    /// Cancellation preempted the attempt; the child was killed and reaped.
    Interrupted,
}

/// Executes a single launch attempt of `spec`, publishing lifecycle events
/// and relayed output to `bus`.
///
/// ### Cancellation semantics
/// The wait on the child is a `select!` arm against `token`; on
/// cancellation the runner publishes `ShutdownRequested`, kills the child
/// through the handle it holds (no process-listing lookups), reaps it, and
/// returns [`AttemptOutcome::Interrupted`].
pub(crate) async fn run_attempt(
    spec: &ChildSpec,
    token: &CancellationToken,
    attempt: u32,
    bus: &Bus,
) -> AttemptOutcome {
    let mut child = match spec.command().spawn() {
        Ok(child) => child,
        Err(e) => {
            bus.publish(
                Event::now(EventKind::ChildExited)
                    .with_attempt(attempt)
                    .with_reason(format!("Failed to launch {}: {e}", spec.program())),
            );
            return AttemptOutcome::Failed { code: None };
        }
    };

    let readers = [
        spawn_line_reader(child.stdout.take(), OutputStream::Stdout, bus.clone()),
        spawn_line_reader(child.stderr.take(), OutputStream::Stderr, bus.clone()),
    ];

    let status = tokio::select! {
        status = child.wait() => status,
        _ = token.cancelled() => {
            bus.publish(Event::now(EventKind::ShutdownRequested));
            // kill() sends the signal and reaps the child.
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill child on shutdown");
            }
            join_readers(readers).await;
            return AttemptOutcome::Interrupted;
        }
    };

    // Drain all relayed output before the exit line.
    join_readers(readers).await;

    match status {
        Ok(status) if status.success() => {
            bus.publish(
                Event::now(EventKind::ChildExited)
                    .with_attempt(attempt)
                    .with_exit_code(0),
            );
            AttemptOutcome::Completed
        }
        Ok(status) => match status.code() {
            Some(code) => {
                bus.publish(
                    Event::now(EventKind::ChildExited)
                        .with_attempt(attempt)
                        .with_exit_code(code),
                );
                AttemptOutcome::Failed { code: Some(code) }
            }
            None => {
                bus.publish(
                    Event::now(EventKind::ChildExited)
                        .with_attempt(attempt)
                        .with_reason("Program terminated by signal."),
                );
                AttemptOutcome::Failed { code: None }
            }
        },
        Err(e) => {
            bus.publish(
                Event::now(EventKind::ChildExited)
                    .with_attempt(attempt)
                    .with_reason(format!("Failed to wait for program: {e}")),
            );
            AttemptOutcome::Failed { code: None }
        }
    }
}

/// Relays one pipe to the bus, line by line, until EOF.
fn spawn_line_reader<R>(pipe: Option<R>, stream: OutputStream, bus: Bus) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(pipe) = pipe else { return };
        let mut lines = BufReader::new(pipe).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    bus.publish(Event::now(EventKind::ChildOutput).with_line(stream, line));
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, ?stream, "child output read failed");
                    break;
                }
            }
        }
    })
}

async fn join_readers(readers: [JoinHandle<()>; 2]) {
    for handle in readers {
        let _ = handle.await;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> ChildSpec {
        ChildSpec::new("/bin/sh", ".").with_args(["-c", script])
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn clean_exit_completes() {
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();

        let outcome = run_attempt(&sh("exit 0"), &token, 1, &bus).await;

        assert_eq!(outcome, AttemptOutcome::Completed);
        let events = drain(&mut rx);
        let exited = events
            .iter()
            .find(|e| e.kind == EventKind::ChildExited)
            .expect("exit event");
        assert_eq!(exited.exit_code, Some(0));
    }

    #[tokio::test]
    async fn nonzero_exit_fails_with_code() {
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();

        let outcome = run_attempt(&sh("exit 7"), &token, 1, &bus).await;

        assert_eq!(outcome, AttemptOutcome::Failed { code: Some(7) });
        let events = drain(&mut rx);
        let exited = events
            .iter()
            .find(|e| e.kind == EventKind::ChildExited)
            .expect("exit event");
        assert_eq!(exited.exit_code, Some(7));
    }

    #[tokio::test]
    async fn output_is_relayed_before_exit_event() {
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();

        let outcome = run_attempt(&sh("echo one; echo two >&2; exit 0"), &token, 1, &bus).await;
        assert_eq!(outcome, AttemptOutcome::Completed);

        let events = drain(&mut rx);
        let exit_seq = events
            .iter()
            .find(|e| e.kind == EventKind::ChildExited)
            .expect("exit event")
            .seq;
        let lines: Vec<_> = events
            .iter()
            .filter(|e| e.kind == EventKind::ChildOutput)
            .collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|e| e.seq < exit_seq));
        assert!(lines
            .iter()
            .any(|e| e.line.as_deref() == Some("one") && e.stream == Some(OutputStream::Stdout)));
        assert!(lines
            .iter()
            .any(|e| e.line.as_deref() == Some("two") && e.stream == Some(OutputStream::Stderr)));
    }

    #[tokio::test]
    async fn spawn_failure_counts_as_failed() {
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();
        let spec = ChildSpec::new("/nonexistent/tracker-binary", ".");

        let outcome = run_attempt(&spec, &token, 1, &bus).await;

        assert_eq!(outcome, AttemptOutcome::Failed { code: None });
        let events = drain(&mut rx);
        let exited = events
            .iter()
            .find(|e| e.kind == EventKind::ChildExited)
            .expect("exit event");
        assert!(exited
            .reason
            .as_deref()
            .expect("reason")
            .starts_with("Failed to launch"));
    }

    #[tokio::test]
    async fn cancellation_kills_the_child_promptly() {
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let started = tokio::time::Instant::now();
        let outcome = run_attempt(&sh("sleep 30"), &token, 1, &bus).await;

        assert_eq!(outcome, AttemptOutcome::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(5));
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| e.kind == EventKind::ShutdownRequested));
    }
}
