//! # TeeWriter — the operator-facing log sink.
//!
//! A subscriber that renders runtime events as human-readable status lines
//! and writes every line to **both** stdout and an append-only log file,
//! under one lock, so the terminal and the file always agree on content and
//! relative order.
//!
//! The file is opened in append mode when the writer is constructed and
//! held for the supervisor's whole lifetime; it survives child restarts and
//! accumulates across supervisor runs.
//!
//! Supervisor status lines carry a local-time prefix; child output lines
//! are relayed exactly as the tracker produced them.
//!
//! ## Example output
//! ```text
//! [2026-08-07 14:03:11] Supervising: python3 main.py
//! [2026-08-07 14:03:11] Attempt 1/10
//! ✓ Hand tracking enabled
//! Sending OSC to 127.0.0.1:8000
//! [2026-08-07 14:09:42] Program exited with code 1.
//! [2026-08-07 14:09:42] Restarting in 5s...
//! [2026-08-07 14:09:47] Attempt 2/10
//! ```

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::RuntimeError;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Tee log sink subscriber: stdout + append-only file.
pub struct TeeWriter {
    file: Mutex<File>,
}

impl TeeWriter {
    /// Opens (creating if needed) the log file for appending.
    pub fn open(path: &Path) -> Result<Self, RuntimeError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| RuntimeError::OpenLog {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one already-rendered line to both destinations.
    ///
    /// Used by the binary for out-of-band lines (fatal bootstrap errors
    /// that happen before the supervisor loop publishes events).
    pub fn write_line(&self, line: &str) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        println!("{line}");
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!(error = %e, "failed to append to log sink");
        }
    }

    /// Writes a timestamped status line.
    pub fn write_status(&self, at: SystemTime, message: &str) {
        self.write_line(&format!("[{}] {message}", stamp(at)));
    }

    /// Renders an event as a log line; `None` for events with no
    /// operator-facing representation.
    fn render(event: &Event) -> Option<String> {
        let line = match event.kind {
            EventKind::ChildOutput => return event.line.as_deref().map(str::to_string),
            EventKind::SupervisorStarted => match event.reason.as_deref() {
                Some(cmd) => format!("Supervising: {cmd}"),
                None => "Supervisor started.".to_string(),
            },
            EventKind::AttemptStarting => {
                let attempt = event.attempt.unwrap_or(0);
                match event.budget {
                    Some(budget) => format!("Attempt {attempt}/{budget}"),
                    None => format!("Attempt {attempt}"),
                }
            }
            EventKind::ChildExited => match (event.exit_code, event.reason.as_deref()) {
                (Some(0), _) => "Program exited normally.".to_string(),
                (Some(code), _) => format!("Program exited with code {code}."),
                (None, Some(reason)) => reason.to_string(),
                (None, None) => "Program exited abnormally.".to_string(),
            },
            EventKind::RestartScheduled => {
                let delay = Duration::from_millis(u64::from(event.delay_ms.unwrap_or(0)));
                format!("Restarting in {delay:?}...")
            }
            EventKind::RestartsExhausted => "Max restart attempts reached. Giving up.".to_string(),
            EventKind::ShutdownRequested => "Interrupt received, shutting down.".to_string(),
            EventKind::SupervisorFinished => "Supervisor finished.".to_string(),
        };
        Some(format!("[{}] {line}", stamp(event.at)))
    }
}

#[async_trait]
impl Subscribe for TeeWriter {
    async fn on_event(&self, event: &Event) {
        if let Some(line) = Self::render(event) {
            self.write_line(&line);
        }
    }

    fn name(&self) -> &'static str {
        "tee"
    }

    /// Large queue: dropping log lines requires a pathological backlog.
    fn queue_capacity(&self) -> usize {
        4096
    }
}

/// Local-time prefix for status lines.
fn stamp(at: SystemTime) -> String {
    let local: DateTime<Local> = at.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OutputStream;
    use tempfile::tempdir;

    #[test]
    fn child_output_is_relayed_verbatim() {
        let ev = Event::now(EventKind::ChildOutput).with_line(OutputStream::Stdout, "✓ ready");
        assert_eq!(TeeWriter::render(&ev).as_deref(), Some("✓ ready"));
    }

    #[test]
    fn attempt_line_shows_budget() {
        let ev = Event::now(EventKind::AttemptStarting)
            .with_attempt(2)
            .with_budget(10);
        let line = TeeWriter::render(&ev).expect("render");
        assert!(line.ends_with("Attempt 2/10"), "got: {line}");
    }

    #[test]
    fn clean_exit_renders_normal_line() {
        let ev = Event::now(EventKind::ChildExited).with_attempt(1).with_exit_code(0);
        let line = TeeWriter::render(&ev).expect("render");
        assert!(line.ends_with("Program exited normally."), "got: {line}");
    }

    #[test]
    fn crash_renders_exit_code() {
        let ev = Event::now(EventKind::ChildExited).with_attempt(1).with_exit_code(139);
        let line = TeeWriter::render(&ev).expect("render");
        assert!(line.ends_with("Program exited with code 139."), "got: {line}");
    }

    #[test]
    fn codeless_exit_uses_reason() {
        let ev = Event::now(EventKind::ChildExited)
            .with_attempt(1)
            .with_reason("Tracker terminated by signal.");
        let line = TeeWriter::render(&ev).expect("render");
        assert!(line.ends_with("Tracker terminated by signal."), "got: {line}");
    }

    #[test]
    fn giving_up_line_is_stable() {
        let ev = Event::now(EventKind::RestartsExhausted).with_attempt(10);
        let line = TeeWriter::render(&ev).expect("render");
        assert!(
            line.ends_with("Max restart attempts reached. Giving up."),
            "got: {line}"
        );
    }

    #[test]
    fn restart_line_shows_delay() {
        let ev = Event::now(EventKind::RestartScheduled)
            .with_attempt(1)
            .with_delay(Duration::from_secs(5));
        let line = TeeWriter::render(&ev).expect("render");
        assert!(line.ends_with("Restarting in 5s..."), "got: {line}");
    }

    #[tokio::test]
    async fn lines_land_in_the_file_in_order() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tracker.log");
        let tee = TeeWriter::open(&path).expect("open");

        tee.on_event(
            &Event::now(EventKind::AttemptStarting)
                .with_attempt(1)
                .with_budget(3),
        )
        .await;
        tee.on_event(&Event::now(EventKind::ChildOutput).with_line(OutputStream::Stdout, "hello"))
            .await;
        tee.on_event(&Event::now(EventKind::ChildExited).with_attempt(1).with_exit_code(1))
            .await;

        let body = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Attempt 1/3"));
        assert_eq!(lines[1], "hello");
        assert!(lines[2].ends_with("Program exited with code 1."));
    }

    #[tokio::test]
    async fn appends_across_reopens() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tracker.log");

        {
            let tee = TeeWriter::open(&path).expect("open");
            tee.write_line("first run");
        }
        {
            let tee = TeeWriter::open(&path).expect("reopen");
            tee.write_line("second run");
        }

        let body = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(body, "first run\nsecond run\n");
    }
}
