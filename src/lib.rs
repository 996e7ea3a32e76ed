//! # trackvisor
//!
//! **Trackvisor** keeps a camera-tracking sensor process alive.
//!
//! It bootstraps the tracker's runtime environment from a file, launches the
//! tracker as a child process, tees the child's combined output into a
//! persistent log, and restarts the child after crashes within a bounded
//! budget. The crate is the supervision runtime; a thin CLI binary wires it
//! to the filesystem and the terminal.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐      ┌──────────────┐     ┌───────────────┐
//!     │  RuntimeEnv  │      │  ChildSpec   │     │    Config     │
//!     │ (.env pairs) │─────►│ program/args │     │ budget, delay │
//!     └──────────────┘      └──────┬───────┘     └───────┬───────┘
//!                                  ▼                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (restart state machine)                               │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to subscribers, e.g. TeeWriter)        │
//! │  - CancellationToken (OS signal → structured cancel)              │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!                      ┌──────────────────┐
//!                      │ runner (1 spawn) │── spawn ──► child process
//!                      │  stream + wait   │◄─ stdout/stderr lines
//!                      └────────┬─────────┘
//!                               │ publishes ChildOutput / ChildExited
//!                               ▼
//!                     Bus ──► listener ──► SubscriberSet ──► TeeWriter
//!                                                       (stdout + log file)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Supervisor::run(spec)
//!
//! loop {
//!   ├─► attempt += 1
//!   ├─► publish AttemptStarting{ attempt, budget }
//!   ├─► run_attempt(spec)
//!   │       │
//!   │       ├─ exit 0      ──► publish ChildExited{0}    ─► CleanExit
//!   │       ├─ exit n ≠ 0  ──► publish ChildExited{n}
//!   │       ├─ spawn error ──► publish ChildExited{reason}   (same bucket)
//!   │       └─ cancelled   ──► publish ShutdownRequested, kill child
//!   │                          ─► Interrupted
//!   │
//!   ├─ budget left? ──► publish RestartScheduled{delay}, sleep (cancellable)
//!   └─ budget gone  ──► publish RestartsExhausted ─► Exhausted
//! }
//!
//! On exit: publish SupervisorFinished, drain subscriber queues so every
//! line reaches the log before the process ends.
//! ```
//!
//! ## Features
//! | Area             | Description                                       | Key types                            |
//! |------------------|---------------------------------------------------|--------------------------------------|
//! | **Bootstrap**    | Seed and parse the tracker's env file.            | [`RuntimeEnv`]                       |
//! | **Child spec**   | Describe the supervised program (args, env, cwd). | [`ChildSpec`]                        |
//! | **Policies**     | Bound retries and space them out.                 | [`RestartBudget`], [`BackoffPolicy`] |
//! | **Supervision**  | Run the restart loop to a terminal outcome.       | [`Supervisor`], [`RunOutcome`]       |
//! | **Observability**| Subscribe to lifecycle events and child output.   | [`Subscribe`], [`TeeWriter`]         |
//! | **Errors**       | Fatal setup failures (bootstrap, log sink).       | [`RuntimeError`]                     |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use trackvisor::{ChildSpec, Config, Supervisor, TeeWriter};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tee = Arc::new(TeeWriter::open("tracker.log".as_ref())?);
//!
//!     let spec = ChildSpec::new("python3", ".")
//!         .with_arg("main.py")
//!         .with_env([("OSC_PORT".to_string(), "8000".to_string())]);
//!
//!     let sup = Supervisor::new(Config::default(), vec![tee]);
//!     let outcome = sup.run(spec).await;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

mod bootstrap;
mod child;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use bootstrap::RuntimeEnv;
pub use child::ChildSpec;
pub use config::Config;
pub use core::{RunOutcome, Supervisor};
pub use error::RuntimeError;
pub use events::{Bus, Event, EventKind, OutputStream};
pub use policies::{BackoffPolicy, RestartBudget};
pub use subscribers::{Subscribe, SubscriberSet, TeeWriter};
