//! Error types used by the trackvisor runtime.
//!
//! This module defines [`RuntimeError`], the fatal, non-retryable failures
//! that abort the supervisor before the restart loop starts: a missing
//! configuration template, an unreadable env file, an unopenable log sink.
//!
//! Child-process failures are deliberately **not** errors: the supervisor
//! never inspects the monitored program beyond its exit status, and a
//! non-zero exit is a counted event on the bus, not a `Result::Err`.

use std::path::PathBuf;
use thiserror::Error;

/// # Fatal supervisor setup failures.
///
/// Every variant is raised before the first launch attempt and maps to a
/// non-zero supervisor exit. None of them is retried.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Neither the runtime env file nor its template exists; no
    /// configuration can be assumed.
    #[error("no runtime env at {env:?} and no template at {template:?}")]
    MissingTemplate {
        /// Expected location of the runtime env file.
        env: PathBuf,
        /// Expected location of the template that would have seeded it.
        template: PathBuf,
    },

    /// Copying the template into place failed.
    #[error("failed to seed {env:?} from template {template:?}: {source}")]
    SeedEnv {
        /// Destination env file path.
        env: PathBuf,
        /// Source template path.
        template: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The runtime env file exists but could not be read.
    #[error("failed to read runtime env {path:?}: {source}")]
    ReadEnv {
        /// Env file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The log sink could not be opened for appending.
    #[error("failed to open log sink {path:?}: {source}")]
    OpenLog {
        /// Log file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use trackvisor::RuntimeError;
    ///
    /// let err = RuntimeError::MissingTemplate {
    ///     env: ".env".into(),
    ///     template: ".env.example".into(),
    /// };
    /// assert_eq!(err.as_label(), "missing_template");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::MissingTemplate { .. } => "missing_template",
            RuntimeError::SeedEnv { .. } => "seed_env",
            RuntimeError::ReadEnv { .. } => "read_env",
            RuntimeError::OpenLog { .. } => "open_log",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::MissingTemplate { env, template } => {
                format!(
                    "missing env file {} and template {}",
                    env.display(),
                    template.display()
                )
            }
            RuntimeError::SeedEnv { env, source, .. } => {
                format!("seeding {} failed: {source}", env.display())
            }
            RuntimeError::ReadEnv { path, source } => {
                format!("reading {} failed: {source}", path.display())
            }
            RuntimeError::OpenLog { path, source } => {
                format!("opening {} failed: {source}", path.display())
            }
        }
    }
}

impl RuntimeError {
    /// True when the failure happened while establishing configuration
    /// (as opposed to the log sink).
    pub fn is_bootstrap(&self) -> bool {
        !matches!(self, RuntimeError::OpenLog { .. })
    }
}
