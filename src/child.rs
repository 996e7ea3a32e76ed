//! # Specification of the supervised child process.
//!
//! [`ChildSpec`] bundles everything one launch attempt needs: the program,
//! its arguments (base arguments plus verbatim pass-through arguments,
//! identical on every retry), the injected environment and the working
//! directory.
//!
//! The spec builds a fresh [`tokio::process::Command`] per attempt with:
//! - both output pipes captured (`Stdio::piped`) so the runner can stream
//!   them into the log as they are produced;
//! - stdin closed — the tracker is headless;
//! - `kill_on_drop` as a backstop so an aborted supervisor never leaks a
//!   running camera process;
//! - the environment applied via scoped `Command::env`, never by mutating
//!   the supervisor's own process environment.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

/// Describes the supervised program for launch.
#[derive(Clone, Debug)]
pub struct ChildSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: PathBuf,
}

impl ChildSpec {
    /// Creates a spec for `program`, to be launched with `cwd` as its
    /// working directory.
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// Appends one argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends arguments in order (used for both base and pass-through
    /// arguments; pass-through values are forwarded verbatim).
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends environment pairs the child will inherit.
    pub fn with_env<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env.extend(pairs);
        self
    }

    /// The program name/path.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The full argument list.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The injected environment pairs.
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// The child's working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Rendered command line, for status lines.
    pub fn display_name(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Builds the command for one launch attempt.
    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_accumulate_in_order() {
        let spec = ChildSpec::new("python3", "/opt/tracker")
            .with_arg("main.py")
            .with_args(["--headless", "--camera", "1"]);
        assert_eq!(spec.args(), ["main.py", "--headless", "--camera", "1"]);
    }

    #[test]
    fn env_pairs_are_kept() {
        let spec = ChildSpec::new("python3", ".").with_env([
            ("OSC_PORT".to_string(), "8000".to_string()),
            ("CAMERA_DEVICE".to_string(), "0".to_string()),
        ]);
        assert_eq!(spec.env().len(), 2);
        assert_eq!(spec.env()[0].0, "OSC_PORT");
    }

    #[test]
    fn display_name_renders_command_line() {
        let spec = ChildSpec::new("python3", ".").with_arg("main.py");
        assert_eq!(spec.display_name(), "python3 main.py");

        let bare = ChildSpec::new("tracker", ".");
        assert_eq!(bare.display_name(), "tracker");
    }
}
