//! # Runtime environment bootstrap.
//!
//! The tracker reads every setting — camera device, OSC destinations,
//! detection toggles — from inherited environment variables. [`RuntimeEnv`]
//! establishes that environment from a line-oriented `KEY=VALUE` file:
//!
//! 1. If the env file is missing, it is seeded by copying the template
//!    shipped next to the supervisor (a single byte-preserving copy).
//! 2. If the template is missing too, bootstrap fails; no configuration can
//!    be assumed and the supervisor must not launch anything.
//! 3. The file is parsed once; the resulting pairs are immutable for the
//!    supervisor's lifetime and are injected into every child launch via
//!    scoped [`Command::env`](tokio::process::Command::env) — the
//!    supervisor's own process environment is never mutated.
//!
//! ## File format
//! - One `KEY=VALUE` pair per line; the first `=` splits key from value.
//! - Lines containing the `#` marker are ignored entirely (the format does
//!   not support inline comments in values).
//! - Blank lines and lines without `=` are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RuntimeError;

/// Immutable key/value environment for the supervised tracker.
#[derive(Clone, Debug)]
pub struct RuntimeEnv {
    pairs: Vec<(String, String)>,
    source: PathBuf,
    seeded: bool,
}

impl RuntimeEnv {
    /// Establishes the runtime env file and parses it.
    ///
    /// Seeds `env_file` from `template` when absent. Fails with
    /// [`RuntimeError::MissingTemplate`] when neither exists — a fatal,
    /// non-retryable condition.
    pub fn bootstrap(env_file: &Path, template: &Path) -> Result<Self, RuntimeError> {
        let mut seeded = false;

        if !env_file.exists() {
            if !template.exists() {
                return Err(RuntimeError::MissingTemplate {
                    env: env_file.to_path_buf(),
                    template: template.to_path_buf(),
                });
            }
            fs::copy(template, env_file).map_err(|source| RuntimeError::SeedEnv {
                env: env_file.to_path_buf(),
                template: template.to_path_buf(),
                source,
            })?;
            tracing::info!(
                env = %env_file.display(),
                template = %template.display(),
                "seeded runtime env from template"
            );
            seeded = true;
        }

        let text = fs::read_to_string(env_file).map_err(|source| RuntimeError::ReadEnv {
            path: env_file.to_path_buf(),
            source,
        })?;

        Ok(Self {
            pairs: parse(&text),
            source: env_file.to_path_buf(),
            seeded,
        })
    }

    /// The parsed `KEY=VALUE` pairs, in file order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Looks up a value by key (last occurrence wins on duplicates).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path the environment was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// True when the env file did not exist and was copied from the
    /// template during this bootstrap.
    pub fn was_seeded(&self) -> bool {
        self.seeded
    }

    /// Number of parsed pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pairs were parsed.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Parses line-oriented `KEY=VALUE` text.
fn parse(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in text.lines() {
        if line.contains('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        pairs.push((key.to_string(), value.trim().to_string()));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_pairs_in_order() {
        let pairs = parse("CAMERA_DEVICE=0\nOSC_HOST=127.0.0.1\nOSC_PORT=8000\n");
        assert_eq!(
            pairs,
            vec![
                ("CAMERA_DEVICE".to_string(), "0".to_string()),
                ("OSC_HOST".to_string(), "127.0.0.1".to_string()),
                ("OSC_PORT".to_string(), "8000".to_string()),
            ]
        );
    }

    #[test]
    fn skips_comment_lines_entirely() {
        let pairs = parse("# camera settings\nCAMERA_DEVICE=0\nOSC_PORT=8000 # default\n");
        // The inline-marker line is dropped too; the format has no inline comments.
        assert_eq!(pairs, vec![("CAMERA_DEVICE".to_string(), "0".to_string())]);
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let pairs = parse("\n\nnot a pair\n=novalue\nKEY=ok\n");
        assert_eq!(pairs, vec![("KEY".to_string(), "ok".to_string())]);
    }

    #[test]
    fn value_may_contain_equals() {
        let pairs = parse("OSC_ROUTE=/tracker/hand=left\n");
        assert_eq!(
            pairs,
            vec![("OSC_ROUTE".to_string(), "/tracker/hand=left".to_string())]
        );
    }

    #[test]
    fn whitespace_is_trimmed() {
        let pairs = parse("  ENABLE_HANDS = true \n");
        assert_eq!(pairs, vec![("ENABLE_HANDS".to_string(), "true".to_string())]);
    }

    #[test]
    fn last_duplicate_wins_on_lookup() {
        let text = "KEY=first\nKEY=second\n";
        let env = RuntimeEnv {
            pairs: parse(text),
            source: PathBuf::from(".env"),
            seeded: false,
        };
        assert_eq!(env.get("KEY"), Some("second"));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn seeds_byte_identical_copy_when_env_missing() {
        let dir = tempdir().expect("tempdir");
        let template = dir.path().join(".env.example");
        let env_file = dir.path().join(".env");
        let body = "# template\nCAMERA_DEVICE=0\nOSC_PORT=8000\n";
        fs::write(&template, body).expect("write template");

        let env = RuntimeEnv::bootstrap(&env_file, &template).expect("bootstrap");

        assert!(env.was_seeded());
        assert_eq!(fs::read(&env_file).expect("read env"), body.as_bytes());
        assert_eq!(env.get("OSC_PORT"), Some("8000"));
    }

    #[test]
    fn existing_env_is_not_overwritten() {
        let dir = tempdir().expect("tempdir");
        let template = dir.path().join(".env.example");
        let env_file = dir.path().join(".env");
        fs::write(&template, "OSC_PORT=8000\n").expect("write template");
        fs::write(&env_file, "OSC_PORT=9999\n").expect("write env");

        let env = RuntimeEnv::bootstrap(&env_file, &template).expect("bootstrap");

        assert!(!env.was_seeded());
        assert_eq!(env.get("OSC_PORT"), Some("9999"));
    }

    #[test]
    fn missing_template_is_fatal() {
        let dir = tempdir().expect("tempdir");
        let err = RuntimeEnv::bootstrap(&dir.path().join(".env"), &dir.path().join(".env.example"))
            .expect_err("must fail");
        assert_eq!(err.as_label(), "missing_template");
    }

    #[test]
    fn template_works_without_env_even_on_second_boot() {
        let dir = tempdir().expect("tempdir");
        let template = dir.path().join(".env.example");
        let env_file = dir.path().join(".env");
        fs::write(&template, "KEY=v\n").expect("write template");

        let first = RuntimeEnv::bootstrap(&env_file, &template).expect("first");
        assert!(first.was_seeded());

        let second = RuntimeEnv::bootstrap(&env_file, &template).expect("second");
        assert!(!second.was_seeded());
    }
}
