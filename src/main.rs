//! Trackvisor — keep the camera tracker alive.
//!
//! Main entry point for the CLI supervisor: resolves paths against its own
//! directory, bootstraps the tracker's env file, opens the tee log, and
//! runs the restart loop to completion.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trackvisor::{
    BackoffPolicy, ChildSpec, Config, RestartBudget, RuntimeEnv, Supervisor, TeeWriter,
};

/// Crash-resilient supervisor for the camera tracking sensor
#[derive(Parser, Debug)]
#[command(name = "trackvisor", version, about, long_about = None)]
struct Args {
    /// Interpreter or binary to launch
    #[arg(long, default_value = "python3")]
    program: String,

    /// Tracker entry script, resolved against the supervisor's directory
    #[arg(long, default_value = "main.py")]
    script: String,

    /// Runtime env file (seeded from the template when absent)
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Template used to seed a missing env file
    #[arg(long, default_value = ".env.example")]
    env_template: PathBuf,

    /// Append-only log capturing supervisor and tracker output
    #[arg(long, default_value = "tracker.log")]
    log_file: PathBuf,

    /// Maximum launch attempts before giving up
    #[arg(long, default_value_t = 10)]
    max_attempts: u32,

    /// Seconds to wait between failed attempts
    #[arg(long, default_value_t = 5)]
    delay_secs: u64,

    /// Enable verbose diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Extra arguments forwarded verbatim to the tracker on every launch
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout belongs to the tee log.
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("fatal: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let root = supervisor_root()?;
    let env_file = resolve(&root, &args.env_file);
    let template = resolve(&root, &args.env_template);
    let log_file = resolve(&root, &args.log_file);

    let tee = Arc::new(TeeWriter::open(&log_file)?);

    let env = match RuntimeEnv::bootstrap(&env_file, &template) {
        Ok(env) => env,
        Err(e) => {
            // Fatal bootstrap failures must reach the log as well.
            tee.write_status(SystemTime::now(), &format!("Fatal: {e}"));
            return Err(e.into());
        }
    };
    if env.was_seeded() {
        tee.write_status(
            SystemTime::now(),
            &format!(
                "Created {} from template {}",
                env_file.display(),
                template.display()
            ),
        );
    }
    info!(
        pairs = env.len(),
        source = %env.source().display(),
        "runtime env loaded"
    );

    let cfg = Config {
        budget: RestartBudget::new(args.max_attempts),
        backoff: BackoffPolicy::fixed(Duration::from_secs(args.delay_secs)),
        ..Config::default()
    };

    let spec = ChildSpec::new(&args.program, &root)
        .with_arg(resolve(&root, Path::new(&args.script)).display().to_string())
        .with_args(args.args.iter().cloned())
        .with_env(env.pairs().iter().cloned());

    let sup = Supervisor::new(cfg, vec![tee]);
    let outcome = sup.run(spec).await;
    info!(?outcome, "supervision ended");

    Ok(ExitCode::from(outcome.exit_code() as u8))
}

/// Directory containing the supervisor's own executable; keeps relative
/// paths stable regardless of the caller's current directory.
fn supervisor_root() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot resolve supervisor executable path")?;
    let root = exe
        .parent()
        .context("supervisor executable has no parent directory")?;
    Ok(root.to_path_buf())
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
