use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "JOBSCOUT_LOG";

pub enum LogTarget {
    Stderr,
    /// Used by the interactive browser so log lines don't land on screen.
    File(PathBuf),
}

/// `JOBSCOUT_LOG`, then `RUST_LOG`, then `-v` (debug) or the `warn` default.
fn build_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "jobscout=debug,info" } else { "warn" };
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn init(verbose: bool, target: LogTarget) -> Result<()> {
    let filter = build_filter(verbose);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match target {
        LogTarget::Stderr => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e)),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
        }
    }
}

pub fn default_log_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "jobscout")
        .map(|dirs| dirs.data_dir().join("jobscout.log"))
        .unwrap_or_else(|| PathBuf::from("jobscout.log"))
}
