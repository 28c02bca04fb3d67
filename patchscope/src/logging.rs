//! File logging.
//!
//! The terminal belongs to the UI, so `tracing` output goes to a daily-rolling
//! file through a non-blocking writer. The returned guard must stay alive until
//! shutdown or buffered lines are lost.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "PATCHSCOPE_LOG";

/// Installs the global subscriber writing to `dir/patchscope.log.<date>`.
///
/// # Errors
///
/// Fails if the log directory cannot be created or a subscriber is already set.
pub fn init(dir: &Path, default_filter: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, "patchscope.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;
    Ok(guard)
}
