use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::repo::sqlite;

fn default_log_path() -> Result<PathBuf> {
    Ok(sqlite::data_dir()?.join("tally.log"))
}

/// Opt-in file logging via `RUST_LOG`. The terminal belongs to the TUI, so
/// nothing is written to stdout/stderr. `log_file` falls back to the OS data
/// dir, which is only resolved once logging is actually enabled.
pub fn init(log_file: Option<PathBuf>) -> Result<()> {
    let raw = std::env::var("RUST_LOG").ok();
    let Some((filter, log_file)) = target(raw.as_deref(), log_file, default_log_path)? else {
        return Ok(());
    };
    install(filter, &log_file)
}

// `None` when logging is off; the default path is never touched in that case.
fn target(
    raw_filter: Option<&str>,
    log_file: Option<PathBuf>,
    default_path: impl FnOnce() -> Result<PathBuf>,
) -> Result<Option<(EnvFilter, PathBuf)>> {
    let Some(filter) = env_filter(raw_filter) else {
        return Ok(None);
    };
    let log_file = match log_file {
        Some(path) => path,
        None => default_path()?,
    };
    Ok(Some((filter, log_file)))
}

fn install(filter: EnvFilter, log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log dir {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_file.display(),
        "logging started"
    );
    Ok(())
}

// Empty, oversized or invalid filters disable logging instead of failing.
fn env_filter(raw: Option<&str>) -> Option<EnvFilter> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.len() > 4096 {
        return None;
    }
    EnvFilter::try_new(raw).ok()
}
