//! Per-run log files.
//!
//! Every command writes its tracing events to a file under the log
//! directory, e.g. `log/migration-<src>-<tgt>-<ts>.log`. Terminal output is
//! mirrored into the same file by `TerminalOutput`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::migration::bundle::FILE_TIMESTAMP_FORMAT;

const DEFAULT_FILTER: &str = "info";

/// `<dir>/<prefix>-<part>-...-<ts>.log`
pub fn log_file_path(dir: &Path, prefix: &str, parts: &[&str], at: DateTime<Utc>) -> PathBuf {
    let mut name = String::from(prefix);
    for part in parts {
        name.push('-');
        name.push_str(part);
    }
    name.push('-');
    name.push_str(&at.format(FILE_TIMESTAMP_FORMAT).to_string());
    name.push_str(".log");
    dir.join(name)
}

/// Install the global subscriber writing to `path`.
///
/// The returned guard flushes buffered events on drop and must be held
/// until the command finishes.
pub fn init(path: &Path) -> Result<WorkerGuard> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {:?}", path))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(path = %path.display(), "Logging initialized");
    Ok(guard)
}
