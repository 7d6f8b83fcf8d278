//! File logging
//!
//! The terminal belongs to the UI, so log lines go to `ssepack.log` in the
//! platform data dir. `RUST_LOG` overrides the default `info` filter.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::APP_DIR;

pub const LOG_FILE: &str = "ssepack.log";

pub fn log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Appending writer for `path`, fed from a background thread
fn open_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok(non_blocking(file))
}

/// Install the global subscriber and return the log file path
///
/// Lines are written on a background thread. The returned guard flushes it
/// on drop, so hold it until the process exits.
pub fn init() -> Result<(PathBuf, WorkerGuard)> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let (writer, guard) = open_writer(&path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(env_filter());

    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok((path, guard))
}
