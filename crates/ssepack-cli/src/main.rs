//! ssepack - terminal composer that streams each send to an HTTP endpoint

mod cli;
mod config;
mod logging;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::cli::Args;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (log_path, _log_guard) = logging::init()?;
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_args(&args);
    info!(
        log = %log_path.display(),
        base_url = %config.stream.base_url,
        path = %config.stream.path,
        mode = %config.stream.mode,
        "Starting ssepack"
    );

    let mut app = tui::App::new(config).context("Failed to set up the composer")?;
    app.run().await
}
