//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ssepack_core::Method;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "ssepack",
    version,
    about = "Compose a message with attachments and start a streaming request"
)]
pub struct Args {
    /// Config file (defaults to <config dir>/ssepack/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL that stream paths are resolved against
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Stream endpoint path
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Initial request method
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// File selector filter, e.g. "image/*,.pdf"
    #[arg(long, value_name = "FILTER")]
    pub accept: Option<String>,

    #[arg(long)]
    pub placeholder: Option<String>,

    /// Show the clear button
    #[arg(long)]
    pub use_clear: bool,

    /// Show the microphone button
    #[arg(long)]
    pub use_audio: bool,

    /// Pick one file at a time
    #[arg(long)]
    pub single: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Get,
    Post,
}

impl From<Mode> for Method {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Get => Method::Get,
            Mode::Post => Method::Post,
        }
    }
}
