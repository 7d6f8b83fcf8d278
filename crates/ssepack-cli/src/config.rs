//! Application configuration
//!
//! `<config dir>/ssepack/config.toml` with `[composer]` and `[stream]`
//! sections. Command-line flags win over file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ssepack_core::{ComposerConfig, Method};
use tracing::debug;

use crate::cli::Args;

pub const APP_DIR: &str = "ssepack";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub composer: ComposerConfig,
    pub stream: StreamConfig,
}

/// Where sends are streamed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub base_url: String,
    pub path: String,
    /// Method selected at startup
    pub mode: Method,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            path: "/api/stream".to_string(),
            mode: Method::Get,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit path (must exist) or the default location
    /// (missing means defaults)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(base_url) = &args.base_url {
            self.stream.base_url = base_url.clone();
        }
        if let Some(path) = &args.path {
            self.stream.path = path.clone();
        }
        if let Some(mode) = args.mode {
            self.stream.mode = mode.into();
        }
        if let Some(accept) = &args.accept {
            self.composer.accept = accept.clone();
        }
        if let Some(placeholder) = &args.placeholder {
            self.composer.placeholder = placeholder.clone();
        }
        // Flags can only switch features on
        self.composer.use_clear |= args.use_clear;
        self.composer.use_audio |= args.use_audio;
        if args.single {
            self.composer.multiple = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Mode;
    use std::io::Write;

    #[test]
    fn test_parse_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [composer]
            use_clear = true

            [stream]
            path = "/api/stream/mock"
            mode = "POST"
            "#,
        )
        .unwrap();
        assert!(config.composer.use_clear);
        assert_eq!(config.composer.placeholder, "Ask anything");
        assert_eq!(config.stream.path, "/api/stream/mock");
        assert_eq!(config.stream.mode, Method::Post);
        assert_eq!(config.stream.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stream]\nbase_url = \"http://example.com\"").unwrap();
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.stream.base_url, "http://example.com");
        assert_eq!(config.composer, ComposerConfig::default());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stream\npath = 1").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_args_override_file() {
        let mut config = AppConfig::default();
        config.composer.use_audio = true;
        let args = Args {
            path: Some("/other".to_string()),
            mode: Some(Mode::Post),
            accept: Some("image/*".to_string()),
            use_clear: true,
            single: true,
            ..Args::default()
        };
        config.apply_args(&args);

        assert_eq!(config.stream.path, "/other");
        assert_eq!(config.stream.mode, Method::Post);
        assert_eq!(config.composer.accept, "image/*");
        assert!(config.composer.use_clear);
        // Unset flag leaves the file value alone
        assert!(config.composer.use_audio);
        assert!(!config.composer.multiple);
    }
}
