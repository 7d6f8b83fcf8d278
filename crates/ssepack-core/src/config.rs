//! Composer configuration

use serde::{Deserialize, Serialize};

use crate::picker::ANY_FILE;

/// Options recognized by the composer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub placeholder: String,
    /// Show the (inert) microphone button
    pub use_audio: bool,
    /// Show the clear button when there is something to clear
    pub use_clear: bool,
    /// MIME filter for the file picker, e.g. `image/*,.pdf`
    pub accept: String,
    pub multiple: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            placeholder: "Ask anything".to_string(),
            use_audio: false,
            use_clear: false,
            accept: ANY_FILE.to_string(),
            multiple: true,
        }
    }
}
