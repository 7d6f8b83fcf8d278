//! File picker invocation and accept filters

use crate::attachment::Attachment;

pub const ANY_FILE: &str = "*/*";
pub const IMAGE_ONLY: &str = "image/*";

/// Entries of the "add attachment" popover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerChoice {
    /// Uses the composer's configured filter
    AnyFile,
    /// Forces an image filter regardless of configuration
    ImageOnly,
}

impl PickerChoice {
    pub fn accept(&self, configured: &str) -> String {
        match self {
            PickerChoice::AnyFile => configured.to_string(),
            PickerChoice::ImageOnly => IMAGE_ONLY.to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PickerChoice::AnyFile => "Upload file",
            PickerChoice::ImageOnly => "Upload image",
        }
    }
}

/// Parameters handed to the file selection surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
    pub accept: String,
    pub multiple: bool,
}

/// Native file selection surface provided by the host
///
/// Selected files come back later through `Composer::files_picked`.
pub trait FileSelector {
    fn open(&mut self, request: PickRequest);

    /// Forget the current selection so the same file can be picked again
    fn reset(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptRule {
    Any,
    /// `image/*` stored as `image/`
    MimePrefix(String),
    Mime(String),
    /// `.pdf` stored as `pdf`
    Extension(String),
}

/// Parsed `accept` string such as `image/*,.pdf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptFilter {
    rules: Vec<AcceptRule>,
}

impl AcceptFilter {
    pub fn parse(accept: &str) -> Self {
        let rules = accept
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .map(|entry| {
                if entry == "*" || entry == ANY_FILE {
                    AcceptRule::Any
                } else if let Some(ext) = entry.strip_prefix('.') {
                    AcceptRule::Extension(ext.to_string())
                } else if let Some(major) = entry.strip_suffix("/*") {
                    AcceptRule::MimePrefix(format!("{major}/"))
                } else {
                    AcceptRule::Mime(entry)
                }
            })
            .collect();
        Self { rules }
    }

    /// An empty filter accepts everything
    pub fn matches(&self, file: &Attachment) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        let mime = file.mime().to_lowercase();
        let ext = file.extension();
        self.rules.iter().any(|rule| match rule {
            AcceptRule::Any => true,
            AcceptRule::MimePrefix(prefix) => mime.starts_with(prefix.as_str()),
            AcceptRule::Mime(exact) => mime == *exact,
            AcceptRule::Extension(wanted) => ext.as_deref() == Some(wanted.as_str()),
        })
    }
}
