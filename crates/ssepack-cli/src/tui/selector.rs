//! In-terminal file selector
//!
//! Opening the selector shows a path prompt in the status line. Several paths
//! may be given separated by commas when the request allows multiple files.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use ssepack_core::{AcceptFilter, Attachment, FileSelector, PickRequest};
use tracing::warn;

const MAX_INPUT: usize = 4096;

/// Result of a key while the prompt is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorAction {
    Continue,
    Submit,
    Cancel,
}

#[derive(Debug, Default)]
pub struct PathSelector {
    request: Option<PickRequest>,
    buffer: String,
    error: Option<String>,
}

impl PathSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.request.is_some()
    }

    pub fn request(&self) -> Option<&PickRequest> {
        self.request.as_ref()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cancel(&mut self) {
        self.request = None;
        self.buffer.clear();
        self.error = None;
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> SelectorAction {
        match code {
            KeyCode::Enter => SelectorAction::Submit,
            KeyCode::Esc => SelectorAction::Cancel,
            KeyCode::Backspace => {
                self.buffer.pop();
                self.error = None;
                SelectorAction::Continue
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                SelectorAction::Cancel
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                if self.buffer.len() < MAX_INPUT {
                    self.buffer.push(c);
                }
                self.error = None;
                SelectorAction::Continue
            }
            _ => SelectorAction::Continue,
        }
    }

    /// Bracketed paste into the prompt
    pub fn push_str(&mut self, text: &str) {
        let line = text.lines().next().unwrap_or_default();
        self.buffer.push_str(line);
        self.error = None;
    }

    /// Read every typed path. On failure the prompt stays open with the error
    /// shown and nothing is returned.
    pub fn load(&mut self) -> Option<Vec<Attachment>> {
        let request = self.request.clone()?;
        let filter = AcceptFilter::parse(&request.accept);

        let raw: Vec<&str> = if request.multiple {
            self.buffer.split(',').collect()
        } else {
            vec![self.buffer.as_str()]
        };

        let mut files = Vec::new();
        for entry in raw.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
            let path = expand_home(entry);
            let file = match Attachment::from_path(&path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(error = %e, "Could not attach file");
                    self.error = Some(e.to_string());
                    return None;
                }
            };
            if !filter.matches(&file) {
                self.error = Some(format!(
                    "{} does not match {}",
                    file.name(),
                    request.accept
                ));
                return None;
            }
            files.push(file);
        }

        self.request = None;
        Some(files)
    }
}

impl FileSelector for PathSelector {
    fn open(&mut self, request: PickRequest) {
        self.request = Some(request);
        self.buffer.clear();
        self.error = None;
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.error = None;
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
