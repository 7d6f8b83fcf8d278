//! Attachments - file handles attached to a composer draft
//!
//! - `Attachment` is a cheap-to-clone handle (bytes are reference counted)
//! - `AttachmentList` is the host-side ordered list the composer reads from

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Fallback MIME type when nothing better is known
pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("failed to read attachment {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("not a file: {0}")]
    NotAFile(String),
}

/// A user-selected or pasted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    mime: String,
    last_modified: DateTime<Utc>,
    data: Bytes,
}

impl Attachment {
    /// Create an attachment stamped with the current time
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::with_last_modified(name, mime, data, Utc::now())
    }

    pub fn with_last_modified(
        name: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            last_modified,
            data: data.into(),
        }
    }

    /// Load an attachment from disk, guessing the MIME type from the extension
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let display = path.display().to_string();
        let metadata = std::fs::metadata(path).map_err(|source| AttachmentError::Read {
            path: display.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(AttachmentError::NotAFile(display));
        }

        let data = std::fs::read(path).map_err(|source| AttachmentError::Read {
            path: display.clone(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(display);
        let mime = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_owned())
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Self::with_last_modified(name, mime, data, last_modified))
    }

    /// Same content and type under a new name (fresh timestamp)
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.mime.clone(), self.data.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Lowercased extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Short uppercase label shown in place of a thumbnail for non-images
    pub fn label(&self) -> String {
        self.extension()
            .map(|ext| ext.to_uppercase())
            .unwrap_or_else(|| "FILE".to_string())
    }

    /// Identity used to detect list changes: name, size and modification time
    pub fn fingerprint(&self) -> String {
        format!(
            "{}-{}-{}",
            self.name,
            self.size(),
            self.last_modified.timestamp_millis()
        )
    }
}

/// Host-owned ordered attachment list
///
/// Insertion order is preserved and duplicates are allowed.
#[derive(Debug, Clone, Default)]
pub struct AttachmentList {
    items: Vec<Attachment>,
}

impl AttachmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one or more attachments
    pub fn extend(&mut self, files: impl IntoIterator<Item = Attachment>) {
        self.items.extend(files);
    }

    /// Remove by position; out of range is a no-op
    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[Attachment] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attachment> {
        self.items.iter()
    }
}

/// Composite key of a whole list, joined with `|`
pub fn list_fingerprint(files: &[Attachment]) -> String {
    files
        .iter()
        .map(Attachment::fingerprint)
        .collect::<Vec<_>>()
        .join("|")
}

/// Human readable size: `512B`, `1.5KB`, `3.0MB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut n = bytes as f64;
    let mut i = 0;
    while n >= 1024.0 && i < UNITS.len() - 1 {
        n /= 1024.0;
        i += 1;
    }
    if i == 0 {
        format!("{}{}", bytes, UNITS[0])
    } else {
        format!("{:.1}{}", n, UNITS[i])
    }
}
