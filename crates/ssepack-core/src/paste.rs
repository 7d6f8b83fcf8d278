//! Clipboard paste to attachment capture
//!
//! Only file items with an `image/*` type are captured. A paste without any
//! such item is left alone so the host can insert text as usual.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::attachment::Attachment;

/// Name clipboards give to anonymous image data
pub const GENERIC_PASTE_NAME: &str = "image.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    String,
}

/// One entry of a clipboard payload
#[derive(Debug, Clone)]
pub struct ClipboardItem {
    pub kind: ItemKind,
    pub mime: String,
    file: Option<Attachment>,
}

impl ClipboardItem {
    pub fn file(file: Attachment) -> Self {
        Self {
            kind: ItemKind::File,
            mime: file.mime().to_string(),
            file: Some(file),
        }
    }

    pub fn text(mime: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::String,
            mime: mime.into(),
            file: None,
        }
    }

    /// A file item whose data could not be retrieved
    pub fn unreadable_file(mime: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::File,
            mime: mime.into(),
            file: None,
        }
    }

    pub fn is_image_file(&self) -> bool {
        self.kind == ItemKind::File && self.mime.starts_with("image/")
    }

    pub fn get_as_file(&self) -> Option<&Attachment> {
        self.file.as_ref()
    }
}

/// Result of offering a paste to the composer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOutcome {
    /// No image items; default text paste should proceed
    Ignored,
    /// Default paste suppressed; this many files were forwarded
    Captured(usize),
}

impl PasteOutcome {
    pub fn prevents_default(&self) -> bool {
        matches!(self, PasteOutcome::Captured(_))
    }
}

/// Extract image files from a clipboard payload.
///
/// Returns `None` when there is no image item at all. Items whose file cannot
/// be retrieved are skipped individually.
pub fn extract_pasted_images(
    items: &[ClipboardItem],
    now: DateTime<Utc>,
) -> Option<Vec<Attachment>> {
    let image_items: Vec<&ClipboardItem> = items.iter().filter(|it| it.is_image_file()).collect();
    if image_items.is_empty() {
        return None;
    }

    let mut picked = Vec::with_capacity(image_items.len());
    for item in image_items {
        let Some(file) = item.get_as_file() else {
            warn!(mime = %item.mime, "Skipping clipboard item without file data");
            continue;
        };

        let name = if file.name().is_empty() || file.name() == GENERIC_PASTE_NAME {
            pasted_file_name(file.mime(), now)
        } else {
            file.name().to_string()
        };
        debug!(name = %name, size = file.size(), "Captured pasted image");
        picked.push(file.renamed(name));
    }

    Some(picked)
}

/// `pasted_YYYYMMDD_HHMMSS.<ext>` where `<ext>` is the MIME subtype
pub fn pasted_file_name(mime: &str, now: DateTime<Utc>) -> String {
    let ext = mime
        .split('/')
        .nth(1)
        .filter(|sub| !sub.is_empty())
        .unwrap_or("png");
    format!("pasted_{}.{}", now.format("%Y%m%d_%H%M%S"), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_generic_name_is_replaced() {
        let items = vec![ClipboardItem::file(Attachment::new(
            "image.png",
            "image/png",
            vec![1u8],
        ))];
        let picked = extract_pasted_images(&items, Utc::now()).unwrap();
        assert_eq!(picked.len(), 1);

        let re = Regex::new(r"^pasted_\d{8}_\d{6}\.png$").unwrap();
        assert!(re.is_match(picked[0].name()), "{}", picked[0].name());
        assert_eq!(picked[0].mime(), "image/png");
    }

    #[test]
    fn test_real_name_is_kept() {
        let items = vec![ClipboardItem::file(Attachment::new(
            "photo.jpg",
            "image/jpeg",
            vec![1u8],
        ))];
        let picked = extract_pasted_images(&items, now()).unwrap();
        assert_eq!(picked[0].name(), "photo.jpg");
    }

    #[test]
    fn test_text_only_paste_is_ignored() {
        let items = vec![
            ClipboardItem::text("text/plain"),
            ClipboardItem::file(Attachment::new("a.pdf", "application/pdf", vec![1u8])),
        ];
        assert!(extract_pasted_images(&items, now()).is_none());
        assert!(extract_pasted_images(&[], now()).is_none());
    }

    #[test]
    fn test_unreadable_item_is_skipped() {
        let items = vec![
            ClipboardItem::unreadable_file("image/png"),
            ClipboardItem::file(Attachment::new("", "image/webp", vec![1u8])),
        ];
        let picked = extract_pasted_images(&items, now()).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name(), "pasted_20240309_140507.webp");
    }

    #[test]
    fn test_pasted_file_name() {
        assert_eq!(
            pasted_file_name("image/jpeg", now()),
            "pasted_20240309_140507.jpeg"
        );
        assert_eq!(pasted_file_name("image/", now()), "pasted_20240309_140507.png");
        assert_eq!(pasted_file_name("garbage", now()), "pasted_20240309_140507.png");
    }
}
