//! System clipboard as paste items
//!
//! An image on the clipboard becomes a single generic `image.png` file item,
//! the same shape a browser hands over for a screenshot paste.

use std::io::Cursor;

use arboard::Clipboard;
use ssepack_core::paste::GENERIC_PASTE_NAME;
use ssepack_core::{Attachment, ClipboardItem};
use tracing::{debug, warn};

const PNG_MIME: &str = "image/png";

#[derive(Debug)]
pub enum ClipboardContent {
    Items(Vec<ClipboardItem>),
    Text(String),
    Empty,
}

/// Image first, then text
pub fn read_clipboard() -> ClipboardContent {
    let mut clipboard = match Clipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            warn!(error = %e, "Clipboard unavailable");
            return ClipboardContent::Empty;
        }
    };

    if let Ok(image) = clipboard.get_image() {
        let item = match encode_png(image.width, image.height, image.bytes.into_owned()) {
            Some(png) => ClipboardItem::file(Attachment::new(GENERIC_PASTE_NAME, PNG_MIME, png)),
            None => ClipboardItem::unreadable_file(PNG_MIME),
        };
        return ClipboardContent::Items(vec![item]);
    }

    match clipboard.get_text() {
        Ok(text) if !text.is_empty() => ClipboardContent::Text(text),
        _ => ClipboardContent::Empty,
    }
}

/// RGBA pixels to PNG bytes
pub fn encode_png(width: usize, height: usize, rgba: Vec<u8>) -> Option<Vec<u8>> {
    let (w, h) = (u32::try_from(width).ok()?, u32::try_from(height).ok()?);
    let Some(img) = image::RgbaImage::from_raw(w, h, rgba) else {
        warn!(width, height, "Invalid RGBA buffer on clipboard");
        return None;
    };

    let mut png = Vec::new();
    if let Err(e) = img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png) {
        warn!(error = %e, "Could not encode clipboard image");
        return None;
    }
    debug!(width, height, bytes = png.len(), "Clipboard image encoded to PNG");
    Some(png)
}
