//! ssepack core
//!
//! - `composer` - headless chat composer: draft, resize, paste, picker, popover, send/clear
//! - `trigger` - method-agnostic stream request initiator (GET query / POST body)
//! - `attachment`, `preview` - file handles and their revocable preview resources

pub mod attachment;
pub mod composer;
pub mod config;
pub mod input;
pub mod paste;
pub mod picker;
pub mod popover;
pub mod preview;
pub mod resize;
pub mod trigger;

pub use attachment::{format_bytes, Attachment, AttachmentError, AttachmentList};
pub use composer::{Composer, ComposerHost, ComposerView, PreviewItem, SendPayload};
pub use config::ComposerConfig;
pub use input::{Key, KeyInput, KeyOutcome, Modifiers};
pub use paste::{ClipboardItem, ItemKind, PasteOutcome};
pub use picker::{AcceptFilter, FileSelector, PickRequest, PickerChoice};
pub use popover::{EventRegistry, GlobalEvents, ListenerKind, Point, Region};
pub use preview::{PreviewArena, PreviewHandle, PreviewRecord, Previews};
pub use resize::{visual_cursor, wrap_lines, TextMeasure, WrappedTextMeasure};
pub use trigger::{
    HttpTransport, Method, QueryParams, StreamTrigger, Transport, TransportError, TriggerIntent,
};
