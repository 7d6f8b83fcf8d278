//! Composer input engine
//!
//! Owns the draft text, cursor, focus, text-area height, popover and preview
//! resources of one composer. The attachment list belongs to the host and is
//! only read through `ComposerHost::attachments`; every change to it goes back
//! through the host callbacks.

mod editing;

use std::rc::Rc;

use chrono::Utc;
use tracing::{debug, info};

use crate::attachment::{format_bytes, Attachment};
use crate::config::ComposerConfig;
use crate::input::{Key, KeyInput, KeyOutcome};
use crate::paste::{extract_pasted_images, ClipboardItem, PasteOutcome};
use crate::picker::{FileSelector, PickRequest, PickerChoice};
use crate::popover::{GlobalEvents, Point, Popover, Region};
use crate::preview::{PreviewHandle, Previews};
use crate::resize::{auto_resize, is_expanded, TextMeasure, WrappedTextMeasure, BASE_HEIGHT};

/// Snapshot handed to the host on send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPayload {
    /// Trimmed draft
    pub text: String,
    /// Copy of the attachment list at send time
    pub files: Vec<Attachment>,
}

/// The composer's view of its host
///
/// All callbacks are optional; the defaults do nothing.
pub trait ComposerHost {
    fn attachments(&self) -> &[Attachment];

    fn files_added(&mut self, _files: Vec<Attachment>) {}

    fn remove_file(&mut self, _index: usize) {}

    fn clear_files(&mut self) {}

    /// Fire and forget: the composer clears right after this returns
    fn send(&mut self, _payload: SendPayload) {}
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerView {
    pub placeholder: String,
    pub text: String,
    pub cursor: usize,
    pub height: u32,
    pub expanded: bool,
    pub focused: bool,
    pub popover_open: bool,
    pub can_send: bool,
    pub shows_clear: bool,
    pub shows_audio: bool,
    pub previews: Vec<PreviewItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewItem {
    pub index: usize,
    pub name: String,
    pub size_label: String,
    /// Extension label shown instead of a thumbnail
    pub label: String,
    pub thumbnail: Option<PreviewHandle>,
    pub dimensions: Option<(u32, u32)>,
}

pub struct Composer<M: TextMeasure = WrappedTextMeasure> {
    config: ComposerConfig,
    text: String,
    /// Byte offset into `text`, always on a char boundary
    cursor: usize,
    focused: bool,
    height: u32,
    measure: M,
    popover: Popover,
    previews: Previews,
}

impl<M: TextMeasure> Composer<M> {
    pub fn new(config: ComposerConfig, measure: M, events: Rc<dyn GlobalEvents>) -> Self {
        Self {
            config,
            text: String::new(),
            cursor: 0,
            focused: false,
            height: BASE_HEIGHT,
            measure,
            popover: Popover::new(events),
            previews: Previews::new(),
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Replace the whole draft, cursor at the end
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
        self.text_changed();
    }

    pub fn insert_str(&mut self, text: &str) {
        self.insert_at_cursor(text);
    }

    pub fn measure_mut(&mut self) -> &mut M {
        &mut self.measure
    }

    /// Re-run sizing, e.g. after the measure's width changed
    pub fn relayout(&mut self) {
        self.height = auto_resize(&mut self.measure, &self.text);
    }

    fn text_changed(&mut self) {
        self.relayout();
    }

    pub fn can_send<H: ComposerHost + ?Sized>(&self, host: &H) -> bool {
        !self.text.trim().is_empty() || !host.attachments().is_empty()
    }

    pub fn is_expanded<H: ComposerHost + ?Sized>(&self, host: &H) -> bool {
        is_expanded(self.height, &self.text, host.attachments().len())
    }

    pub fn shows_clear<H: ComposerHost + ?Sized>(&self, host: &H) -> bool {
        self.config.use_clear && (!self.text.is_empty() || !host.attachments().is_empty())
    }

    /// Send the draft. Returns false (and does nothing) when there is nothing to send.
    pub fn send<H: ComposerHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if !self.can_send(host) {
            return false;
        }

        let payload = SendPayload {
            text: self.text.trim().to_string(),
            files: host.attachments().to_vec(),
        };
        info!(
            text_len = payload.text.len(),
            files = payload.files.len(),
            "Composer send"
        );
        host.send(payload);

        self.reset_text();
        host.clear_files();
        true
    }

    /// Explicit clear affordance
    pub fn clear<H: ComposerHost + ?Sized>(&mut self, host: &mut H) {
        self.reset_text();
        host.clear_files();
    }

    fn reset_text(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.text_changed();
    }

    /// Remove button on an attachment chip
    pub fn remove_file<H: ComposerHost + ?Sized>(&mut self, index: usize, host: &mut H) {
        host.remove_file(index);
    }

    /// Key pressed while the text area has focus
    pub fn handle_key<H: ComposerHost + ?Sized>(
        &mut self,
        input: impl Into<KeyInput>,
        host: &mut H,
    ) -> KeyOutcome {
        let KeyInput { key, modifiers } = input.into();
        match key {
            // Only Shift+Enter inserts a newline; any other Enter sends
            Key::Enter if modifiers.shift => {
                self.insert_at_cursor("\n");
                KeyOutcome::Edited
            }
            Key::Enter => KeyOutcome::Submitted {
                sent: self.send(host),
            },
            Key::Escape => {
                if self.popover.on_key(Key::Escape) {
                    KeyOutcome::PopoverClosed
                } else {
                    KeyOutcome::Ignored
                }
            }
            // Control chords belong to the host
            Key::Char(_) if modifiers.ctrl => KeyOutcome::Ignored,
            Key::Char(ch) => {
                let mut buf = [0u8; 4];
                self.insert_at_cursor(ch.encode_utf8(&mut buf));
                KeyOutcome::Edited
            }
            Key::Backspace => edited(self.backspace()),
            Key::Delete => edited(self.delete_forward()),
            Key::Left => moved(self.move_left()),
            Key::Right => moved(self.move_right()),
            Key::Home => moved(self.move_line_start()),
            Key::End => moved(self.move_line_end()),
        }
    }

    /// Paste into the text area
    pub fn handle_paste<H: ComposerHost + ?Sized>(
        &mut self,
        items: &[ClipboardItem],
        host: &mut H,
    ) -> PasteOutcome {
        let Some(picked) = extract_pasted_images(items, Utc::now()) else {
            return PasteOutcome::Ignored;
        };
        let count = picked.len();
        if count > 0 {
            host.files_added(picked);
        }
        PasteOutcome::Captured(count)
    }

    pub fn is_popover_open(&self) -> bool {
        self.popover.is_open()
    }

    pub fn toggle_popover(&mut self) {
        self.popover.toggle();
    }

    /// Where the popover button and menu are drawn
    pub fn set_popover_root(&mut self, root: Region) {
        self.popover.set_root(root);
    }

    /// Pick an entry of the popover: close it and open the selector
    pub fn choose<S: FileSelector + ?Sized>(&mut self, choice: PickerChoice, selector: &mut S) {
        self.popover.close();
        let request = PickRequest {
            accept: choice.accept(&self.config.accept),
            multiple: self.config.multiple,
        };
        debug!(?choice, accept = %request.accept, "Opening file selector");
        selector.open(request);
    }

    /// Change notification from the selector
    pub fn files_picked<S, H>(&mut self, files: Vec<Attachment>, selector: &mut S, host: &mut H)
    where
        S: FileSelector + ?Sized,
        H: ComposerHost + ?Sized,
    {
        if !files.is_empty() {
            host.files_added(files);
        }
        selector.reset();
    }

    /// Window-level pointer-down
    pub fn global_pointer_down(&mut self, at: Point) -> bool {
        self.popover.on_pointer_down(at)
    }

    /// Window-level key-down
    pub fn global_key(&mut self, key: Key) -> bool {
        self.popover.on_key(key)
    }

    /// Bring previews in line with the host's list
    pub fn sync_previews<H: ComposerHost + ?Sized>(&mut self, host: &H) -> bool {
        self.previews.sync(host.attachments())
    }

    pub fn previews(&self) -> &Previews {
        &self.previews
    }

    pub fn view<H: ComposerHost + ?Sized>(&mut self, host: &H) -> ComposerView {
        self.sync_previews(host);

        let arena = self.previews.arena();
        let previews = self
            .previews
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| PreviewItem {
                index,
                name: record.attachment.name().to_string(),
                size_label: format_bytes(record.attachment.size()),
                label: record.attachment.label(),
                thumbnail: record.resource,
                dimensions: record
                    .resource
                    .and_then(|h| arena.resolve(h))
                    .and_then(|r| r.dimensions),
            })
            .collect();

        ComposerView {
            placeholder: self.config.placeholder.clone(),
            text: self.text.clone(),
            cursor: self.cursor,
            height: self.height,
            expanded: self.is_expanded(host),
            focused: self.focused,
            popover_open: self.popover.is_open(),
            can_send: self.can_send(host),
            shows_clear: self.shows_clear(host),
            shows_audio: self.config.use_audio,
            previews,
        }
    }

    /// Release previews and listeners; the composer stays usable afterwards
    pub fn teardown(&mut self) {
        self.previews.teardown();
        self.popover.close();
    }
}

fn edited(changed: bool) -> KeyOutcome {
    if changed {
        KeyOutcome::Edited
    } else {
        KeyOutcome::Ignored
    }
}

fn moved(changed: bool) -> KeyOutcome {
    if changed {
        KeyOutcome::Moved
    } else {
        KeyOutcome::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentList;
    use crate::input::Modifiers;
    use crate::popover::{EventRegistry, ListenerKind};
    use crate::resize::MAX_HEIGHT;

    #[derive(Default)]
    struct TestHost {
        files: AttachmentList,
        sent: Vec<SendPayload>,
        clears: usize,
        calls: Vec<&'static str>,
    }

    impl ComposerHost for TestHost {
        fn attachments(&self) -> &[Attachment] {
            self.files.as_slice()
        }

        fn files_added(&mut self, files: Vec<Attachment>) {
            self.calls.push("files_added");
            self.files.extend(files);
        }

        fn remove_file(&mut self, index: usize) {
            self.calls.push("remove_file");
            self.files.remove(index);
        }

        fn clear_files(&mut self) {
            self.calls.push("clear_files");
            self.clears += 1;
            self.files.clear();
        }

        fn send(&mut self, payload: SendPayload) {
            self.calls.push("send");
            self.sent.push(payload);
        }
    }

    #[derive(Default)]
    struct TestSelector {
        opened: Vec<PickRequest>,
        resets: usize,
    }

    impl FileSelector for TestSelector {
        fn open(&mut self, request: PickRequest) {
            self.opened.push(request);
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    fn new_composer_with(config: ComposerConfig) -> (Rc<EventRegistry>, Composer) {
        let registry = EventRegistry::new();
        let composer = Composer::new(config, WrappedTextMeasure::new(40), registry.clone());
        (registry, composer)
    }

    fn new_composer() -> (Rc<EventRegistry>, Composer) {
        new_composer_with(ComposerConfig::default())
    }

    fn file(name: &str, mime: &str) -> Attachment {
        Attachment::new(name, mime, vec![1u8, 2, 3])
    }

    #[test]
    fn test_can_send_predicate() {
        let (_r, mut composer) = new_composer();
        let drafts = ["", "  ", "\n\t", "a", "  a  "];
        for draft in drafts {
            for with_file in [false, true] {
                let mut host = TestHost::default();
                if with_file {
                    host.files.extend([file("a.pdf", "application/pdf")]);
                }
                composer.set_text(draft);
                let expected = !draft.trim().is_empty() || with_file;
                assert_eq!(composer.can_send(&host), expected, "draft {:?}", draft);
            }
        }
    }

    #[test]
    fn test_send_builds_trimmed_snapshot_then_clears() {
        let (_r, mut composer) = new_composer();
        let a = file("a.png", "image/png");
        let b = file("b.pdf", "application/pdf");
        let mut host = TestHost::default();
        host.files.extend([a.clone(), b.clone()]);

        composer.set_text("  hello  ");
        assert!(composer.send(&mut host));

        assert_eq!(
            host.sent,
            vec![SendPayload {
                text: "hello".to_string(),
                files: vec![a, b],
            }]
        );
        assert_eq!(host.calls, vec!["send", "clear_files"]);
        assert_eq!(host.clears, 1);
        assert_eq!(composer.text(), "");
        assert_eq!(composer.cursor(), 0);
        assert_eq!(composer.height(), BASE_HEIGHT);

        // The dispatched payload is a copy
        host.files.extend([file("c.png", "image/png")]);
        assert_eq!(host.sent[0].files.len(), 2);
    }

    #[test]
    fn test_send_without_content_is_noop() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        composer.set_text("   ");
        assert!(!composer.send(&mut host));
        assert!(host.calls.is_empty());
        assert_eq!(composer.text(), "   ");
    }

    #[test]
    fn test_attachments_alone_can_be_sent() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        host.files.extend([file("a.png", "image/png")]);
        assert!(composer.send(&mut host));
        assert_eq!(host.sent[0].text, "");
        assert_eq!(host.sent[0].files.len(), 1);
        assert!(host.files.is_empty());
    }

    #[test]
    fn test_enter_sends_shift_enter_inserts_newline() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();

        for ch in "hi".chars() {
            composer.handle_key(Key::Char(ch), &mut host);
        }
        let outcome = composer.handle_key(KeyInput::new(Key::Enter, Modifiers::SHIFT), &mut host);
        assert_eq!(outcome, KeyOutcome::Edited);
        assert_eq!(composer.text(), "hi\n");
        assert!(host.sent.is_empty());

        let outcome = composer.handle_key(Key::Enter, &mut host);
        assert_eq!(outcome, KeyOutcome::Submitted { sent: true });
        assert!(outcome.prevents_default());
        assert_eq!(host.sent[0].text, "hi");
        assert_eq!(composer.text(), "");

        // Nothing to send: still consumed, nothing dispatched
        let outcome = composer.handle_key(Key::Enter, &mut host);
        assert_eq!(outcome, KeyOutcome::Submitted { sent: false });
        assert_eq!(host.sent.len(), 1);
    }

    #[test]
    fn test_alt_enter_still_sends() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        composer.handle_key(Key::Char('x'), &mut host);

        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        let outcome = composer.handle_key(KeyInput::new(Key::Enter, alt), &mut host);
        assert_eq!(outcome, KeyOutcome::Submitted { sent: true });
        assert_eq!(host.sent[0].text, "x");
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn test_ctrl_chords_are_left_to_host() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        let ctrl_v = KeyInput::new(
            Key::Char('v'),
            Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
        );
        assert_eq!(composer.handle_key(ctrl_v, &mut host), KeyOutcome::Ignored);
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn test_clear_and_visibility() {
        let (_r, mut composer) = new_composer_with(ComposerConfig {
            use_clear: true,
            ..ComposerConfig::default()
        });
        let mut host = TestHost::default();
        assert!(!composer.shows_clear(&host));

        composer.set_text("draft");
        assert!(composer.shows_clear(&host));

        composer.clear(&mut host);
        assert_eq!(composer.text(), "");
        assert_eq!(host.clears, 1);
        assert!(host.sent.is_empty());

        // Whitespace still counts as something to clear
        composer.set_text(" ");
        assert!(composer.shows_clear(&host));

        let (_r, mut plain) = new_composer();
        plain.set_text("draft");
        assert!(!plain.shows_clear(&host));
    }

    #[test]
    fn test_editing_multibyte() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        composer.set_text("añb");
        composer.handle_key(Key::Left, &mut host);
        composer.handle_key(Key::Backspace, &mut host);
        assert_eq!(composer.text(), "ab");
        assert_eq!(composer.cursor(), 1);

        composer.handle_key(Key::Char('é'), &mut host);
        assert_eq!(composer.text(), "aéb");
        composer.handle_key(Key::Left, &mut host);
        composer.handle_key(Key::Delete, &mut host);
        assert_eq!(composer.text(), "ab");

        assert_eq!(composer.handle_key(Key::Home, &mut host), KeyOutcome::Moved);
        assert_eq!(composer.cursor(), 0);
        assert_eq!(composer.handle_key(Key::Backspace, &mut host), KeyOutcome::Ignored);
        composer.handle_key(Key::End, &mut host);
        assert_eq!(composer.cursor(), 2);
    }

    #[test]
    fn test_home_end_follow_logical_lines() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        composer.set_text("one\ntwo");
        composer.handle_key(Key::Home, &mut host);
        assert_eq!(composer.cursor(), 4);
        composer.handle_key(Key::Left, &mut host);
        composer.handle_key(Key::Home, &mut host);
        assert_eq!(composer.cursor(), 0);
        composer.handle_key(Key::End, &mut host);
        assert_eq!(composer.cursor(), 3);
    }

    #[test]
    fn test_height_follows_text() {
        let (_r, mut composer) = new_composer();
        let host = TestHost::default();
        composer.set_text("short");
        assert_eq!(composer.height(), BASE_HEIGHT);
        assert!(!composer.is_expanded(&host));

        composer.set_text("a\nb\nc\nd\ne\nf\ng\nh\ni\nj");
        assert_eq!(composer.height(), MAX_HEIGHT);
        assert!(composer.is_expanded(&host));

        composer.set_text("");
        assert_eq!(composer.height(), BASE_HEIGHT);
    }

    #[test]
    fn test_attachments_expand_layout() {
        let (_r, composer) = new_composer();
        let mut host = TestHost::default();
        host.files.extend([file("a.pdf", "application/pdf")]);
        assert!(composer.is_expanded(&host));
    }

    #[test]
    fn test_paste_image_forwards_batch() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        let items = vec![
            ClipboardItem::text("text/plain"),
            ClipboardItem::file(file("image.png", "image/png")),
            ClipboardItem::file(file("photo.jpg", "image/jpeg")),
        ];

        let outcome = composer.handle_paste(&items, &mut host);
        assert_eq!(outcome, PasteOutcome::Captured(2));
        assert!(outcome.prevents_default());
        assert_eq!(host.calls, vec!["files_added"]);
        assert!(host.files.as_slice()[0].name().starts_with("pasted_"));
        assert_eq!(host.files.as_slice()[1].name(), "photo.jpg");
    }

    #[test]
    fn test_text_paste_is_ignored() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        let outcome = composer.handle_paste(&[ClipboardItem::text("text/plain")], &mut host);
        assert_eq!(outcome, PasteOutcome::Ignored);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_picker_choices() {
        let (registry, mut composer) = new_composer_with(ComposerConfig {
            accept: "image/*,.pdf".to_string(),
            multiple: false,
            ..ComposerConfig::default()
        });
        let mut selector = TestSelector::default();

        composer.toggle_popover();
        assert!(composer.is_popover_open());
        composer.choose(PickerChoice::AnyFile, &mut selector);
        assert!(!composer.is_popover_open());
        assert_eq!(registry.active_count(), 0);

        composer.toggle_popover();
        composer.choose(PickerChoice::ImageOnly, &mut selector);

        assert_eq!(
            selector.opened,
            vec![
                PickRequest {
                    accept: "image/*,.pdf".to_string(),
                    multiple: false,
                },
                PickRequest {
                    accept: "image/*".to_string(),
                    multiple: false,
                },
            ]
        );
    }

    #[test]
    fn test_files_picked_forwards_and_resets() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        let mut selector = TestSelector::default();
        let a = file("a.pdf", "application/pdf");

        composer.files_picked(vec![a.clone()], &mut selector, &mut host);
        composer.files_picked(vec![a.clone()], &mut selector, &mut host);
        assert_eq!(host.files.as_slice(), &[a.clone(), a]);
        assert_eq!(selector.resets, 2);

        composer.files_picked(Vec::new(), &mut selector, &mut host);
        assert_eq!(host.calls, vec!["files_added", "files_added"]);
        assert_eq!(selector.resets, 3);
    }

    #[test]
    fn test_popover_global_events() {
        let (registry, mut composer) = new_composer();
        let mut host = TestHost::default();
        composer.set_popover_root(Region::new(0, 0, 4, 2));

        composer.toggle_popover();
        assert!(registry.is_listening(ListenerKind::PointerDown));
        assert!(!composer.global_pointer_down(Point::new(1, 1)));
        assert!(composer.is_popover_open());
        assert!(composer.global_pointer_down(Point::new(10, 10)));
        assert!(!composer.is_popover_open());
        assert!(!registry.is_listening(ListenerKind::PointerDown));

        composer.toggle_popover();
        assert_eq!(
            composer.handle_key(Key::Escape, &mut host),
            KeyOutcome::PopoverClosed
        );
        assert_eq!(composer.handle_key(Key::Escape, &mut host), KeyOutcome::Ignored);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_remove_file_goes_through_host() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        host.files.extend([file("a.png", "image/png"), file("b.png", "image/png")]);
        composer.remove_file(0, &mut host);
        assert_eq!(host.files.len(), 1);
        assert_eq!(host.files.as_slice()[0].name(), "b.png");
    }

    #[test]
    fn test_view_and_teardown() {
        let (registry, mut composer) = new_composer_with(ComposerConfig {
            use_audio: true,
            ..ComposerConfig::default()
        });
        let mut host = TestHost::default();
        host.files.extend([file("a.png", "image/png"), file("b.pdf", "application/pdf")]);

        let view = composer.view(&host);
        assert!(view.can_send);
        assert!(view.expanded);
        assert!(view.shows_audio);
        assert!(!view.shows_clear);
        assert_eq!(view.placeholder, "Ask anything");
        assert_eq!(view.previews.len(), 2);
        assert!(view.previews[0].thumbnail.is_some());
        assert_eq!(view.previews[0].size_label, "3B");
        assert!(view.previews[1].thumbnail.is_none());
        assert_eq!(view.previews[1].label, "PDF");
        assert_eq!(composer.previews().arena().live_count(), 1);

        composer.toggle_popover();
        composer.teardown();
        assert_eq!(composer.previews().arena().live_count(), 0);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_send_then_view_revokes_previews() {
        let (_r, mut composer) = new_composer();
        let mut host = TestHost::default();
        host.files.extend([file("a.png", "image/png")]);
        composer.view(&host);
        let handle = composer.view(&host).previews[0].thumbnail.unwrap();

        composer.send(&mut host);
        let view = composer.view(&host);
        assert!(view.previews.is_empty());
        assert!(!composer.previews().arena().is_live(handle));
    }
}
