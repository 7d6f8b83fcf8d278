//! Terminal event handling

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use ratatui::layout::Position;
use ssepack_core::{ClipboardItem, Key, ListenerKind, PasteOutcome, Point};
use tracing::debug;

use super::app::App;
use super::clipboard::{read_clipboard, ClipboardContent};
use super::keys::{shortcut, to_key_input, Shortcut};
use super::render::input_columns;
use super::selector::SelectorAction;

impl App {
    pub(crate) fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    self.handle_click(mouse.column, mouse.row);
                }
            }
            Event::Paste(text) => self.paste_text(&text),
            Event::Resize(width, _) => self.handle_resize(width),
            Event::FocusGained => self.composer.focus(),
            Event::FocusLost => self.composer.blur(),
            _ => {}
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if self.selector.is_open() {
            match self.selector.handle_key(key.code, key.modifiers) {
                SelectorAction::Continue => {}
                SelectorAction::Cancel => self.selector.cancel(),
                SelectorAction::Submit => self.submit_selection(),
            }
            return;
        }

        // The open popover listens for Escape at window level
        if key.code == KeyCode::Esc && self.events.is_listening(ListenerKind::KeyDown) {
            self.composer.global_key(Key::Escape);
            return;
        }

        if let Some(shortcut) = shortcut(&key, self.composer.is_popover_open()) {
            self.run_shortcut(shortcut);
            return;
        }

        if let Some(input) = to_key_input(&key) {
            self.notice = None;
            self.composer.handle_key(input, &mut self.host);
        }
    }

    fn run_shortcut(&mut self, shortcut: Shortcut) {
        match shortcut {
            Shortcut::Quit => self.should_quit = true,
            Shortcut::TogglePopover => self.composer.toggle_popover(),
            Shortcut::Paste => self.paste_clipboard(),
            Shortcut::Clear => {
                if self.composer.shows_clear(&self.host) {
                    self.composer.clear(&mut self.host);
                }
            }
            Shortcut::RemoveLastFile => {
                if let Some(last) = self.host.files().len().checked_sub(1) {
                    self.composer.remove_file(last, &mut self.host);
                }
            }
            Shortcut::ToggleMode => {
                let method = self.modes.toggle();
                debug!(%method, "Mode switched");
            }
            Shortcut::Choose(choice) => self.composer.choose(choice, &mut self.selector),
        }
    }

    fn submit_selection(&mut self) {
        if let Some(files) = self.selector.load() {
            self.composer
                .files_picked(files, &mut self.selector, &mut self.host);
        }
    }

    fn paste_clipboard(&mut self) {
        match read_clipboard() {
            ClipboardContent::Items(items) => {
                let outcome = self.composer.handle_paste(&items, &mut self.host);
                if outcome == PasteOutcome::Captured(0) {
                    self.notice = Some("Clipboard image could not be read".to_string());
                }
            }
            ClipboardContent::Text(text) => self.paste_text(&text),
            ClipboardContent::Empty => {}
        }
    }

    /// Text paste: offered to the composer first, inserted when it passes
    pub(crate) fn paste_text(&mut self, text: &str) {
        if self.selector.is_open() {
            self.selector.push_str(text);
            return;
        }
        let items = [ClipboardItem::text("text/plain")];
        if !self
            .composer
            .handle_paste(&items, &mut self.host)
            .prevents_default()
        {
            let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
            self.composer.insert_str(&normalized);
        }
    }

    pub(crate) fn handle_click(&mut self, column: u16, row: u16) {
        if self.events.is_listening(ListenerKind::PointerDown) {
            self.composer
                .global_pointer_down(Point::new(i32::from(column), i32::from(row)));
        }
        if self.selector.is_open() {
            return;
        }

        let pos = Position::new(column, row);
        let menu_choice = self
            .composer
            .is_popover_open()
            .then(|| self.hits.menu_item_at(pos))
            .flatten();

        if let Some(choice) = menu_choice {
            self.composer.choose(choice, &mut self.selector);
        } else if self.hits.add.contains(pos) {
            self.composer.toggle_popover();
        } else if self.hits.send.contains(pos) {
            self.composer.send(&mut self.host);
        } else if self.hits.clear.is_some_and(|rect| rect.contains(pos)) {
            self.composer.clear(&mut self.host);
        } else if let Some(index) = self.hits.chip_remove_at(pos) {
            self.composer.remove_file(index, &mut self.host);
        } else if self.hits.text.contains(pos) {
            self.composer.focus();
        }
    }

    fn handle_resize(&mut self, width: u16) {
        let columns = input_columns(width, self.composer.config());
        self.composer.measure_mut().set_columns(usize::from(columns));
        self.composer.relayout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::tui::state::StreamStatus;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use ssepack_core::{Attachment, ComposerHost, Method};

    fn app() -> App {
        App::new(AppConfig::default()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, ch: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL));
    }

    fn type_str(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn draw(app: &mut App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| app.ui(f)).unwrap();
        terminal
    }

    #[tokio::test]
    async fn test_send_starts_one_exchange_per_mode() {
        let mut app = app();
        type_str(&mut app, "hello");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.composer.text(), "");

        app.dispatch_sends();
        assert!(!app.modes.can_start(Method::Get));
        assert_eq!(app.pane.status(), &StreamStatus::Connecting(Method::Get));

        // Second GET is refused while the first is in flight
        type_str(&mut app, "again");
        press(&mut app, KeyCode::Enter);
        app.dispatch_sends();
        assert_eq!(app.notice.as_deref(), Some("GET stream already started"));

        // POST has its own slot
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "post");
        press(&mut app, KeyCode::Enter);
        app.dispatch_sends();
        assert!(!app.modes.can_start(Method::Post));
    }

    #[test]
    fn test_empty_send_is_noop() {
        let mut app = app();
        type_str(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(app.host.take_outbox().is_empty());
        assert_eq!(app.composer.text(), "   ");
    }

    #[test]
    fn test_popover_menu_opens_selector() {
        let mut app = app();
        ctrl(&mut app, 'o');
        assert!(app.composer.is_popover_open());
        assert!(app.events.is_listening(ListenerKind::PointerDown));

        press(&mut app, KeyCode::Char('2'));
        assert!(!app.composer.is_popover_open());
        assert_eq!(app.events.active_count(), 0);
        assert_eq!(app.selector.request().unwrap().accept, "image/*");

        // Keys go to the prompt now
        type_str(&mut app, "abc");
        assert_eq!(app.selector.buffer(), "abc");
        assert_eq!(app.composer.text(), "");
        press(&mut app, KeyCode::Esc);
        assert!(!app.selector.is_open());
    }

    #[test]
    fn test_escape_closes_popover() {
        let mut app = app();
        ctrl(&mut app, 'o');
        press(&mut app, KeyCode::Esc);
        assert!(!app.composer.is_popover_open());
        assert!(!app.events.is_listening(ListenerKind::KeyDown));
    }

    #[test]
    fn test_click_outside_closes_popover() {
        let mut app = app();
        draw(&mut app);
        let add = app.hits.add;

        app.handle_click(add.x, add.y);
        assert!(app.composer.is_popover_open());

        draw(&mut app);
        let (rect, choice) = app.hits.menu_items[0];
        assert_eq!(choice, ssepack_core::PickerChoice::AnyFile);
        // Inside the menu keeps it open until the item is chosen
        app.handle_click(rect.x, rect.y);
        assert!(!app.composer.is_popover_open());
        assert!(app.selector.is_open());
        app.selector.cancel();

        app.handle_click(add.x, add.y);
        app.handle_click(70, 0);
        assert!(!app.composer.is_popover_open());
        assert_eq!(app.events.active_count(), 0);
    }

    #[test]
    fn test_attachment_chips_and_removal() {
        let mut app = app();
        app.host.files_added(vec![
            Attachment::new("a.pdf", "application/pdf", vec![1u8, 2]),
            Attachment::new("b.pdf", "application/pdf", vec![3u8]),
        ]);
        let terminal = draw(&mut app);
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("PDF a.pdf 2B"));
        assert_eq!(app.hits.chip_removes.len(), 2);

        let (rect, index) = app.hits.chip_removes[0];
        assert_eq!(index, 0);
        app.handle_click(rect.x, rect.y);
        assert_eq!(app.host.attachments()[0].name(), "b.pdf");

        ctrl(&mut app, 'r');
        assert!(app.host.attachments().is_empty());
    }

    #[test]
    fn test_text_paste_inserts() {
        let mut app = app();
        app.paste_text("one\r\ntwo");
        assert_eq!(app.composer.text(), "one\ntwo");
    }

    #[test]
    fn test_clear_shortcut_needs_clear_button() {
        let mut app = app();
        type_str(&mut app, "draft");
        ctrl(&mut app, 'x');
        assert_eq!(app.composer.text(), "draft");

        let mut config = AppConfig::default();
        config.composer.use_clear = true;
        let mut app = App::new(config).unwrap();
        type_str(&mut app, "draft");
        ctrl(&mut app, 'x');
        assert_eq!(app.composer.text(), "");
    }

    #[test]
    fn test_shift_enter_grows_composer() {
        let mut app = app();
        type_str(&mut app, "a");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_str(&mut app, "b");
        assert_eq!(app.composer.text(), "a\nb");
        assert!(app.composer.height() > 36);
        assert!(app.host.take_outbox().is_empty());
    }
}
