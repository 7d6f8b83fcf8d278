//! Terminal key mapping
//!
//! App shortcuts are resolved first; everything else is translated for the
//! composer's text area.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ssepack_core::{Key, KeyInput, Modifiers, PickerChoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Quit,
    TogglePopover,
    Paste,
    Clear,
    RemoveLastFile,
    ToggleMode,
    Choose(PickerChoice),
}

pub fn shortcut(key: &KeyEvent, popover_open: bool) -> Option<Shortcut> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(Shortcut::Quit),
        KeyCode::Char('o') if ctrl => Some(Shortcut::TogglePopover),
        KeyCode::Char('v') if ctrl => Some(Shortcut::Paste),
        KeyCode::Char('x') if ctrl => Some(Shortcut::Clear),
        KeyCode::Char('r') if ctrl => Some(Shortcut::RemoveLastFile),
        KeyCode::Tab => Some(Shortcut::ToggleMode),
        // Menu entries while the popover is open
        KeyCode::Char('1') if popover_open => Some(Shortcut::Choose(PickerChoice::AnyFile)),
        KeyCode::Char('2') if popover_open => Some(Shortcut::Choose(PickerChoice::ImageOnly)),
        _ => None,
    }
}

pub fn to_key_input(key: &KeyEvent) -> Option<KeyInput> {
    let modifiers = Modifiers {
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        alt: key.modifiers.contains(KeyModifiers::ALT),
    };
    let key = match key.code {
        // Ctrl+J and raw line feeds are what some terminals send for Shift+Enter
        KeyCode::Char('j') if modifiers.ctrl => {
            return Some(KeyInput::new(Key::Enter, Modifiers::SHIFT))
        }
        KeyCode::Char('\n') | KeyCode::Char('\r') => {
            return Some(KeyInput::new(Key::Enter, Modifiers::SHIFT))
        }
        // Alt+Enter likewise, for terminals that cannot report Shift+Enter
        KeyCode::Enter if modifiers.alt => {
            return Some(KeyInput::new(Key::Enter, Modifiers::SHIFT))
        }
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Char(ch) => Key::Char(ch),
        _ => return None,
    };
    Some(KeyInput::new(key, modifiers))
}
