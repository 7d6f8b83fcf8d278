//! Draft editing at the cursor

use super::Composer;
use crate::resize::TextMeasure;

impl<M: TextMeasure> Composer<M> {
    pub(super) fn insert_at_cursor(&mut self, text: &str) {
        self.text.insert_str(self.cursor, text);
        self.cursor += text.len();
        self.text_changed();
    }

    pub(super) fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let mut char_start = self.cursor - 1;
        while char_start > 0 && !self.text.is_char_boundary(char_start) {
            char_start -= 1;
        }
        self.text.drain(char_start..self.cursor);
        self.cursor = char_start;
        self.text_changed();
        true
    }

    pub(super) fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        let mut char_end = self.cursor + 1;
        while char_end < self.text.len() && !self.text.is_char_boundary(char_end) {
            char_end += 1;
        }
        self.text.drain(self.cursor..char_end);
        self.text_changed();
        true
    }

    pub(super) fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let mut new_pos = self.cursor - 1;
        while new_pos > 0 && !self.text.is_char_boundary(new_pos) {
            new_pos -= 1;
        }
        self.cursor = new_pos;
        true
    }

    pub(super) fn move_right(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        let mut new_pos = self.cursor + 1;
        while new_pos < self.text.len() && !self.text.is_char_boundary(new_pos) {
            new_pos += 1;
        }
        self.cursor = new_pos;
        true
    }

    /// Start of the current logical line
    pub(super) fn move_line_start(&mut self) -> bool {
        let start = self.text[..self.cursor]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let moved = start != self.cursor;
        self.cursor = start;
        moved
    }

    /// End of the current logical line
    pub(super) fn move_line_end(&mut self) -> bool {
        let end = self.text[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.text.len());
        let moved = end != self.cursor;
        self.cursor = end;
        moved
    }
}
