//! Content-driven sizing for the draft text area
//!
//! Resizing is an explicit two-step contract: collapse the element to a neutral
//! baseline, then measure, clamp and apply. A box reports at least its own current
//! height as content height, so measuring without the collapse never shrinks.

use unicode_width::UnicodeWidthChar;

/// Height of an empty draft
pub const BASE_HEIGHT: u32 = 36;
pub const MIN_HEIGHT: u32 = 36;
pub const MAX_HEIGHT: u32 = 160;
/// Above this the composer switches to the expanded layout
pub const SINGLE_LINE_HEIGHT: u32 = 44;

pub const LINE_HEIGHT: u32 = 20;
/// Top + bottom padding inside the text area
pub const VERTICAL_PADDING: u32 = 16;

/// An element whose height follows its content
pub trait TextMeasure {
    /// Apply a rendered height in pixels
    fn set_height(&mut self, px: u32);

    /// Natural content height for `text`, never less than the current height
    fn scroll_height(&self, text: &str) -> u32;
}

/// Run the collapse-then-measure sequence and return the applied height
pub fn auto_resize<M: TextMeasure + ?Sized>(el: &mut M, text: &str) -> u32 {
    if text.is_empty() {
        el.set_height(BASE_HEIGHT);
        return BASE_HEIGHT;
    }

    el.set_height(0);
    let next = el.scroll_height(text).clamp(MIN_HEIGHT, MAX_HEIGHT);
    el.set_height(next);
    next
}

/// Expanded (multi-row) layout vs. compact single line
pub fn is_expanded(height: u32, text: &str, attachment_count: usize) -> bool {
    height > SINGLE_LINE_HEIGHT || text.contains('\n') || attachment_count > 0
}

/// Headless text area that wraps by display width at a fixed column count
#[derive(Debug, Clone)]
pub struct WrappedTextMeasure {
    columns: usize,
    height: u32,
}

impl WrappedTextMeasure {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            height: BASE_HEIGHT,
        }
    }

    /// Change the wrap width (e.g. on terminal resize)
    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Default for WrappedTextMeasure {
    fn default() -> Self {
        Self::new(80)
    }
}

impl TextMeasure for WrappedTextMeasure {
    fn set_height(&mut self, px: u32) {
        self.height = px;
    }

    fn scroll_height(&self, text: &str) -> u32 {
        let lines = wrapped_line_count(text, self.columns) as u32;
        let content = lines * LINE_HEIGHT + VERTICAL_PADDING;
        content.max(self.height)
    }
}

/// Hard-wrap `text` at `columns` display cells, breaking on explicit newlines
pub fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    wrap_with_offsets(text, columns)
        .into_iter()
        .map(|(start, end)| text[start..end].to_string())
        .collect()
}

/// Visual (row, column) of a byte cursor in the wrapped text
pub fn visual_cursor(text: &str, cursor: usize, columns: usize) -> (usize, usize) {
    let lines = wrap_with_offsets(text, columns);
    let mut position = (0, 0);
    for (row, (start, end)) in lines.iter().enumerate() {
        if cursor < *start {
            break;
        }
        if cursor <= *end {
            let col = text[*start..cursor]
                .chars()
                .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(1))
                .sum();
            position = (row, col);
            break;
        }
    }
    position
}

/// Byte ranges of each visual line (newlines excluded)
fn wrap_with_offsets(text: &str, columns: usize) -> Vec<(usize, usize)> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    let mut current_width = 0;

    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            lines.push((start, idx));
            start = idx + 1;
            current_width = 0;
            continue;
        }

        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if current_width + ch_width > columns && idx > start {
            lines.push((start, idx));
            start = idx;
            current_width = 0;
        }
        current_width += ch_width;
    }

    lines.push((start, text.len()));
    lines
}

/// Number of visual lines `text` occupies when hard-wrapped at `columns`
pub fn wrapped_line_count(text: &str, columns: usize) -> usize {
    if text.is_empty() {
        return 1;
    }

    let mut lines = 0;
    let mut current_width = 0;
    let mut current_empty = true;

    for ch in text.chars() {
        if ch == '\n' {
            lines += 1;
            current_width = 0;
            current_empty = true;
            continue;
        }

        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
        if current_width + ch_width > columns && !current_empty {
            lines += 1;
            current_width = 0;
        }
        current_width += ch_width;
        current_empty = false;
    }

    // Last line (also the empty line after a trailing newline)
    lines + 1
}
