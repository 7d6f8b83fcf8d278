//! Stream-side UI state

use ssepack_core::Method;

/// Lines kept in the output pane
const MAX_LINES: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Idle,
    Connecting(Method),
    Open { method: Method, status: u16 },
    Finished(Method),
    Failed { method: Method, error: String },
}

/// Raw streamed text, split into display lines
#[derive(Debug)]
pub struct StreamPane {
    lines: Vec<String>,
    /// Text after the last newline
    partial: String,
    status: StreamStatus,
}

impl Default for StreamPane {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            partial: String::new(),
            status: StreamStatus::Idle,
        }
    }
}

impl StreamPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    pub fn set_status(&mut self, status: StreamStatus) {
        self.status = status;
    }

    /// A new exchange starts on a fresh line
    pub fn begin(&mut self, method: Method, text: &str) {
        self.flush_partial();
        self.push_line(format!("> {method} {text}"));
        self.status = StreamStatus::Connecting(method);
    }

    pub fn append_chunk(&mut self, chunk: &str) {
        self.partial.push_str(chunk);
        while let Some(pos) = self.partial.find('\n') {
            let line = self.partial[..pos].trim_end_matches('\r').to_string();
            self.partial.replace_range(..=pos, "");
            self.push_line(line);
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
        if self.lines.len() > MAX_LINES {
            let excess = self.lines.len() - MAX_LINES;
            self.lines.drain(..excess);
        }
    }

    pub fn flush_partial(&mut self) {
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.push_line(line);
        }
    }

    /// Completed lines plus the line still being received
    pub fn display_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(String::as_str)
            .chain((!self.partial.is_empty()).then_some(self.partial.as_str()))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len() + usize::from(!self.partial.is_empty())
    }
}

/// One exchange per method: pending while in flight, started once it opened
#[derive(Debug, Clone)]
pub struct ModeState {
    current: Method,
    pending: [bool; 2],
    started: [bool; 2],
}

fn slot(method: Method) -> usize {
    match method {
        Method::Get => 0,
        Method::Post => 1,
    }
}

impl ModeState {
    pub fn new(current: Method) -> Self {
        Self {
            current,
            pending: [false; 2],
            started: [false; 2],
        }
    }

    pub fn current(&self) -> Method {
        self.current
    }

    pub fn toggle(&mut self) -> Method {
        self.current = match self.current {
            Method::Get => Method::Post,
            Method::Post => Method::Get,
        };
        self.current
    }

    pub fn can_start(&self, method: Method) -> bool {
        let i = slot(method);
        !self.pending[i] && !self.started[i]
    }

    pub fn is_started(&self, method: Method) -> bool {
        self.started[slot(method)]
    }

    pub fn mark_pending(&mut self, method: Method) {
        self.pending[slot(method)] = true;
    }

    pub fn mark_started(&mut self, method: Method) {
        let i = slot(method);
        self.pending[i] = false;
        self.started[i] = true;
    }

    /// A failed request may be retried
    pub fn mark_failed(&mut self, method: Method) {
        let i = slot(method);
        self.pending[i] = false;
        self.started[i] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_split_on_newlines() {
        let mut pane = StreamPane::new();
        pane.append_chunk("data: he");
        assert_eq!(pane.display_lines().collect::<Vec<_>>(), vec!["data: he"]);

        pane.append_chunk("llo\r\n\ndata: x");
        assert_eq!(
            pane.display_lines().collect::<Vec<_>>(),
            vec!["data: hello", "", "data: x"]
        );
        assert_eq!(pane.line_count(), 3);
    }

    #[test]
    fn test_begin_flushes_partial() {
        let mut pane = StreamPane::new();
        pane.append_chunk("tail");
        pane.begin(Method::Post, "hi");
        assert_eq!(
            pane.display_lines().collect::<Vec<_>>(),
            vec!["tail", "> POST hi"]
        );
        assert_eq!(pane.status(), &StreamStatus::Connecting(Method::Post));
    }

    #[test]
    fn test_line_cap() {
        let mut pane = StreamPane::new();
        for i in 0..MAX_LINES + 5 {
            pane.push_line(i.to_string());
        }
        assert_eq!(pane.line_count(), MAX_LINES);
        assert_eq!(pane.display_lines().next(), Some("5"));
    }

    #[test]
    fn test_one_exchange_per_mode() {
        let mut modes = ModeState::new(Method::Get);
        assert!(modes.can_start(Method::Get));

        modes.mark_pending(Method::Get);
        assert!(!modes.can_start(Method::Get));
        assert!(modes.can_start(Method::Post));

        modes.mark_started(Method::Get);
        assert!(modes.is_started(Method::Get));
        assert!(!modes.can_start(Method::Get));

        modes.mark_pending(Method::Post);
        modes.mark_failed(Method::Post);
        assert!(modes.can_start(Method::Post));
    }

    #[test]
    fn test_toggle() {
        let mut modes = ModeState::new(Method::Get);
        assert_eq!(modes.toggle(), Method::Post);
        assert_eq!(modes.toggle(), Method::Get);
    }
}
