//! Frame rendering
//!
//! Pixel heights from the composer map onto terminal rows: one row per
//! `LINE_HEIGHT`, padding dropped. Clickable areas are recorded each frame.

use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};
use ratatui::Frame;
use ssepack_core::resize::{LINE_HEIGHT, VERTICAL_PADDING};
use ssepack_core::{
    visual_cursor, wrap_lines, ComposerConfig, ComposerView, Method, PickerChoice, PreviewItem,
    Region,
};
use unicode_width::UnicodeWidthStr;

use super::app::App;
use super::state::StreamStatus;

const BUTTON_WIDTH: u16 = 3;
const MENU_WIDTH: u16 = 20;
const MENU_HEIGHT: u16 = 4;

const ADD_ICON: &str = "[+]";
const CLEAR_ICON: &str = "[⌫]";
const MIC_ICON: &str = "[◉]";
const SEND_ICON: &str = "[➤]";
const REMOVE_ICON: &str = "✕";

/// Clickable areas of the last frame
#[derive(Debug, Clone, Default)]
pub struct HitAreas {
    pub add: Rect,
    pub text: Rect,
    pub send: Rect,
    pub clear: Option<Rect>,
    pub menu_items: Vec<(Rect, PickerChoice)>,
    pub chip_removes: Vec<(Rect, usize)>,
}

impl HitAreas {
    pub fn menu_item_at(&self, pos: Position) -> Option<PickerChoice> {
        self.menu_items
            .iter()
            .find(|(rect, _)| rect.contains(pos))
            .map(|(_, choice)| *choice)
    }

    pub fn chip_remove_at(&self, pos: Position) -> Option<usize> {
        self.chip_removes
            .iter()
            .find(|(rect, _)| rect.contains(pos))
            .map(|(_, index)| *index)
    }
}

/// Text area width for a terminal `width`; the wrap width of the measure
pub fn input_columns(width: u16, config: &ComposerConfig) -> u16 {
    let mut reserved = 2 + BUTTON_WIDTH + 1 + 1 + BUTTON_WIDTH;
    if config.use_clear {
        reserved += BUTTON_WIDTH;
    }
    if config.use_audio {
        reserved += BUTTON_WIDTH;
    }
    width.saturating_sub(reserved).max(1)
}

/// Visible text rows for a composer height in pixels
pub fn text_rows(height: u32) -> u16 {
    let rows = height.saturating_sub(VERTICAL_PADDING) / LINE_HEIGHT;
    u16::try_from(rows).unwrap_or(u16::MAX).max(1)
}

fn region(rect: Rect) -> Region {
    Region::new(
        i32::from(rect.x),
        i32::from(rect.y),
        i32::from(rect.width),
        i32::from(rect.height),
    )
}

struct InputLayout {
    add: Rect,
    text: Rect,
    clear: Option<Rect>,
    mic: Option<Rect>,
    send: Rect,
}

fn input_layout(inner: Rect, config: &ComposerConfig, expanded: bool) -> InputLayout {
    let columns = input_columns(inner.width + 2, config);
    // Compact layout centers the buttons, expanded pins them to the last row
    let button_y = if expanded {
        inner.bottom().saturating_sub(1)
    } else {
        inner.y + inner.height / 2
    };
    let button = |x: u16| Rect::new(x, button_y, BUTTON_WIDTH, 1).intersection(inner);

    let add = button(inner.x);
    let text = Rect::new(inner.x + BUTTON_WIDTH + 1, inner.y, columns, inner.height)
        .intersection(inner);

    let mut x = text.right();
    let clear = config.use_clear.then(|| {
        let rect = button(x);
        x += BUTTON_WIDTH;
        rect
    });
    let mic = config.use_audio.then(|| {
        let rect = button(x);
        x += BUTTON_WIDTH;
        rect
    });
    let send = button(x + 1);

    InputLayout {
        add,
        text,
        clear,
        mic,
        send,
    }
}

fn menu_rect(add: Rect, screen: Rect) -> Rect {
    let y = if add.y >= MENU_HEIGHT {
        add.y - MENU_HEIGHT
    } else {
        add.bottom()
    };
    Rect::new(add.x, y, MENU_WIDTH, MENU_HEIGHT).intersection(screen)
}

fn chip_tag(item: &PreviewItem) -> String {
    match (item.thumbnail, item.dimensions) {
        (Some(_), Some((w, h))) => format!("IMG {w}x{h}"),
        (Some(_), None) => "IMG".to_string(),
        (None, _) => item.label.clone(),
    }
}

impl App {
    pub fn ui(&mut self, f: &mut Frame) {
        let view = self.composer.view(&self.host);
        let chip_rows = u16::from(!view.previews.is_empty());
        let composer_height = text_rows(view.height) + chip_rows + 2;

        let [stream_area, composer_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(composer_height),
            Constraint::Length(1),
        ])
        .areas(f.area());

        let mut hits = HitAreas::default();
        self.render_stream(f, stream_area);
        self.render_composer(f, composer_area, &view, &mut hits);
        self.render_status(f, status_area);

        let menu = menu_rect(hits.add, f.area());
        self.composer.set_popover_root(region(hits.add.union(menu)));
        if view.popover_open {
            self.render_menu(f, menu, &mut hits);
        }

        self.hits = hits;
    }

    fn render_stream(&self, f: &mut Frame, area: Rect) {
        let (label, color) = match self.pane.status() {
            StreamStatus::Idle => ("idle".to_string(), self.theme.dim_color),
            StreamStatus::Connecting(method) => {
                (format!("{method} connecting"), self.theme.warning_color)
            }
            StreamStatus::Open { method, status } => {
                (format!("{method} {status}"), self.theme.success_color)
            }
            StreamStatus::Finished(method) => (format!("{method} done"), self.theme.dim_color),
            StreamStatus::Failed { method, .. } => {
                (format!("{method} failed"), self.theme.error_color)
            }
        };
        let title = Line::from(vec![
            Span::raw(format!(
                " {}{} ",
                self.config.stream.base_url.trim_end_matches('/'),
                self.config.stream.path
            )),
            Span::styled(format!("[{label}] "), Style::default().fg(color)),
        ]);
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(self.theme.border_color));

        let height = usize::from(block.inner(area).height);
        let skip = self.pane.line_count().saturating_sub(height);
        let lines: Vec<Line> = self
            .pane
            .display_lines()
            .skip(skip)
            .map(|line| Line::from(line.to_string()))
            .collect();
        f.render_widget(
            Paragraph::new(lines)
                .style(Style::default().fg(self.theme.text_color))
                .block(block),
            area,
        );
    }

    fn render_composer(&self, f: &mut Frame, area: Rect, view: &ComposerView, hits: &mut HitAreas) {
        let border = if view.focused {
            self.theme.focus_border_color
        } else {
            self.theme.border_color
        };
        let block = Block::bordered().border_style(Style::default().fg(border));
        let mut inner = block.inner(area);
        f.render_widget(block, area);

        if !view.previews.is_empty() {
            let chips = Rect::new(inner.x, inner.y, inner.width, 1);
            self.render_chips(f, chips, view, hits);
            inner.y += 1;
            inner.height = inner.height.saturating_sub(1);
        }

        let config = self.composer.config();
        let layout = input_layout(inner, config, view.expanded);
        hits.add = layout.add;
        hits.text = layout.text;
        hits.send = layout.send;

        let add_style = if view.popover_open {
            Style::default().fg(self.theme.accent_color)
        } else {
            Style::default().fg(self.theme.text_color)
        };
        f.render_widget(Paragraph::new(Span::styled(ADD_ICON, add_style)), layout.add);

        self.render_text(f, layout.text, view);

        if let Some(rect) = layout.clear {
            if view.shows_clear {
                f.render_widget(
                    Paragraph::new(Span::styled(CLEAR_ICON, Style::default().fg(self.theme.text_color))),
                    rect,
                );
                hits.clear = Some(rect);
            }
        }
        if let (Some(rect), true) = (layout.mic, view.shows_audio) {
            // Presentational only
            f.render_widget(
                Paragraph::new(Span::styled(MIC_ICON, Style::default().fg(self.theme.dim_color))),
                rect,
            );
        }

        let send_style = if view.can_send {
            Style::default()
                .fg(self.theme.accent_color)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.dim_color)
        };
        f.render_widget(Paragraph::new(Span::styled(SEND_ICON, send_style)), layout.send);
    }

    fn render_text(&self, f: &mut Frame, area: Rect, view: &ComposerView) {
        if area.is_empty() {
            return;
        }
        let columns = usize::from(area.width);

        let (paragraph, (row, col)) = if view.text.is_empty() {
            let placeholder = Span::styled(
                view.placeholder.as_str(),
                Style::default().fg(self.theme.dim_color),
            );
            (Paragraph::new(placeholder), (0, 0))
        } else {
            let (cursor_row, cursor_col) = visual_cursor(&view.text, view.cursor, columns);
            let rows = usize::from(area.height);
            let first = (cursor_row + 1).saturating_sub(rows);
            let lines: Vec<Line> = wrap_lines(&view.text, columns)
                .into_iter()
                .skip(first)
                .take(rows)
                .map(Line::from)
                .collect();
            (
                Paragraph::new(lines).style(Style::default().fg(self.theme.text_color)),
                (cursor_row - first, cursor_col),
            )
        };
        f.render_widget(paragraph, area);

        if view.focused && !view.popover_open && !self.selector.is_open() {
            let x = area.x + u16::try_from(col.min(columns - 1)).unwrap_or(0);
            let y = area.y + u16::try_from(row).unwrap_or(0);
            f.set_cursor_position(Position::new(x, y));
        }
    }

    fn render_chips(&self, f: &mut Frame, area: Rect, view: &ComposerView, hits: &mut HitAreas) {
        let chip = Style::default()
            .fg(self.theme.text_color)
            .bg(self.theme.chip_bg_color);
        let remove = Style::default()
            .fg(self.theme.error_color)
            .bg(self.theme.chip_bg_color);

        let mut spans = Vec::new();
        let mut x = area.x;
        for item in &view.previews {
            let body = format!(" {} {} {} ", chip_tag(item), item.name, item.size_label);
            let width = u16::try_from(body.width()).unwrap_or(u16::MAX);
            if x.saturating_add(width.saturating_add(2)) > area.right() {
                spans.push(Span::styled("…", Style::default().fg(self.theme.dim_color)));
                break;
            }
            hits.chip_removes
                .push((Rect::new(x + width, area.y, 1, 1), item.index));
            spans.push(Span::styled(body, chip));
            spans.push(Span::styled(REMOVE_ICON, remove));
            spans.push(Span::raw(" "));
            x += width + 2;
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_menu(&self, f: &mut Frame, area: Rect, hits: &mut HitAreas) {
        let block = Block::bordered()
            .border_style(Style::default().fg(self.theme.accent_color))
            .style(Style::default().bg(self.theme.menu_bg_color));
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        let choices = [PickerChoice::AnyFile, PickerChoice::ImageOnly];
        for (i, choice) in choices.into_iter().enumerate() {
            let row = Rect::new(inner.x, inner.y + i as u16, inner.width, 1).intersection(inner);
            if row.is_empty() {
                continue;
            }
            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", i + 1),
                    Style::default().fg(self.theme.accent_color),
                ),
                Span::styled(choice.label(), Style::default().fg(self.theme.text_color)),
            ]);
            f.render_widget(Paragraph::new(line), row);
            hits.menu_items.push((row, choice));
        }
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        if let Some(request) = self.selector.request() {
            let mut spans = vec![
                Span::styled(
                    format!("Attach ({}): ", request.accept),
                    Style::default().fg(self.theme.accent_color),
                ),
                Span::raw(self.selector.buffer().to_string()),
            ];
            if let Some(error) = self.selector.error() {
                spans.push(Span::styled(
                    format!("  {error}"),
                    Style::default().fg(self.theme.error_color),
                ));
            }
            let prompt_width = spans[0].width() + spans[1].width();
            f.render_widget(Paragraph::new(Line::from(spans)), area);
            let x = area.x + u16::try_from(prompt_width).unwrap_or(0);
            f.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let mode = |method: Method| {
            let marker = if self.modes.is_started(method) { "●" } else { "○" };
            let style = if self.modes.current() == method {
                Style::default()
                    .fg(self.theme.accent_color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.dim_color)
            };
            Span::styled(format!(" {method} {marker} "), style)
        };

        let mut spans = vec![mode(Method::Get), mode(Method::Post)];
        match &self.notice {
            Some(notice) => spans.push(Span::styled(
                format!(" {notice}"),
                Style::default().fg(self.theme.warning_color),
            )),
            None => spans.push(Span::styled(
                " Enter send · Shift+Enter newline · Ctrl+O attach · Ctrl+V paste · Tab mode · Ctrl+C quit",
                Style::default().fg(self.theme.dim_color),
            )),
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
