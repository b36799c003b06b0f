//! # InputBox Component
//!
//! Prompt editor with the generation mode in its title.
//!
//! The buffer is a mirror of the compose text: edits are reported as
//! [`InputEvent::ContentChanged`] and the parent writes them into the core
//! state, then calls [`InputBox::sync`] each frame so resets made by the
//! reducer (after a send, on dictation) show up here. Submit does not clear
//! the buffer for the same reason.
//!
//! Layout is computed once per call as a list of visual rows (byte ranges
//! into the buffer). Word wrapping uses `textwrap`; cursor placement, height
//! and vertical movement all read the same rows.

use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::api::Mode;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2)
const HORIZONTAL_OVERHEAD: u16 = 4;
const VERTICAL_OVERHEAD: u16 = 2;
/// Rows shown before the box scrolls internally
const MAX_VISIBLE_LINES: u16 = 5;
/// Border + padding before the first text column
const TEXT_OFFSET_X: u16 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Submit,
    CycleMode,
    ContentChanged,
}

pub struct InputBox {
    pub buffer: String,
    /// Byte offset into `buffer`, always on a char boundary
    cursor: usize,
    scroll_offset: u16,
    last_width: u16,

    // Props
    pub mode: Mode,
    pub placeholder: String,
    pub attachment: Option<String>,
    pub refining: bool,
    pub listening: bool,
    pub dimmed: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap_options(width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Visual rows of `text` at `width`, as byte ranges. Never empty.
fn layout_rows(text: &str, width: u16) -> Vec<Range<usize>> {
    let mut rows = Vec::new();
    let mut line_start = 0;
    for line in text.split('\n') {
        if line.is_empty() || width == 0 {
            rows.push(line_start..line_start + line.len());
        } else {
            let mut pos = 0;
            for segment in textwrap::wrap(line, wrap_options(width)) {
                let start = line[pos..].find(segment.as_ref()).map_or(pos, |i| pos + i);
                let end = start + segment.len();
                rows.push(line_start + start..line_start + end);
                pos = end;
            }
        }
        line_start += line.len() + 1;
    }
    rows
}

/// Row containing byte offset `pos`.
fn row_of(rows: &[Range<usize>], pos: usize) -> usize {
    rows.iter()
        .rposition(|row| row.start <= pos)
        .unwrap_or(0)
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map_or(0, |(i, _)| i)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map_or(text.len(), |(i, _)| pos + i)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Start of the word before `pos`, skipping any separators first.
fn prev_word_boundary(text: &str, pos: usize) -> usize {
    let before: Vec<(usize, char)> = text[..pos].char_indices().collect();
    let mut i = before.len();
    while i > 0 && !is_word_char(before[i - 1].1) {
        i -= 1;
    }
    while i > 0 && is_word_char(before[i - 1].1) {
        i -= 1;
    }
    before.get(i).map_or(0, |(b, _)| *b)
}

/// End of the word after `pos`, skipping any separators first.
fn next_word_boundary(text: &str, pos: usize) -> usize {
    let mut chars = text[pos..].char_indices().peekable();
    while chars.next_if(|(_, c)| !is_word_char(*c)).is_some() {}
    while chars.next_if(|(_, c)| is_word_char(*c)).is_some() {}
    chars.peek().map_or(text.len(), |(i, _)| pos + i)
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            scroll_offset: 0,
            last_width: 80,
            mode: Mode::default(),
            placeholder: String::new(),
            attachment: None,
            refining: false,
            listening: false,
            dimmed: false,
        }
    }

    /// Mirror the compose text. The cursor moves to the end only when the
    /// text was changed from outside.
    pub fn sync(&mut self, text: &str) {
        if self.buffer != text {
            self.buffer = text.to_string();
            self.cursor = self.buffer.len();
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Box height for the current buffer, clamped to the visible maximum.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let rows = layout_rows(&self.buffer, width.saturating_sub(HORIZONTAL_OVERHEAD));
        (rows.len() as u16).min(MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// Cursor position relative to the text area: (column, row).
    fn cursor_cell(&self, rows: &[Range<usize>]) -> (u16, u16) {
        let row = row_of(rows, self.cursor);
        let start = rows[row].start.min(self.cursor);
        let col = self.buffer[start..self.cursor].chars().count() as u16;
        (col, row as u16)
    }

    fn update_scroll_offset(&mut self, cursor_row: u16) {
        if cursor_row < self.scroll_offset {
            self.scroll_offset = cursor_row;
        } else if cursor_row >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = cursor_row + 1 - MAX_VISIBLE_LINES;
        }
    }

    fn move_vertically(&mut self, down: bool) -> bool {
        let rows = layout_rows(&self.buffer, self.last_width.saturating_sub(HORIZONTAL_OVERHEAD));
        let (col, row) = self.cursor_cell(&rows);
        let row = row as usize;
        let target = if down {
            if row + 1 >= rows.len() {
                return false;
            }
            row + 1
        } else {
            if row == 0 {
                return false;
            }
            row - 1
        };
        let range = rows[target].clone();
        self.cursor = self.buffer[range.clone()]
            .char_indices()
            .nth(col as usize)
            .map_or(range.end, |(i, _)| range.start + i);
        true
    }

    fn title(&self) -> Line<'static> {
        Line::from(format!(" Prompt · Mode: {} ", self.mode.label()))
    }

    fn status_line(&self) -> Option<Line<'static>> {
        let mut parts = Vec::new();
        if self.listening {
            parts.push("Listening...".to_string());
        }
        if let Some(name) = &self.attachment {
            parts.push(format!("📎 {name}"));
        }
        if self.refining {
            parts.push("Refining selected image".to_string());
        }
        (!parts.is_empty()).then(|| Line::from(format!(" {} ", parts.join(" · "))).right_aligned())
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.last_width = area.width;
        let width = area.width.saturating_sub(HORIZONTAL_OVERHEAD);
        let rows = layout_rows(&self.buffer, width);
        let (col, row) = self.cursor_cell(&rows);
        if rows.len() as u16 <= MAX_VISIBLE_LINES {
            self.scroll_offset = 0;
        } else {
            self.update_scroll_offset(row);
        }

        let border_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green)
        };
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .padding(Padding::horizontal(1))
            .title(self.title());
        if let Some(status) = self.status_line() {
            block = block.title_bottom(status);
        }

        let paragraph = if self.buffer.is_empty() {
            Paragraph::new(self.placeholder.clone()).style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
        } else {
            let lines: Vec<Line> = rows
                .iter()
                .skip(self.scroll_offset as usize)
                .take(MAX_VISIBLE_LINES as usize)
                .map(|range| Line::from(self.buffer[range.clone()].to_string()))
                .collect();
            Paragraph::new(lines).style(Style::default().fg(Color::Green))
        };

        frame.render_widget(paragraph.block(block), area);

        if !self.dimmed {
            let x = (area.x + TEXT_OFFSET_X + col).min(area.right().saturating_sub(1));
            let y = area.y + 1 + row.saturating_sub(self.scroll_offset);
            frame.set_cursor_position((x, y));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.cursor, text);
                self.cursor += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => (self.cursor > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.cursor < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                None
            }
            TuiEvent::CursorRight => {
                if self.cursor < self.buffer.len() {
                    self.cursor = next_char_boundary(&self.buffer, self.cursor);
                }
                None
            }
            TuiEvent::WordLeft => {
                self.cursor = prev_word_boundary(&self.buffer, self.cursor);
                None
            }
            TuiEvent::WordRight => {
                self.cursor = next_word_boundary(&self.buffer, self.cursor);
                None
            }
            TuiEvent::CursorHome => {
                self.cursor = self.buffer[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
                None
            }
            TuiEvent::CursorEnd => {
                self.cursor = self.buffer[self.cursor..]
                    .find('\n')
                    .map_or(self.buffer.len(), |i| self.cursor + i);
                None
            }
            TuiEvent::CursorUp => {
                self.move_vertically(false);
                None
            }
            TuiEvent::CursorDown => {
                self.move_vertically(true);
                None
            }
            TuiEvent::Submit => Some(InputEvent::Submit),
            TuiEvent::Tab | TuiEvent::CycleMode => Some(InputEvent::CycleMode),
            _ => None,
        }
    }
}
