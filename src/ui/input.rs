//! Input box component with word-wrap and cursor positioning
//!
//! Ratatui's `Paragraph` wraps on word boundaries but doesn't expose where text
//! ends up after wrapping. We pre-wrap with `textwrap` and compute the cursor
//! from the same wrapped output, so cursor and display stay in sync. `textwrap`
//! trims trailing spaces, so those are counted separately.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

const MASK_CHAR: char = '•';

/// Editable text buffer with history
#[derive(Debug, Clone, Default)]
pub struct InputBox {
    content: String,
    /// Byte offset into `content`
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    masked: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// An input that renders its content as bullets (for tokens)
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Set the content and move cursor to end
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.cursor = self.content.len();
    }

    /// Text as it appears on screen
    fn display_string(&self) -> String {
        if self.masked {
            MASK_CHAR.to_string().repeat(self.content.chars().count())
        } else {
            self.content.clone()
        }
    }

    /// Cursor byte offset within `display_string`
    fn display_cursor(&self) -> usize {
        if self.masked {
            self.content[..self.cursor].chars().count() * MASK_CHAR.len_utf8()
        } else {
            self.cursor
        }
    }

    /// Calculate required height for the input box given a width
    pub fn required_height(&self, width: u16) -> u16 {
        let inner_width = width.saturating_sub(2) as usize;
        if inner_width == 0 {
            return 3;
        }
        let wrapped = wrap_text(&self.display_string(), inner_width);
        (wrapped.len() as u16 + 2).max(3)
    }

    /// Insert a character at the cursor position
    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert a newline (ignored for masked inputs)
    pub fn insert_newline(&mut self) {
        if !self.masked {
            self.insert_char('\n');
        }
    }

    /// Delete the character before the cursor
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut new_pos = self.cursor - 1;
        while !self.content.is_char_boundary(new_pos) && new_pos > 0 {
            new_pos -= 1;
        }
        self.content.drain(new_pos..self.cursor);
        self.cursor = new_pos;
    }

    /// Delete the character at the cursor
    pub fn delete_char_forward(&mut self) {
        if self.cursor >= self.content.len() {
            return;
        }
        let mut end = self.cursor + 1;
        while !self.content.is_char_boundary(end) && end < self.content.len() {
            end += 1;
        }
        self.content.drain(self.cursor..end);
    }

    /// Move cursor left
    pub fn move_cursor_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut new_pos = self.cursor - 1;
        while !self.content.is_char_boundary(new_pos) && new_pos > 0 {
            new_pos -= 1;
        }
        self.cursor = new_pos;
    }

    /// Move cursor right
    pub fn move_cursor_right(&mut self) {
        if self.cursor >= self.content.len() {
            return;
        }
        let mut new_pos = self.cursor + 1;
        while !self.content.is_char_boundary(new_pos) && new_pos < self.content.len() {
            new_pos += 1;
        }
        self.cursor = new_pos;
    }

    pub fn move_cursor_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.content.len();
    }

    /// Clear the input
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.history_index = None;
    }

    /// Take the current content, adding it to history (unless masked)
    pub fn submit(&mut self) -> String {
        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        self.history_index = None;

        if !self.masked && !content.trim().is_empty() {
            self.history.push(content.clone());
        }

        content
    }

    /// Navigate to previous history item
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }

        let new_index = match self.history_index {
            Some(0) => 0,
            Some(i) => i - 1,
            None => self.history.len() - 1,
        };

        self.history_index = Some(new_index);
        self.set_content(&self.history[new_index].clone());
    }

    /// Navigate to next history item
    pub fn history_next(&mut self) {
        if self.history.is_empty() {
            return;
        }

        match self.history_index {
            Some(i) if i < self.history.len() - 1 => {
                self.history_index = Some(i + 1);
                self.set_content(&self.history[i + 1].clone());
            }
            Some(_) => {
                self.history_index = None;
                self.content.clear();
                self.cursor = 0;
            }
            None => {}
        }
    }

    /// Render the input box with a title
    pub fn widget<'a>(&'a self, title: &'a str) -> InputBoxWidget<'a> {
        InputBoxWidget {
            state: self,
            title,
            placeholder: "",
            focused: true,
        }
    }
}

/// Input box widget for rendering
pub struct InputBoxWidget<'a> {
    state: &'a InputBox,
    title: &'a str,
    placeholder: &'a str,
    focused: bool,
}

impl<'a> InputBoxWidget<'a> {
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for InputBoxWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {} ", self.title));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let display = self.state.display_string();
        let wrapped_lines = wrap_text(&display, inner.width as usize);

        let paragraph = if self.state.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                self.placeholder,
                Style::default().fg(Color::DarkGray),
            )))
        } else {
            let lines: Vec<Line> = wrapped_lines.iter().map(|s| Line::from(s.as_str())).collect();
            Paragraph::new(lines)
        };
        paragraph.render(inner, buf);

        if !self.focused {
            return;
        }

        let (cursor_x, cursor_y) =
            cursor_position_in_wrapped(&display, self.state.display_cursor(), &wrapped_lines);

        if cursor_y < inner.height as usize {
            let x = inner.x + cursor_x as u16;
            let y = inner.y + cursor_y as u16;

            if x < inner.x + inner.width && y < inner.y + inner.height {
                buf[(x, y)].set_style(Style::default().bg(Color::White).fg(Color::Black));
            }
        }
    }
}

/// Wrap text into lines, handling explicit newlines
fn wrap_text(content: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![content.to_string()];
    }

    let mut result = Vec::new();
    for paragraph in content.split('\n') {
        if paragraph.is_empty() {
            result.push(String::new());
        } else {
            for line in wrap(paragraph, width) {
                result.push(line.into_owned());
            }
        }
    }
    if result.is_empty() {
        result.push(String::new());
    }
    result
}

/// Calculate cursor (x, y) position within wrapped lines
fn cursor_position_in_wrapped(content: &str, byte_pos: usize, wrapped_lines: &[String]) -> (usize, usize) {
    let text_before_cursor = &content[..byte_pos];

    // A newline right before the cursor puts it at the start of the next line
    let newlines = text_before_cursor.matches('\n').count();
    if text_before_cursor.ends_with('\n') {
        let line = wrapped_lines_before(content, byte_pos, wrapped_lines.len());
        return (0, line.max(newlines));
    }

    // Count trailing spaces that textwrap might have trimmed
    let trailing_spaces = text_before_cursor.chars().rev().take_while(|&c| c == ' ').count();

    // Newlines are not part of the wrapped output
    let chars_before = text_before_cursor.chars().filter(|&c| c != '\n').count();
    let target = chars_before - trailing_spaces;

    let mut chars_consumed = 0usize;
    for (line_idx, line) in wrapped_lines.iter().enumerate() {
        let line_chars = line.chars().count();

        if line_idx >= newlines && chars_consumed + line_chars >= target {
            let col = target.saturating_sub(chars_consumed);
            let prefix: String = line.chars().take(col).collect();
            return (prefix.width() + trailing_spaces, line_idx);
        }

        chars_consumed += line_chars;
    }

    // Cursor at end
    let last_line_width = wrapped_lines.last().map(|s| s.width()).unwrap_or(0);
    (last_line_width + trailing_spaces, wrapped_lines.len().saturating_sub(1))
}

/// Index of the wrapped line that starts right after `byte_pos`
fn wrapped_lines_before(content: &str, byte_pos: usize, total: usize) -> usize {
    let before = &content[..byte_pos];
    let paragraphs = before.split('\n').count();
    paragraphs.saturating_sub(1).min(total.saturating_sub(1))
}
