//! Multi-line text input widget.
//!
//! Rows are hard-wrapped at the widget width so that the number of rows
//! the widget draws is exactly what [`TextInputState::row_count`] reports.
//! The chat layout uses that count to grow the input box.

use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Prompt on the first row.
const PROMPT: &str = "> ";
/// Indentation of every other row, as wide as the prompt.
const INDENT: &str = "  ";

/// A multi-line text input widget.
#[derive(Debug, Clone)]
pub struct TextInput<'a> {
    content: &'a str,
    /// Cursor position (character index).
    cursor: usize,
    block: Option<Block<'a>>,
    focused: bool,
    placeholder: Option<&'a str>,
}

impl<'a> TextInput<'a> {
    /// Create a new text input with the cursor at the end.
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            cursor: content.chars().count(),
            block: None,
            focused: true,
            placeholder: None,
        }
    }

    /// Set the block for the text input.
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Set focus state. An unfocused input draws no cursor.
    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Set placeholder text, shown while the input is empty.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner.height < 1 || inner.width < 1 {
            return;
        }

        if self.content.is_empty() {
            let mut spans = vec![Span::styled(PROMPT, Styles::active())];
            if self.focused {
                spans.push(Span::styled("_", Styles::active()));
            }
            if let Some(placeholder) = self.placeholder {
                spans.push(Span::styled(placeholder, Styles::dim()));
            }
            Paragraph::new(Line::from(spans)).render(inner, buf);
            return;
        }

        let text = display_text(self.content, self.cursor, self.focused);
        let rows = wrap_rows(&text, inner.width);

        // Keep the cursor row visible once the box is at its height cap.
        let cursor_row = if self.focused {
            let before: String = self.content.chars().take(self.cursor).collect();
            wrap_rows(&before, inner.width).len().saturating_sub(1)
        } else {
            rows.len().saturating_sub(1)
        };
        let skip = (cursor_row + 1).saturating_sub(usize::from(inner.height));

        let lines: Vec<Line<'_>> = rows
            .into_iter()
            .enumerate()
            .skip(skip)
            .map(|(i, row)| {
                if i == 0 {
                    let body = row[PROMPT.len()..].to_string();
                    Line::from(vec![
                        Span::styled(PROMPT, Styles::active()),
                        Span::styled(body, Styles::default()),
                    ])
                } else {
                    Line::from(Span::styled(row, Styles::default()))
                }
            })
            .collect();

        Paragraph::new(lines)
            .style(Styles::default())
            .render(inner, buf);
    }
}

/// Content with the cursor glyph spliced in.
fn display_text(content: &str, cursor: usize, focused: bool) -> String {
    if !focused {
        return content.to_string();
    }
    let mut text = String::with_capacity(content.len() + 1);
    let mut drawn = false;
    for (i, ch) in content.chars().enumerate() {
        if i == cursor {
            text.push(if ch == '\n' { '_' } else { '|' });
            drawn = true;
        }
        text.push(ch);
    }
    if !drawn {
        text.push('_');
    }
    text
}

/// Break `text` into rows no wider than `width` columns.
///
/// Every line break starts a new row, and so does running out of room.
/// The first row carries the prompt; the rest are indented to match.
fn wrap_rows(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width).max(PROMPT.len() + 2);
    let mut rows = Vec::new();

    for (i, line) in text.split('\n').enumerate() {
        let mut row = String::from(if i == 0 { PROMPT } else { INDENT });
        let mut row_width = PROMPT.len();
        for ch in line.chars() {
            let w = ch.width().unwrap_or(0);
            if row_width + w > width {
                rows.push(std::mem::take(&mut row));
                row.push_str(INDENT);
                row_width = INDENT.len();
            }
            row.push(ch);
            row_width += w;
        }
        rows.push(row);
    }
    rows
}

/// State for a text input, managing content and cursor position.
///
/// The cursor is a character index, never a byte offset.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    content: String,
    cursor: usize,
}

impl TextInputState {
    /// Create a new empty text input state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Clear the content.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.content.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Delete the character at the cursor (delete).
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Rows the content takes at `width` columns, cursor included.
    #[allow(clippy::cast_possible_truncation)]
    pub fn row_count(&self, width: u16) -> u16 {
        if self.content.is_empty() {
            return 1;
        }
        let text = display_text(&self.content, self.cursor, true);
        wrap_rows(&text, width).len().min(usize::from(u16::MAX)) as u16
    }

    /// Create a widget from this state.
    pub fn widget(&self) -> TextInput<'_> {
        let mut input = TextInput::new(&self.content);
        input.cursor = self.cursor;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    #[test]
    fn test_text_input_state_basic() {
        let mut state = TextInputState::new();
        assert!(state.is_empty());

        state.insert('H');
        state.insert('i');
        assert_eq!(state.content(), "Hi");
        assert_eq!(state.cursor(), 2);

        state.backspace();
        assert_eq!(state.content(), "H");

        state.clear();
        assert!(state.is_empty());
    }

    #[test]
    fn test_text_input_state_cursor_movement() {
        let mut state = TextInputState::new();
        state.insert_str("Hello");

        state.move_left();
        state.move_left();
        assert_eq!(state.cursor(), 3);

        state.insert('X');
        assert_eq!(state.content(), "HelXlo");

        state.move_home();
        assert_eq!(state.cursor(), 0);

        state.move_end();
        assert_eq!(state.cursor(), 6);
    }

    #[test]
    fn test_multibyte_editing_uses_char_positions() {
        let mut state = TextInputState::new();
        state.insert_str("canción");
        state.move_left();
        state.move_left();
        state.insert('x');
        assert_eq!(state.content(), "cancixón");

        state.backspace();
        state.backspace();
        assert_eq!(state.content(), "cancón");

        state.delete();
        assert_eq!(state.content(), "cancn");
        state.move_end();
        state.insert('🌹');
        assert_eq!(state.content(), "cancn🌹");
        assert_eq!(state.cursor(), 6);
    }

    #[test]
    fn test_row_count_follows_line_breaks_and_wrapping() {
        let mut state = TextInputState::new();
        assert_eq!(state.row_count(20), 1);

        state.insert_str("uno\ndos\ntres");
        assert_eq!(state.row_count(20), 3);

        state.clear();
        // "> " plus 30 chars plus the cursor does not fit in 20 columns.
        state.insert_str(&"a".repeat(30));
        assert_eq!(state.row_count(20), 2);
    }

    #[test]
    fn test_render_empty_shows_placeholder() {
        let state = TextInputState::new();
        let area = Rect::new(0, 0, 30, 1);
        let mut buf = Buffer::empty(area);
        state
            .widget()
            .focused(false)
            .placeholder("Escribe tu mensaje")
            .render(area, &mut buf);
        insta::assert_snapshot!(buffer_to_string(&buf), @"> Escribe tu mensaje");
    }

    #[test]
    fn test_render_multiline_with_cursor() {
        let mut state = TextInputState::new();
        state.insert_str("hola\nmundo");
        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        state.widget().render(area, &mut buf);
        insta::assert_snapshot!(buffer_to_string(&buf), @r"
        > hola
          mundo_
        ");
    }

    #[test]
    fn test_render_scrolls_to_cursor_row() {
        let mut state = TextInputState::new();
        state.insert_str("1\n2\n3\n4");
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        state.widget().render(area, &mut buf);
        assert_eq!(buffer_to_string(&buf), "  3\n  4_");
    }
}
