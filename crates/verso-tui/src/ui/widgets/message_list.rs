//! Scrollable chat log.
//!
//! ```text
//! ┌─ verso ─────────────────────────────┐
//! │ Tú                                  │
//! │   un poema de amor                  │
//! │                                     │
//! │ IA                                  │
//! │   Rosas rojas en la tarde…          │
//! └─────────────────────────────────────┘
//! ```

use crate::ui::theme::{thinking_dots, Styles};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use ratatui::style::Style;
use verso_engine::{Role, GENERATION_ERROR_MESSAGE, THINKING_LABEL};

const CONTENT_INDENT: &str = "  ";

/// Failed exchanges stand out from real replies.
fn content_style(role: Role, content: &str) -> Style {
    if role == Role::Assistant && content == GENERATION_ERROR_MESSAGE {
        Styles::error()
    } else {
        Styles::default()
    }
}

fn role_label(role: Role) -> Line<'static> {
    match role {
        Role::User => Line::from(Span::styled("Tú", Styles::user_label())),
        Role::Assistant => Line::from(Span::styled("IA", Styles::assistant_label())),
    }
}

/// Chat log widget.
pub struct MessageList<'a> {
    entries: Vec<(Role, &'a str)>,
    thinking: bool,
    tick: u64,
    scroll_back: usize,
}

impl<'a> MessageList<'a> {
    /// Create a list over `(role, visible text)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (Role, &'a str)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            thinking: false,
            tick: 0,
            scroll_back: 0,
        }
    }

    /// Show the thinking placeholder after the last entry.
    /// `tick` drives the dot animation.
    #[must_use]
    pub fn thinking(mut self, thinking: bool, tick: u64) -> Self {
        self.thinking = thinking;
        self.tick = tick;
        self
    }

    /// Lines scrolled up from the bottom. Zero follows new output.
    #[must_use]
    pub fn scroll_back(mut self, lines: usize) -> Self {
        self.scroll_back = lines;
        self
    }

    /// Every line of the log wrapped to `width` columns.
    pub fn lines(&self, width: u16) -> Vec<Line<'a>> {
        let wrap_width = usize::from(width)
            .saturating_sub(CONTENT_INDENT.len())
            .max(1);
        let mut lines = Vec::new();

        for (i, (role, content)) in self.entries.iter().enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            lines.push(role_label(*role));
            let style = content_style(*role, content);
            for wrapped in textwrap::wrap(content, wrap_width) {
                lines.push(Line::from(vec![
                    Span::raw(CONTENT_INDENT),
                    Span::styled(wrapped.into_owned(), style),
                ]));
            }
        }

        if self.thinking {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(role_label(Role::Assistant));
            lines.push(Line::from(vec![
                Span::raw(CONTENT_INDENT),
                Span::styled(
                    format!("{THINKING_LABEL}{}", thinking_dots(self.tick)),
                    Styles::thinking(),
                ),
            ]));
        }

        lines
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" verso ")
            .title_style(Styles::title())
            .borders(Borders::ALL)
            .border_style(Styles::border())
            .style(Styles::default());
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let lines = self.lines(inner.width);
        let height = usize::from(inner.height);
        let max_back = lines.len().saturating_sub(height);
        let back = self.scroll_back.min(max_back);
        let start = lines.len().saturating_sub(height + back);

        let visible: Vec<Line<'_>> = lines.into_iter().skip(start).take(height).collect();
        Paragraph::new(visible)
            .style(Styles::default())
            .render(inner, buf);
    }
}
