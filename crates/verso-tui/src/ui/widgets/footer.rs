//! Key-hint footer with the send control indicator.

use crate::ui::theme::{Palette, Styles};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

/// A key hint for the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHint {
    pub key: &'static str,
    pub label: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// State of the send control, shown at the left of the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendControl {
    /// Ready to send.
    Enabled,
    /// A request is in flight.
    Sending,
    /// Trial over.
    Locked,
}

impl SendControl {
    pub fn label(self) -> &'static str {
        match self {
            Self::Enabled => "Enviar",
            Self::Sending => "Enviando",
            Self::Locked => "Bloqueado",
        }
    }

    fn style(self) -> Style {
        match self {
            Self::Enabled => Styles::default().bg(Palette::ACCENT).fg(Palette::BG),
            Self::Sending => Styles::default().bg(Palette::DIM).fg(Palette::BG),
            Self::Locked => Styles::countdown_warning(),
        }
    }

    /// Hints that apply in this state.
    pub fn hints(self) -> Vec<KeyHint> {
        let mut hints = Vec::new();
        if self == Self::Enabled {
            hints.push(KeyHint::new("Enter", "enviar"));
            hints.push(KeyHint::new("Shift+Enter", "nueva línea"));
        }
        hints.push(KeyHint::new("PgUp/PgDn", "desplazar"));
        if self == Self::Locked {
            hints.push(KeyHint::new("Esc", "cerrar aviso"));
        }
        hints.push(KeyHint::new("Ctrl+C", "salir"));
        hints
    }
}

/// Footer widget displayed at the bottom of the screen.
#[derive(Debug, Clone)]
pub struct Footer<'a> {
    control: SendControl,
    hints: Vec<KeyHint>,
    right_text: Option<&'a str>,
}

impl<'a> Footer<'a> {
    /// Create a footer with the default hints for `control`.
    pub fn new(control: SendControl) -> Self {
        Self {
            control,
            hints: control.hints(),
            right_text: None,
        }
    }

    /// Set right-aligned text.
    #[must_use]
    pub fn right(mut self, text: &'a str) -> Self {
        self.right_text = Some(text);
        self
    }
}

impl Widget for Footer<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        for x in area.x..area.x.saturating_add(area.width) {
            buf[(x, area.y)].set_char(' ').set_bg(Palette::STATUS_BG);
        }

        let mut spans = vec![
            Span::styled(format!(" {} ", self.control.label()), self.control.style()),
            Span::styled(" ", Styles::status_bar()),
        ];
        for hint in &self.hints {
            spans.push(Span::styled(format!(" {} ", hint.key), Styles::key_hint()));
            spans.push(Span::styled(format!(" {} ", hint.label), Styles::key_label()));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        if let Some(text) = self.right_text {
            let text_width = text.width().min(usize::from(u16::MAX)) as u16;
            if text_width < area.width {
                let x = area.x + area.width - text_width - 1;
                buf.set_string(x, area.y, text, Styles::status_bar());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    fn render(footer: Footer<'_>, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        footer.render(area, &mut buf);
        buffer_to_string(&buf)
    }

    #[test]
    fn test_enabled_footer() {
        assert_eq!(
            render(Footer::new(SendControl::Enabled), 100),
            " Enviar   Enter  enviar  Shift+Enter  nueva línea  PgUp/PgDn  desplazar  Ctrl+C  salir"
        );
    }

    #[test]
    fn test_sending_footer_drops_send_hints() {
        let hints = SendControl::Sending.hints();
        assert!(!hints.iter().any(|h| h.key == "Enter"));
        assert!(render(Footer::new(SendControl::Sending), 80).starts_with(" Enviando "));
    }

    #[test]
    fn test_locked_footer_offers_dismiss() {
        let out = render(Footer::new(SendControl::Locked), 80);
        assert!(out.starts_with(" Bloqueado "));
        assert!(out.contains("cerrar aviso"));
    }

    #[test]
    fn test_right_text_is_right_aligned() {
        let out = render(Footer::new(SendControl::Sending).right("v0.1"), 80);
        assert!(out.ends_with("v0.1"));
    }
}
