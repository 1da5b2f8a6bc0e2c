//! Trial countdown bar for the top of the screen.

use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Paragraph, Widget},
};
use verso_engine::CountdownDisplay;

/// One-line countdown bar.
///
/// Draws nothing for [`CountdownDisplay::Hidden`].
pub struct CountdownBar<'a> {
    display: &'a CountdownDisplay,
}

impl<'a> CountdownBar<'a> {
    pub fn new(display: &'a CountdownDisplay) -> Self {
        Self { display }
    }
}

impl Widget for CountdownBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }
        let (text, style) = match self.display {
            CountdownDisplay::Hidden => return,
            CountdownDisplay::Running { text, warning } => {
                let style = if *warning {
                    Styles::countdown_warning()
                } else {
                    Styles::countdown()
                };
                (format!("⏳ Prueba gratuita: {text}"), style)
            }
            CountdownDisplay::Expired { message } => {
                ((*message).to_string(), Styles::countdown_warning())
            }
        };

        Paragraph::new(Line::from(text))
            .alignment(Alignment::Center)
            .style(style)
            .render(area, buf);
    }
}
