//! Screen definitions for the verso TUI.

pub mod chat;

use crate::app::App;
use crate::ui::layout::centered_fixed;
use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use verso_engine::EXPIRED_MESSAGE;

/// Trait for screens that can be rendered.
pub trait Screen {
    /// Render the screen to the buffer.
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Render the chat screen and whatever overlays are up.
pub fn render_app(app: &App, area: Rect, buf: &mut Buffer) {
    chat::ChatScreen.render(app, area, buf);

    if app.show_expired_modal() {
        render_expired_modal(area, buf);
    }
    if let Some(notice) = app.notice {
        render_notice(notice, area, buf);
    }
}

/// Render the expiration modal.
pub fn render_expired_modal(area: Rect, buf: &mut Buffer) {
    let text = format!(
        "\n{EXPIRED_MESSAGE}\n\nSuscríbete para seguir escribiendo.\n\nverso activate\n\n[Esc] cerrar"
    );

    let width = 44.min(area.width.saturating_sub(4));
    let height = 11.min(area.height.saturating_sub(2));
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Prueba finalizada ")
        .title_style(Styles::countdown_warning())
        .borders(Borders::ALL)
        .border_style(Styles::countdown_warning())
        .style(Styles::default());

    Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Styles::default())
        .render(overlay_area, buf);
}

/// Render a blocking notice on top of everything else.
pub fn render_notice(message: &str, area: Rect, buf: &mut Buffer) {
    let width = 52.min(area.width.saturating_sub(2));
    let height = 7.min(area.height);
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Aviso ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border_active())
        .style(Styles::default());

    Paragraph::new(format!("{message}\n\n[Enter] aceptar"))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Styles::default())
        .render(overlay_area, buf);
}
