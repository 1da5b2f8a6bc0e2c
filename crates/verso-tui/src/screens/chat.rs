//! Chat screen: countdown, log, input box, and footer.

use crate::app::App;
use crate::screens::Screen;
use crate::ui::layout::chat_layout;
use crate::ui::theme::Styles;
use crate::ui::widgets::{CountdownBar, Footer, MessageList, SendControl};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Block, Borders, Widget},
};
use verso_engine::CountdownDisplay;

const INPUT_PLACEHOLDER: &str = "Escribe tu mensaje...";
const LOCKED_PLACEHOLDER: &str = "Prueba finalizada";

/// The chat screen.
pub struct ChatScreen;

impl Screen for ChatScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let display = app.gate.display();
        let show_countdown = display != CountdownDisplay::Hidden;
        let areas = chat_layout(area, app.input_rows(), show_countdown);

        CountdownBar::new(&display).render(areas.countdown, buf);

        MessageList::new(app.session.visible_entries())
            .thinking(app.session.is_thinking(), app.tick_count)
            .scroll_back(app.scroll_back)
            .render(areas.messages, buf);

        let control = app.send_control();
        let (title, border) = match control {
            SendControl::Enabled => (" Mensaje ", Styles::border_active()),
            SendControl::Sending => (" Mensaje · enviando ", Styles::border()),
            SendControl::Locked => (" Mensaje · bloqueado ", Styles::border()),
        };
        let block = Block::default()
            .title(title)
            .title_style(Styles::title())
            .borders(Borders::ALL)
            .border_style(border)
            .style(Styles::default());
        let enabled = control != SendControl::Locked;
        app.input
            .widget()
            .block(block)
            .focused(enabled)
            .placeholder(if enabled {
                INPUT_PLACEHOLDER
            } else {
                LOCKED_PLACEHOLDER
            })
            .render(areas.input, buf);

        let scroll_hint = (app.scroll_back > 0).then_some("↑ historial");
        let mut footer = Footer::new(control);
        if let Some(hint) = scroll_hint {
            footer = footer.right(hint);
        }
        footer.render(areas.footer, buf);
    }
}
