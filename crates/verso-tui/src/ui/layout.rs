//! Layout helpers for the verso TUI.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Input box never grows past this many text lines.
pub const MAX_INPUT_LINES: u16 = 8;

/// Areas of the chat screen, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatAreas {
    pub countdown: Rect,
    pub messages: Rect,
    pub input: Rect,
    pub footer: Rect,
}

/// Create a centered rect with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Split the screen for chat.
///
/// `input_lines` is the number of text lines in the input box; the box
/// grows with it up to [`MAX_INPUT_LINES`]. A hidden countdown takes no
/// space.
pub fn chat_layout(area: Rect, input_lines: u16, show_countdown: bool) -> ChatAreas {
    let input_height = input_lines.clamp(1, MAX_INPUT_LINES) + 2;
    let countdown_height = u16::from(show_countdown);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(countdown_height),
            Constraint::Min(3),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(area);

    ChatAreas {
        countdown: chunks[0],
        messages: chunks[1],
        input: chunks[2],
        footer: chunks[3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_box_grows_with_lines_and_caps() {
        let area = Rect::new(0, 0, 80, 40);
        assert_eq!(chat_layout(area, 1, true).input.height, 3);
        assert_eq!(chat_layout(area, 4, true).input.height, 6);
        assert_eq!(chat_layout(area, 50, true).input.height, MAX_INPUT_LINES + 2);
    }

    #[test]
    fn test_hidden_countdown_gives_space_to_messages() {
        let area = Rect::new(0, 0, 80, 24);
        let shown = chat_layout(area, 1, true);
        let hidden = chat_layout(area, 1, false);
        assert_eq!(shown.countdown.height, 1);
        assert_eq!(hidden.countdown.height, 0);
        assert_eq!(hidden.messages.height, shown.messages.height + 1);
        assert_eq!(hidden.footer.y, 23);
    }

    #[test]
    fn test_centered_fixed_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_fixed(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_fixed(40, 40, area), Rect::new(0, 0, 20, 10));
    }
}
