//! Test utilities for verso-tui snapshot and integration testing.
//!
//! This module provides helper functions for creating test apps,
//! rendering screens, and converting buffers to strings for snapshot testing.

use crate::app::App;
use crate::screens::Screen;
use ratatui::{backend::TestBackend, buffer::Buffer, layout::Rect, Terminal};
use std::sync::Arc;
use unicode_width::UnicodeWidthStr;
use verso_engine::{ManualClock, MemoryStore, REVEAL_INTERVAL};

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Wall-clock time test apps start at.
pub const TEST_NOW_MS: i64 = 1_700_000_000_000;

/// Create a test terminal with custom dimensions.
pub fn create_test_terminal_sized(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Create an app over `store` with a manual clock at [`TEST_NOW_MS`].
pub fn create_test_app(store: MemoryStore) -> (App, Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(store);
    let clock = Arc::new(ManualClock::new(TEST_NOW_MS));
    let app = App::new(store.clone(), clock.clone(), REVEAL_INTERVAL)
        .expect("Failed to create test app");
    (app, store, clock)
}

/// Convert a buffer to a string representation for snapshot testing.
///
/// Trailing whitespace is trimmed from every row, and the filler cells
/// behind wide characters are skipped so emoji read naturally.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        let mut x = area.x;
        while x < area.x + area.width {
            let symbol = buffer[(x, y)].symbol();
            result.push_str(symbol);
            x += u16::try_from(symbol.width().max(1)).unwrap_or(1);
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Render a screen at the default test size and return it as a string.
pub fn render_screen_to_string<S: Screen>(screen: &S, app: &App) -> String {
    render_screen_to_string_sized(screen, app, TEST_WIDTH, TEST_HEIGHT)
}

/// Render a screen to a buffer and return it as a string with custom dimensions.
pub fn render_screen_to_string_sized<S: Screen>(
    screen: &S,
    app: &App,
    width: u16,
    height: u16,
) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    screen.render(app, area, &mut buffer);
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_terminal() {
        let terminal = create_test_terminal_sized(TEST_WIDTH, TEST_HEIGHT);
        let size = terminal.size().unwrap();
        assert_eq!(size.width, TEST_WIDTH);
        assert_eq!(size.height, TEST_HEIGHT);
    }

    #[test]
    fn test_create_test_app_starts_trial() {
        let (app, _store, _clock) = create_test_app(MemoryStore::new());
        assert_eq!(app.gate.remaining_seconds(), 3600);
        assert!(app.session.transcript().is_empty());
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        assert_eq!(buffer_to_string(&buffer), "Hello\nWorld\n");
    }

    #[test]
    fn test_buffer_to_string_skips_wide_char_filler() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "🌹 rosa", ratatui::style::Style::default());
        assert_eq!(buffer_to_string(&buffer), "🌹 rosa");
    }
}
