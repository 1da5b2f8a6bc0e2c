//! Theme and styling definitions for the verso TUI.

use ratatui::style::{Color, Modifier, Style};

/// Color palette for the TUI.
pub struct Palette;

impl Palette {
    // Base colors
    pub const BG: Color = Color::Rgb(30, 30, 40);
    pub const FG: Color = Color::Rgb(220, 220, 230);
    pub const DIM: Color = Color::Rgb(140, 140, 160);

    // Accent colors
    pub const ACCENT: Color = Color::Rgb(130, 170, 255);
    pub const USER: Color = Color::Rgb(170, 200, 255);
    pub const ASSISTANT: Color = Color::Rgb(230, 190, 220);

    // Status bar colors (high contrast)
    pub const STATUS_BG: Color = Color::Rgb(45, 45, 60);
    pub const STATUS_KEY_BG: Color = Color::Rgb(70, 90, 140);

    // Countdown warning treatment
    pub const WARNING_BG: Color = Color::Rgb(255, 204, 204);
    pub const WARNING_FG: Color = Color::Rgb(204, 0, 0);

    pub const ERROR: Color = Color::Rgb(240, 100, 100);

    // Border colors
    pub const BORDER: Color = Color::Rgb(80, 80, 100);
    pub const BORDER_ACTIVE: Color = Color::Rgb(130, 170, 255);
}

/// Common styles used throughout the TUI.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::BG)
    }

    /// Dimmed text for secondary information.
    pub fn dim() -> Style {
        Style::default().fg(Palette::DIM).bg(Palette::BG)
    }

    /// Active/focused element.
    pub fn active() -> Style {
        Style::default().fg(Palette::ACCENT).bg(Palette::BG)
    }

    /// Title style.
    pub fn title() -> Style {
        Style::default()
            .fg(Palette::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    /// Label in front of a user entry.
    pub fn user_label() -> Style {
        Style::default()
            .fg(Palette::USER)
            .bg(Palette::BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Label in front of an assistant entry.
    pub fn assistant_label() -> Style {
        Style::default()
            .fg(Palette::ASSISTANT)
            .bg(Palette::BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Thinking placeholder.
    pub fn thinking() -> Style {
        Style::default()
            .fg(Palette::DIM)
            .bg(Palette::BG)
            .add_modifier(Modifier::ITALIC)
    }

    /// Countdown while there is plenty of time left.
    pub fn countdown() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Countdown in the last minutes, and the expired message.
    pub fn countdown_warning() -> Style {
        Style::default()
            .fg(Palette::WARNING_FG)
            .bg(Palette::WARNING_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Error text.
    pub fn error() -> Style {
        Style::default().fg(Palette::ERROR).bg(Palette::BG)
    }

    /// Key hint style (for status bar) - bright on dark for visibility.
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Palette::FG)
            .bg(Palette::STATUS_KEY_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint label style - readable on status bar background.
    pub fn key_label() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Status bar background style.
    pub fn status_bar() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Border style for inactive elements.
    pub fn border() -> Style {
        Style::default().fg(Palette::BORDER)
    }

    /// Border style for active/focused elements.
    pub fn border_active() -> Style {
        Style::default().fg(Palette::BORDER_ACTIVE)
    }
}

/// Frames of the thinking indicator: `Escribiendo`, then one to three dots.
pub const THINKING_DOTS: [&str; 4] = ["", ".", "..", "..."];

/// Ticks each dot frame stays on screen.
pub const THINKING_FRAME_TICKS: u64 = 12;

/// Dot frame for a given UI tick.
#[allow(clippy::cast_possible_truncation)]
pub fn thinking_dots(tick: u64) -> &'static str {
    let frame = (tick / THINKING_FRAME_TICKS) % THINKING_DOTS.len() as u64;
    THINKING_DOTS[frame as usize]
}
