//! UI module for the verso TUI.

pub mod layout;
pub mod theme;
pub mod widgets;
