//! Widgets for the verso TUI.

pub mod countdown;
pub mod footer;
pub mod message_list;
pub mod text_input;

pub use countdown::CountdownBar;
pub use footer::{Footer, SendControl};
pub use message_list::MessageList;
pub use text_input::TextInputState;
