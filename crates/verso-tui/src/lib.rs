//! verso-tui: Terminal UI for the verso chat client
//!
//! This crate provides the interactive front end, including:
//! - The chat screen with the trial countdown, log, and input box
//! - The expiration modal and blocking notice
//! - The event loop that runs generation requests off the UI task

mod app;
mod event;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod ui;

pub use app::App;
pub use event::{Action, Event, EventHandler};
pub use verso_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use verso_engine::{
    GenerationError, Generator, HttpGenerator, KeyValueStore, SystemClock,
};

/// What the TUI needs from the outside.
pub struct TuiOptions {
    pub store: Arc<dyn KeyValueStore>,
    /// Base URL of the generation endpoint.
    pub endpoint: String,
    pub tick_rate: Duration,
    pub reveal_interval: Duration,
}

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI application.
///
/// This is the main entry point for the TUI. It sets up the terminal,
/// runs the event loop, and restores the terminal on exit.
pub async fn run_tui(options: TuiOptions) -> Result<(), Box<dyn std::error::Error>> {
    let generator = HttpGenerator::new(&options.endpoint)?;
    let mut app = App::new(options.store, Arc::new(SystemClock), options.reveal_interval)?;
    info!(endpoint = %generator.url(), "Starting chat");

    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    app.set_viewport(Rect::new(0, 0, size.width, size.height));

    let mut events = EventHandler::new(options.tick_rate);

    let result = run_loop(&mut terminal, &mut app, &mut events, &generator).await;

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    generator: &HttpGenerator,
) -> Result<(), Box<dyn std::error::Error>> {
    // At most one request is in flight: the send control is disabled
    // until it settles.
    let mut pending: Option<JoinHandle<Result<String, GenerationError>>> = None;

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            screens::render_app(app, area, frame.buffer_mut());
        })?;

        let Some(event) = events.next().await else {
            break;
        };
        let request = match event {
            Event::Key(key) => app.handle_key(key),
            Event::Paste(text) => {
                app.paste(&text);
                None
            }
            Event::Tick => {
                app.tick();
                None
            }
            Event::Resize(width, height) => {
                app.set_viewport(Rect::new(0, 0, width, height));
                None
            }
        };

        if let Some(request) = request {
            let generator = generator.clone();
            pending = Some(tokio::spawn(async move {
                generator.generate(&request.message).await
            }));
        }

        // Check for a completed request (non-blocking)
        if pending.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = pending.take() {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(GenerationError::Interrupted(e.to_string())),
                };
                app.complete(result);
            }
        }

        if app.should_quit {
            if let Some(handle) = pending.take() {
                debug!("Aborting in-flight request");
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
