//! Application state and update logic for the verso TUI.

use crate::event::{key_to_action, Action};
use crate::ui::layout::chat_layout;
use crate::ui::widgets::{MessageList, SendControl, TextInputState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use verso_engine::{
    BeginSend, ChatSession, Clock, GenerationError, KeyValueStore, PendingRequest, StorageError,
    TrialGate, EXPIRED_NOTICE,
};

/// Lines moved per PageUp / PageDown.
const SCROLL_PAGE: usize = 5;

/// Application state.
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    pub gate: TrialGate,
    pub session: ChatSession,
    pub input: TextInputState,

    /// Lines scrolled up from the bottom of the log. Zero follows new output.
    pub scroll_back: usize,

    /// Blocking notice, shown until dismissed.
    pub notice: Option<&'static str>,

    /// Whether the expiration modal was closed.
    pub modal_dismissed: bool,

    /// UI ticks since start, drives animations.
    pub tick_count: u64,

    viewport: Rect,
}

impl App {
    /// Restore the transcript, then start the trial gate.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        reveal_interval: Duration,
    ) -> Result<Self, StorageError> {
        let mut session =
            ChatSession::new(store.clone(), clock.clone()).with_reveal_interval(reveal_interval);
        session.restore_transcript()?;

        let mut gate = TrialGate::new(store, clock);
        gate.initialize()?;

        Ok(Self {
            should_quit: false,
            gate,
            session,
            input: TextInputState::new(),
            scroll_back: 0,
            notice: None,
            modal_dismissed: false,
            tick_count: 0,
            viewport: Rect::new(0, 0, 80, 24),
        })
    }

    /// Record the terminal size, used to bound scrolling.
    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
        self.scroll_back = self.scroll_back.min(self.max_scroll_back());
    }

    /// Current state of the send control.
    pub fn send_control(&self) -> SendControl {
        if !self.gate.input_enabled() {
            SendControl::Locked
        } else if self.session.can_send() {
            SendControl::Enabled
        } else {
            SendControl::Sending
        }
    }

    pub fn show_expired_modal(&self) -> bool {
        self.gate.is_expired() && !self.modal_dismissed
    }

    /// Handle a key press. Returns a request to run if a send started.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PendingRequest> {
        let action = key_to_action(key);
        if action == Action::Edit {
            self.edit(key);
            return None;
        }
        self.handle_action(action)
    }

    /// Handle an action. Returns a request to run if a send started.
    pub fn handle_action(&mut self, action: Action) -> Option<PendingRequest> {
        if self.notice.is_some() {
            match action {
                Action::Quit => self.should_quit = true,
                Action::Send | Action::Dismiss => self.notice = None,
                _ => {}
            }
            return None;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::Send => return self.submit(),
            Action::Newline => {
                if self.gate.input_enabled() {
                    self.input.insert('\n');
                }
            }
            Action::ScrollUp => {
                self.scroll_back = (self.scroll_back + SCROLL_PAGE).min(self.max_scroll_back());
            }
            Action::ScrollDown => {
                self.scroll_back = self.scroll_back.saturating_sub(SCROLL_PAGE);
            }
            Action::Dismiss => {
                if self.gate.is_expired() {
                    self.modal_dismissed = true;
                }
            }
            Action::Edit => {}
        }
        None
    }

    fn edit(&mut self, key: KeyEvent) {
        if !self.gate.input_enabled() || self.notice.is_some() {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return;
        }
        match key.code {
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            _ => {}
        }
    }

    /// Insert pasted text into the input box.
    pub fn paste(&mut self, text: &str) {
        if self.gate.input_enabled() && self.notice.is_none() {
            self.input.insert_str(&text.replace("\r\n", "\n"));
        }
    }

    /// Try to send the input box.
    ///
    /// Does nothing while the send control is disabled. A blocked send
    /// raises the expiration notice.
    pub fn submit(&mut self) -> Option<PendingRequest> {
        if self.send_control() != SendControl::Enabled {
            return None;
        }
        match self.session.begin_send(&mut self.gate, self.input.content()) {
            BeginSend::Blocked => {
                self.notice = Some(EXPIRED_NOTICE);
                self.modal_dismissed = false;
                None
            }
            BeginSend::Empty => None,
            BeginSend::Started(request) => {
                self.input.clear();
                self.scroll_back = 0;
                Some(request)
            }
        }
    }

    /// Feed back the result of a request started by [`App::submit`].
    pub fn complete(&mut self, result: Result<String, GenerationError>) {
        let exchange = self.session.finish_send(result);
        debug!(?exchange, "Exchange finished");
        self.scroll_back = 0;
    }

    /// Advance the countdown, the reveal, and animations.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        self.gate.tick();
        self.session.tick_reveal();
    }

    /// Text lines the input box currently needs.
    pub fn input_rows(&self) -> u16 {
        self.input.row_count(self.viewport.width.saturating_sub(2))
    }

    fn max_scroll_back(&self) -> usize {
        let show_countdown = !self.gate.is_subscribed();
        let areas = chat_layout(self.viewport, self.input_rows(), show_countdown);
        let inner_width = areas.messages.width.saturating_sub(2);
        let inner_height = usize::from(areas.messages.height.saturating_sub(2));
        let total = MessageList::new(self.session.visible_entries())
            .thinking(self.session.is_thinking(), self.tick_count)
            .lines(inner_width)
            .len();
        total.saturating_sub(inner_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, TEST_NOW_MS as NOW};
    use verso_engine::storage::{TRANSCRIPT_KEY, TRIAL_START_KEY};
    use verso_engine::{
        Entry, ManualClock, MemoryStore, Transcript, GENERATION_ERROR_MESSAGE, REVEAL_INTERVAL,
    };

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    fn expired_store() -> MemoryStore {
        let start = (NOW - 3_601_000).to_string();
        MemoryStore::with_values([(TRIAL_START_KEY, start.as_str())])
    }

    #[test]
    fn test_submit_clears_input_and_starts_request() {
        let (mut app, _store, _clock) = create_test_app(MemoryStore::new());
        type_text(&mut app, "un poema");

        let request = app.handle_action(Action::Send).unwrap();

        assert_eq!(request.message, "un poema");
        assert!(app.input.is_empty());
        assert_eq!(app.input_rows(), 1);
        assert_eq!(app.send_control(), SendControl::Sending);
        assert!(app.session.is_thinking());
    }

    #[test]
    fn test_enter_is_ignored_while_sending() {
        let (mut app, _store, _clock) = create_test_app(MemoryStore::new());
        type_text(&mut app, "uno");
        app.handle_action(Action::Send).unwrap();

        type_text(&mut app, "dos");
        assert!(app.handle_action(Action::Send).is_none());
        assert_eq!(app.input.content(), "dos");
        assert_eq!(app.session.transcript().len(), 1);
    }

    #[test]
    fn test_complete_reenables_and_reveals() {
        let (mut app, _store, clock) = create_test_app(MemoryStore::new());
        type_text(&mut app, "hola");
        app.handle_action(Action::Send).unwrap();

        app.complete(Ok("ab".into()));
        assert_eq!(app.send_control(), SendControl::Enabled);
        assert!(!app.session.is_thinking());

        clock.advance(REVEAL_INTERVAL * 2);
        app.tick();
        let visible: Vec<_> = app.session.visible_entries().map(|(_, c)| c).collect();
        assert_eq!(visible, vec!["hola", "ab"]);
    }

    #[test]
    fn test_complete_with_error_appends_error_entry() {
        let (mut app, _store, _clock) = create_test_app(MemoryStore::new());
        type_text(&mut app, "hola");
        app.handle_action(Action::Send).unwrap();

        app.complete(Err(GenerationError::Interrupted("task panicked".into())));
        assert_eq!(
            app.session.transcript().entries()[1],
            Entry::assistant(GENERATION_ERROR_MESSAGE)
        );
        assert_eq!(app.send_control(), SendControl::Enabled);
    }

    #[test]
    fn test_whitespace_is_not_sent() {
        let (mut app, _store, _clock) = create_test_app(MemoryStore::new());
        type_text(&mut app, "   ");
        assert!(app.handle_action(Action::Send).is_none());
        assert!(app.session.transcript().is_empty());
        assert_eq!(app.send_control(), SendControl::Enabled);
    }

    #[test]
    fn test_newline_grows_input() {
        let (mut app, _store, _clock) = create_test_app(MemoryStore::new());
        type_text(&mut app, "uno");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut app, "dos");
        assert_eq!(app.input.content(), "uno\ndos");
        assert_eq!(app.input_rows(), 2);
    }

    #[test]
    fn test_expired_on_start_locks_input() {
        let (mut app, _store, _clock) = create_test_app(expired_store());

        assert_eq!(app.send_control(), SendControl::Locked);
        assert!(app.show_expired_modal());
        type_text(&mut app, "hola");
        assert!(app.input.is_empty());
        assert!(app.handle_action(Action::Send).is_none());
    }

    #[test]
    fn test_expiry_during_session_raises_notice_on_send() {
        let (mut app, store, clock) = create_test_app(MemoryStore::new());
        type_text(&mut app, "hola");
        // Storage says the hour is up before the countdown catches up.
        store
            .set(TRIAL_START_KEY, &(NOW - 4_000_000).to_string())
            .unwrap();
        clock.advance(Duration::from_millis(1));

        assert!(app.handle_action(Action::Send).is_none());
        assert_eq!(app.notice, Some(EXPIRED_NOTICE));
        assert!(app.gate.is_expired());
        assert!(app.session.transcript().is_empty());

        app.handle_action(Action::Dismiss);
        assert!(app.notice.is_none());
        assert!(app.show_expired_modal());
        app.handle_action(Action::Dismiss);
        assert!(!app.show_expired_modal());
    }

    #[test]
    fn test_countdown_expiry_locks_input() {
        let start = (NOW - 3_599_000).to_string();
        let (mut app, _store, clock) = create_test_app(MemoryStore::with_values([(
            TRIAL_START_KEY,
            start.as_str(),
        )]));
        assert_eq!(app.send_control(), SendControl::Enabled);

        clock.advance(Duration::from_secs(1));
        app.tick();
        assert_eq!(app.send_control(), SendControl::Locked);
        assert!(app.show_expired_modal());
    }

    #[test]
    fn test_transcript_restored_even_when_expired() {
        let mut transcript = Transcript::new();
        transcript.push(Entry::user("hola"));
        transcript.push(Entry::assistant("poema"));
        let blob = transcript.to_blob().unwrap();
        let start = (NOW - 3_601_000).to_string();
        let store = MemoryStore::with_values([
            (TRIAL_START_KEY, start.as_str()),
            (TRANSCRIPT_KEY, blob.as_str()),
        ]);

        let (app, _store, _clock) = create_test_app(store);
        assert_eq!(app.session.transcript(), &transcript);
        assert!(app.gate.is_expired());
    }

    #[test]
    fn test_scroll_is_bounded_by_content() {
        let (mut app, _store, _clock) = create_test_app(MemoryStore::new());
        app.handle_action(Action::ScrollUp);
        assert_eq!(app.scroll_back, 0);

        for i in 0..20 {
            type_text(&mut app, &format!("mensaje {i}"));
            app.handle_action(Action::Send).unwrap();
            app.complete(Ok("respuesta".into()));
        }
        app.handle_action(Action::ScrollUp);
        assert_eq!(app.scroll_back, SCROLL_PAGE);
        for _ in 0..100 {
            app.handle_action(Action::ScrollUp);
        }
        let top = app.scroll_back;
        assert!(top > SCROLL_PAGE);
        app.handle_action(Action::ScrollUp);
        assert_eq!(app.scroll_back, top);

        app.handle_action(Action::ScrollDown);
        assert_eq!(app.scroll_back, top - SCROLL_PAGE);
    }

    #[test]
    fn test_ctrl_c_quits_even_with_notice() {
        let (mut app, _store, _clock) = create_test_app(expired_store());
        app.notice = Some(EXPIRED_NOTICE);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_paste_normalizes_line_endings() {
        let clock = Arc::new(ManualClock::new(NOW));
        let mut app = App::new(Arc::new(MemoryStore::new()), clock, REVEAL_INTERVAL).unwrap();
        app.paste("uno\r\ndos");
        assert_eq!(app.input.content(), "uno\ndos");
    }
}
