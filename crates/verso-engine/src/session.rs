//! Chat session: the transcript plus the send/receive protocol.
//!
//! A send cycle runs `Idle → Sending → Idle`. [`ChatSession::begin_send`]
//! performs the synchronous front half (gate check, normalization,
//! optimistic user entry, placeholder) and hands back the request to run.
//! [`ChatSession::finish_send`] takes its result, whatever it was, and
//! always returns the session to `Idle` and persists the transcript.
//! [`ChatSession::send`] chains the two for one-shot callers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::clock::Clock;
use crate::generation::{GenerationError, Generator};
use crate::storage::{KeyValueStore, StorageError, TRANSCRIPT_KEY};
use crate::transcript::{Entry, Role, Transcript};
use crate::trial::TrialGate;
use crate::typewriter::{Typewriter, REVEAL_INTERVAL};

/// Assistant entry appended when a request fails.
pub const GENERATION_ERROR_MESSAGE: &str = "❌ Error al generar respuesta.";

/// Text of the thinking placeholder, without its animated dots.
pub const THINKING_LABEL: &str = "Escribiendo";

/// Where the session is in a send cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    #[default]
    Idle,
    /// A request is in flight; the send control is disabled.
    Sending,
}

/// A request that [`ChatSession::begin_send`] accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Normalized message text.
    pub message: String,
}

/// Result of the front half of a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginSend {
    /// Trial over. The gate has been moved to its expired state.
    Blocked,
    /// Nothing but whitespace. No state changed.
    Empty,
    /// User entry appended; run the request and call `finish_send`.
    Started(PendingRequest),
}

/// How a completed exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// Reply appended at `entry_index` and being revealed.
    Replied { entry_index: usize },
    /// Fixed error entry appended at `entry_index`.
    Failed { entry_index: usize },
}

/// Result of a full one-shot send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Blocked,
    Empty,
    Completed(Exchange),
}

/// Convert CRLF pairs to bare newlines.
pub fn normalize_message(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Owner of the transcript and the send cycle.
pub struct ChatSession {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    transcript: Transcript,
    phase: SendPhase,
    thinking: bool,
    reveal: Option<Typewriter>,
    reveal_interval: Duration,
}

impl ChatSession {
    /// Create a session with an empty transcript.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            transcript: Transcript::new(),
            phase: SendPhase::Idle,
            thinking: false,
            reveal: None,
            reveal_interval: REVEAL_INTERVAL,
        }
    }

    /// Override the typewriter rate.
    #[must_use]
    pub fn with_reveal_interval(mut self, interval: Duration) -> Self {
        self.reveal_interval = interval;
        self
    }

    /// Replace the transcript with the persisted one, if any.
    ///
    /// A blob that does not decode is logged and left alone; the session
    /// starts empty instead of failing.
    pub fn restore_transcript(&mut self) -> Result<(), StorageError> {
        let Some(blob) = self.store.get(TRANSCRIPT_KEY)? else {
            return Ok(());
        };
        match Transcript::from_blob(&blob) {
            Ok(transcript) => {
                debug!(entries = transcript.len(), "Transcript restored");
                self.transcript = transcript;
                self.reveal = None;
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable transcript");
            }
        }
        Ok(())
    }

    /// Overwrite the stored transcript with the current one.
    pub fn persist_transcript(&self) -> Result<(), StorageError> {
        let blob = self.transcript.to_blob()?;
        self.store.set(TRANSCRIPT_KEY, &blob)
    }

    /// Front half of a send.
    ///
    /// Does not look at [`SendPhase`]: callers gate on
    /// [`ChatSession::can_send`] the way a disabled button would.
    pub fn begin_send(&mut self, gate: &mut TrialGate, text: &str) -> BeginSend {
        if !gate.check_access() {
            gate.expire();
            return BeginSend::Blocked;
        }

        let message = normalize_message(text);
        if message.trim().is_empty() {
            return BeginSend::Empty;
        }

        self.transcript.push(Entry::user(message.clone()));
        self.phase = SendPhase::Sending;
        self.thinking = true;
        debug!(chars = message.chars().count(), "Sending message");

        BeginSend::Started(PendingRequest { message })
    }

    /// Back half of a send. Always returns the session to `Idle`.
    pub fn finish_send(&mut self, result: Result<String, GenerationError>) -> Exchange {
        self.phase = SendPhase::Idle;
        self.thinking = false;

        let exchange = match result {
            Ok(reply) => {
                if let Some(previous) = self.reveal.as_mut() {
                    previous.finish();
                }
                let now = self.clock.now_ms();
                let entry_index = self.transcript.push(Entry::assistant(reply));
                let text = &self.transcript.entries()[entry_index].content;
                self.reveal = Some(Typewriter::start(
                    entry_index,
                    text,
                    now,
                    self.reveal_interval,
                ));
                Exchange::Replied { entry_index }
            }
            Err(e) => {
                error!(error = %e, "Reply generation failed");
                let entry_index = self
                    .transcript
                    .push(Entry::assistant(GENERATION_ERROR_MESSAGE));
                Exchange::Failed { entry_index }
            }
        };

        if let Err(e) = self.persist_transcript() {
            error!(error = %e, "Failed to persist transcript");
        }
        exchange
    }

    /// Run a whole send cycle against `generator`.
    pub async fn send<G: Generator>(
        &mut self,
        gate: &mut TrialGate,
        generator: &G,
        text: &str,
    ) -> SendOutcome {
        match self.begin_send(gate, text) {
            BeginSend::Blocked => SendOutcome::Blocked,
            BeginSend::Empty => SendOutcome::Empty,
            BeginSend::Started(request) => {
                let result = generator.generate(&request.message).await;
                SendOutcome::Completed(self.finish_send(result))
            }
        }
    }

    /// Advance the typewriter. Returns `true` if more text became visible.
    pub fn tick_reveal(&mut self) -> bool {
        let now = self.clock.now_ms();
        let Some(reveal) = self.reveal.as_mut() else {
            return false;
        };
        let changed = reveal.tick(now);
        if reveal.is_finished() {
            self.reveal = None;
        }
        changed
    }

    /// Visible part of every entry, honoring an in-progress reveal.
    pub fn visible_entries(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        self.transcript
            .entries()
            .iter()
            .enumerate()
            .map(move |(index, entry)| {
                let content = match &self.reveal {
                    Some(reveal) if reveal.entry_index() == index => reveal.visible(&entry.content),
                    _ => entry.content.as_str(),
                };
                (entry.role, content)
            })
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn phase(&self) -> SendPhase {
        self.phase
    }

    /// Whether the send control is enabled.
    pub fn can_send(&self) -> bool {
        self.phase == SendPhase::Idle
    }

    /// Whether the thinking placeholder is showing.
    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }
}
