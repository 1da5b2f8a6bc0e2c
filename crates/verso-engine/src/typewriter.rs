//! Typewriter reveal for assistant replies.
//!
//! The transcript always holds the full reply; [`Typewriter`] only tracks
//! how many characters of one entry are visible. One character appears per
//! period and the underlying task is cancelled on the terminal tick.

use std::time::Duration;

use crate::schedule::RepeatingTask;

/// Default reveal rate: one character every 25ms.
pub const REVEAL_INTERVAL: Duration = Duration::from_millis(25);

/// Progressive reveal of a single transcript entry.
#[derive(Debug, Clone)]
pub struct Typewriter {
    entry_index: usize,
    total_chars: usize,
    revealed: usize,
    task: RepeatingTask,
}

impl Typewriter {
    /// Start revealing `text`, which belongs to transcript entry `entry_index`.
    pub fn start(entry_index: usize, text: &str, now_ms: i64, interval: Duration) -> Self {
        let total_chars = text.chars().count();
        let mut task = RepeatingTask::start(now_ms, interval);
        if total_chars == 0 {
            task.cancel();
        }
        Self {
            entry_index,
            total_chars,
            revealed: 0,
            task,
        }
    }

    /// Reveal one character per elapsed period.
    /// Returns `true` if anything new became visible.
    pub fn tick(&mut self, now_ms: i64) -> bool {
        let fired = self.task.poll(now_ms) as usize;
        if fired == 0 {
            return false;
        }
        self.revealed = (self.revealed + fired).min(self.total_chars);
        if self.revealed >= self.total_chars {
            self.task.cancel();
        }
        true
    }

    /// Show everything at once and stop.
    pub fn finish(&mut self) {
        self.revealed = self.total_chars;
        self.task.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.revealed >= self.total_chars
    }

    pub fn entry_index(&self) -> usize {
        self.entry_index
    }

    /// The visible prefix of `text`.
    pub fn visible<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.revealed) {
            Some((byte_idx, _)) => &text[..byte_idx],
            None => text,
        }
    }
}
