//! Cancellable repeating tasks.
//!
//! A [`RepeatingTask`] does not own a thread or a timer. The event loop
//! polls it with the current time and it reports how many periods have
//! elapsed since the last poll. Once cancelled it never fires again.

use std::time::Duration;

/// A fixed-period task driven by explicit polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatingTask {
    period_ms: i64,
    next_due_ms: i64,
    cancelled: bool,
}

impl RepeatingTask {
    /// Start a task whose first firing is one period after `now_ms`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn start(now_ms: i64, period: Duration) -> Self {
        let period_ms = (period.as_millis() as i64).max(1);
        Self {
            period_ms,
            next_due_ms: now_ms + period_ms,
            cancelled: false,
        }
    }

    /// Number of periods that elapsed up to `now_ms`.
    ///
    /// Each elapsed period is reported exactly once; a late poll reports
    /// all of the periods it missed.
    pub fn poll(&mut self, now_ms: i64) -> u32 {
        if self.cancelled || now_ms < self.next_due_ms {
            return 0;
        }
        let fired = (now_ms - self.next_due_ms) / self.period_ms + 1;
        self.next_due_ms += fired * self.period_ms;
        u32::try_from(fired).unwrap_or(u32::MAX)
    }

    /// Stop the task for good.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}
