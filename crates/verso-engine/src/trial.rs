//! Free-trial gate.
//!
//! The trial starts the first time the client runs and lasts one hour of
//! wall-clock time. State lives entirely in the client's key/value store,
//! so this is bookkeeping, not an entitlement check.
//!
//! [`TrialGate`] owns the on-screen countdown. [`TrialGate::check_access`]
//! ignores it and recomputes from storage on every call, so it stays the
//! source of truth at send time even if the two drift.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::schedule::RepeatingTask;
use crate::storage::{KeyValueStore, StorageError, SUBSCRIPTION_KEY, TRIAL_START_KEY};

/// Length of the free trial.
pub const TRIAL_DURATION_SECS: i64 = 3600;

/// Below this many remaining seconds the countdown switches to warning styling.
pub const WARNING_THRESHOLD_SECS: i64 = 300;

/// Countdown tick period.
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Text shown in place of the countdown once the trial is over.
pub const EXPIRED_MESSAGE: &str = "❌ Prueba gratuita finalizada";

/// Blocking notice shown when a send is attempted after expiry.
pub const EXPIRED_NOTICE: &str =
    "⏰ Tu prueba gratuita ha terminado. Por favor, suscríbete para continuar.";

/// Persisted trial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrialState {
    /// When the trial started, `None` if never started or unreadable.
    pub started_at_ms: Option<i64>,
    /// Client-settable subscription flag.
    pub subscription_active: bool,
}

impl TrialState {
    /// Read both keys from the store.
    ///
    /// A start time that is not a decimal integer, lies after `now_ms`, or
    /// is too far back to measure from `now_ms` is logged and treated as
    /// absent.
    pub fn load(store: &dyn KeyValueStore, now_ms: i64) -> Result<Self, StorageError> {
        let subscription_active = store.get(SUBSCRIPTION_KEY)?.as_deref() == Some("true");
        let started_at_ms = store
            .get(TRIAL_START_KEY)?
            .and_then(|raw| match parse_start(&raw, now_ms) {
                Some(ms) => Some(ms),
                None => {
                    warn!(value = %raw, "Ignoring invalid trial start time");
                    None
                }
            });
        Ok(Self {
            started_at_ms,
            subscription_active,
        })
    }
}

fn parse_start(raw: &str, now_ms: i64) -> Option<i64> {
    let start = raw.trim().parse::<i64>().ok()?;
    match now_ms.checked_sub(start) {
        Some(elapsed) if elapsed >= 0 => Some(start),
        _ => None,
    }
}

/// Whole seconds elapsed since `start_ms`, floored.
pub fn elapsed_seconds(start_ms: i64, now_ms: i64) -> i64 {
    now_ms.saturating_sub(start_ms).div_euclid(1000)
}

/// Format remaining seconds as `M:SS`.
pub fn format_countdown(remaining_secs: i64) -> String {
    let remaining = remaining_secs.max(0);
    format!("{}:{:02}", remaining / 60, remaining % 60)
}

/// What the countdown area should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownDisplay {
    /// Subscription active: no countdown at all.
    Hidden,
    /// Trial running.
    Running { text: String, warning: bool },
    /// Trial over.
    Expired { message: &'static str },
}

/// Snapshot of the trial for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialStatus {
    pub subscription_active: bool,
    pub started_at: Option<DateTime<Utc>>,
    /// Seconds left, `None` when subscribed or not started.
    pub remaining_seconds: Option<i64>,
    pub access: bool,
}

/// Owner of the trial countdown and the expired state.
pub struct TrialGate {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    subscription_active: bool,
    remaining_seconds: i64,
    expired: bool,
    warning: bool,
    countdown: Option<RepeatingTask>,
}

impl TrialGate {
    /// Create a gate. Nothing is read until [`TrialGate::initialize`].
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            subscription_active: false,
            remaining_seconds: TRIAL_DURATION_SECS,
            expired: false,
            warning: false,
            countdown: None,
        }
    }

    /// Load trial state and start the countdown, or expire immediately.
    pub fn initialize(&mut self) -> Result<(), StorageError> {
        let now = self.clock.now_ms();
        let state = TrialState::load(self.store.as_ref(), now)?;
        self.subscription_active = state.subscription_active;
        if state.subscription_active {
            debug!("Subscription active, countdown hidden");
            self.countdown = None;
            return Ok(());
        }

        match state.started_at_ms {
            Some(start) => {
                self.remaining_seconds = TRIAL_DURATION_SECS - elapsed_seconds(start, now);
                if self.remaining_seconds <= 0 {
                    self.expire();
                    return Ok(());
                }
            }
            None => {
                self.store.set(TRIAL_START_KEY, &now.to_string())?;
                self.remaining_seconds = TRIAL_DURATION_SECS;
                info!(started_at_ms = now, "Free trial started");
            }
        }

        self.refresh_warning();
        self.countdown = Some(RepeatingTask::start(now, COUNTDOWN_PERIOD));
        debug!(remaining = self.remaining_seconds, "Countdown started");
        Ok(())
    }

    /// Advance the countdown by however many ticks are due.
    /// Returns `true` if the display changed.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        let fired = match self.countdown.as_mut() {
            Some(task) => task.poll(now),
            None => return false,
        };
        if fired == 0 {
            return false;
        }

        for _ in 0..fired {
            self.remaining_seconds -= 1;
            if self.remaining_seconds <= 0 {
                self.expire();
                return true;
            }
        }
        self.refresh_warning();
        true
    }

    /// Enter the expired state: stop the countdown and lock input.
    ///
    /// Safe to call any number of times.
    pub fn expire(&mut self) {
        if let Some(mut task) = self.countdown.take() {
            task.cancel();
        }
        if !self.expired {
            info!("Free trial expired");
        }
        self.expired = true;
        self.warning = true;
    }

    /// Whether a send may proceed, recomputed from storage.
    pub fn check_access(&self) -> bool {
        let now = self.clock.now_ms();
        let state = match TrialState::load(self.store.as_ref(), now) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Could not read trial state, allowing access");
                return true;
            }
        };
        Self::access_for(state, now)
    }

    fn access_for(state: TrialState, now_ms: i64) -> bool {
        if state.subscription_active {
            return true;
        }
        match state.started_at_ms {
            None => true,
            Some(start) => elapsed_seconds(start, now_ms) < TRIAL_DURATION_SECS,
        }
    }

    /// Set the subscription flag. The countdown disappears and input unlocks.
    pub fn activate_subscription(&mut self) -> Result<(), StorageError> {
        self.store.set(SUBSCRIPTION_KEY, "true")?;
        self.subscription_active = true;
        self.expired = false;
        self.warning = false;
        if let Some(mut task) = self.countdown.take() {
            task.cancel();
        }
        info!("Subscription activated");
        Ok(())
    }

    /// Report the persisted trial state against the current time.
    pub fn status(&self) -> Result<TrialStatus, StorageError> {
        let now = self.clock.now_ms();
        let state = TrialState::load(self.store.as_ref(), now)?;
        let remaining_seconds = match (state.subscription_active, state.started_at_ms) {
            (false, Some(start)) => {
                Some((TRIAL_DURATION_SECS - elapsed_seconds(start, now)).max(0))
            }
            _ => None,
        };
        Ok(TrialStatus {
            subscription_active: state.subscription_active,
            started_at: state
                .started_at_ms
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            remaining_seconds,
            access: Self::access_for(state, now),
        })
    }

    /// Current countdown display.
    pub fn display(&self) -> CountdownDisplay {
        if self.subscription_active {
            CountdownDisplay::Hidden
        } else if self.expired {
            CountdownDisplay::Expired {
                message: EXPIRED_MESSAGE,
            }
        } else {
            CountdownDisplay::Running {
                text: format_countdown(self.remaining_seconds),
                warning: self.warning,
            }
        }
    }

    fn refresh_warning(&mut self) {
        if self.remaining_seconds < WARNING_THRESHOLD_SECS {
            self.warning = true;
        }
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_seconds
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_warning(&self) -> bool {
        self.warning
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription_active
    }

    /// Whether the countdown task is live.
    pub fn countdown_running(&self) -> bool {
        self.countdown.is_some()
    }

    /// Input and the send control are locked once expired.
    pub fn input_enabled(&self) -> bool {
        !self.expired
    }
}
