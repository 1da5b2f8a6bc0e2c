//! verso-engine: headless core of the verso chat client
//!
//! This crate holds everything that does not draw to a terminal:
//! - Persistent key/value storage and an injectable clock
//! - The free-trial gate and its countdown
//! - The transcript, the typewriter reveal, and the chat send protocol
//! - The HTTP client for the generation endpoint

pub mod clock;
pub mod config;
pub mod generation;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod transcript;
pub mod trial;
pub mod typewriter;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError, CONFIG_FILE_NAME};
pub use generation::{GenerationError, Generator, HttpGenerator, GENERATE_PATH};
pub use schedule::RepeatingTask;
pub use session::{
    BeginSend, ChatSession, Exchange, PendingRequest, SendOutcome, SendPhase,
    GENERATION_ERROR_MESSAGE, THINKING_LABEL,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use transcript::{Entry, Role, Transcript};
pub use trial::{
    format_countdown, CountdownDisplay, TrialGate, TrialState, TrialStatus, EXPIRED_MESSAGE,
    EXPIRED_NOTICE, TRIAL_DURATION_SECS, WARNING_THRESHOLD_SECS,
};
pub use typewriter::{Typewriter, REVEAL_INTERVAL};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
