//! Lodestone Shared Protocol Types
//!
//! This crate provides the typed command and device-status models, the
//! command lifecycle state machine, and the document-store / wake-channel
//! contracts shared by the controller and the target device agent.

pub mod command;
pub mod document;
pub mod emulator;
pub mod lifecycle;
pub mod notify;
pub mod paths;
pub mod status;
pub mod store;
pub mod user;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use command::{Command, CommandParams, CommandStatus, CommandType, WireValue};
pub use status::{DeviceStatusEntity, LocationData, LostModeData, RingData};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Synchronization parameters for the system
pub mod sync {
    /// Poll interval for the target's command sync loop.
    /// The wake channel only accelerates this; polling alone is sufficient.
    pub const POLL_INTERVAL_MS: u64 = 30_000;

    /// Liveness heartbeat interval for the device status projection
    pub const HEARTBEAT_INTERVAL_MS: u64 = 60_000;

    /// Wall-clock bound after which a non-terminal command is reported stale.
    /// There is no lease in the data model; this is controller-side detection.
    pub const EXECUTING_STALE_MS: u64 = 60_000;

    /// Staleness scan interval on the controller
    pub const STALE_CHECK_INTERVAL_MS: u64 = 5_000;

    /// Maximum retries for lifecycle-state writes and registration
    pub const WRITE_MAX_RETRIES: u32 = 3;

    /// Initial backoff between write retries
    pub const RETRY_BACKOFF_MS: u64 = 500;

    /// Buffer depth for watch subscription channels
    pub const WATCH_BUFFER: usize = 64;
}
