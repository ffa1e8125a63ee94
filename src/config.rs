//! Agent configuration

use lodestone_shared::sync;
use std::time::Duration;

/// Configuration for the target device agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Account that owns this device's documents
    pub uid: String,
    /// This device's id under the account
    pub device_id: String,
    /// Delivery address registered for wake signals
    pub delivery_token: String,
    /// Command poll interval (safety net under the wake channel)
    pub poll_interval: Duration,
    /// Liveness heartbeat interval for the status projection
    pub heartbeat_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            uid: "user-001".into(),
            device_id: "device-001".into(),
            delivery_token: "token-001".into(),
            poll_interval: Duration::from_millis(sync::POLL_INTERVAL_MS),
            heartbeat_interval: Duration::from_millis(sync::HEARTBEAT_INTERVAL_MS),
        }
    }
}
