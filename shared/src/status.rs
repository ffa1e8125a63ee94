//! Device status projection entities
//!
//! The target writes these as best-effort snapshots after significant events;
//! the controller only reads them.

/// Last-known location fix
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters
    pub accuracy_m: f64,
    /// Capture time of the fix
    pub timestamp_ms: Option<u64>,
    /// Reverse-geocoded address, filled by a separate subsystem
    pub address: Option<String>,
}

/// Lock-screen overlay the target renders while lost mode is active
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LostModeData {
    pub enabled: bool,
    pub message: Option<String>,
    pub phone_number: Option<String>,
    pub enabled_at_ms: Option<u64>,
}

/// Ring window timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RingData {
    pub triggered_at_ms: Option<u64>,
    pub stopped_at_ms: Option<u64>,
}

impl RingData {
    /// How long the ring has been (or was) active
    pub fn duration_ms(&self, now_ms: u64) -> Option<u64> {
        let start = self.triggered_at_ms?;
        let end = self.stopped_at_ms.unwrap_or(now_ms);
        Some(end.saturating_sub(start))
    }

    /// A ring that was triggered and not yet stopped
    pub fn is_active(&self) -> bool {
        self.triggered_at_ms.is_some() && self.stopped_at_ms.is_none()
    }
}

/// Per-device snapshot written by the target, read by the controller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceStatusEntity {
    pub last_location: Option<LocationData>,
    pub lost_mode: Option<LostModeData>,
    pub last_ring: Option<RingData>,
    pub online: bool,
    /// Server-assigned on write; absent until the store commits it
    pub last_seen_ms: Option<u64>,
}
