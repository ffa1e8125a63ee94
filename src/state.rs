//! In-process device state backing the status projection

use lodestone_shared::{DeviceStatusEntity, LocationData, LostModeData, RingData};

/// Mutable device-side state; the status reporter projects it to the store
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    pub last_location: Option<LocationData>,
    pub lost_mode: Option<LostModeData>,
    pub last_ring: Option<RingData>,
    /// Wall-clock deadline while location tracking is active
    pub tracking_until_ms: Option<u64>,
}

impl DeviceState {
    /// Whether a tracking window is currently open
    pub fn is_tracking(&self, now_ms: u64) -> bool {
        self.tracking_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Project to the store entity. Liveness fields are filled on write:
    /// `online` is true whenever the agent is running, `last_seen` is
    /// server-assigned.
    pub fn to_entity(&self) -> DeviceStatusEntity {
        DeviceStatusEntity {
            last_location: self.last_location.clone(),
            lost_mode: self.lost_mode.clone(),
            last_ring: self.last_ring,
            online: true,
            last_seen_ms: None,
        }
    }
}
