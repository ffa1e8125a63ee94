//! Location fix source abstraction

use async_trait::async_trait;
use lodestone_shared::{now_ms, LocationData};

/// Provides the device's current position
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Best current fix, `None` when no fix is available
    async fn current_fix(&self) -> Option<LocationData>;
}

/// Fixed-position source for development and tests
pub struct StaticLocationSource {
    latitude: f64,
    longitude: f64,
    accuracy_m: f64,
}

impl StaticLocationSource {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
        }
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn current_fix(&self) -> Option<LocationData> {
        Some(LocationData {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_m: self.accuracy_m,
            timestamp_ms: Some(now_ms()),
            // Reverse geocoding belongs to a different subsystem
            address: None,
        })
    }
}

/// Source that never has a fix, for failure-path tests
pub struct NoFixLocationSource;

#[async_trait]
impl LocationSource for NoFixLocationSource {
    async fn current_fix(&self) -> Option<LocationData> {
        None
    }
}
