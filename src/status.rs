//! Device status projection reporter
//!
//! The target owns its status document and overwrites it whole; the
//! controller never writes here. Publishes happen after significant events
//! and on a periodic liveness beat.

use crate::config::AgentConfig;
use crate::location::LocationSource;
use crate::retry::with_backoff;
use crate::state::DeviceState;
use lodestone_shared::store::{DocumentStore, StoreError};
use lodestone_shared::{now_ms, paths};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;
use tracing::{debug, warn};

/// Publishes the device-status projection
pub struct StatusReporter {
    store: Arc<dyn DocumentStore>,
    device_path: String,
    state: Arc<RwLock<DeviceState>>,
    location: Arc<dyn LocationSource>,
    heartbeat_interval: Duration,
}

impl StatusReporter {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: &AgentConfig,
        state: Arc<RwLock<DeviceState>>,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        Self {
            store,
            device_path: paths::device(&config.uid, &config.device_id),
            state,
            location,
            heartbeat_interval: config.heartbeat_interval,
        }
    }

    /// Write the current snapshot; called after significant events
    /// (command execution, ring start/stop, lost-mode toggle)
    pub async fn publish(&self) -> Result<(), StoreError> {
        let doc = self.state.read().await.to_entity().to_document();
        with_backoff("status publish", || {
            self.store.set(&self.device_path, doc.clone())
        })
        .await
    }

    /// Periodic liveness beat. While a tracking window is open, each beat
    /// refreshes the location fix before publishing.
    pub async fn run(&self, mut shutdown: mpsc::Receiver<()>) {
        let mut ticker = interval(self.heartbeat_interval);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("status reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.beat().await;
                }
            }
        }
    }

    async fn beat(&self) {
        if self.state.read().await.is_tracking(now_ms()) {
            if let Some(fix) = self.location.current_fix().await {
                self.state.write().await.last_location = Some(fix);
            }
        }
        if let Err(e) = self.publish().await {
            // Best-effort projection; the next beat tries again
            warn!("status publish failed: {e}");
        }
    }
}
