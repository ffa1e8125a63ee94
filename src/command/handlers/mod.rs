//! Command handlers for each command kind

mod lock;
mod locate;
mod ring;
mod track;

pub use lock::{handle_lock, handle_unlock};
pub use locate::handle_locate;
pub use ring::{handle_ring, handle_stop_ring};
pub use track::{handle_start_tracking, handle_stop_tracking};

use crate::location::LocationSource;
use crate::state::DeviceState;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Context shared by every handler invocation
#[derive(Clone)]
pub struct HandlerContext {
    pub device_id: String,
    pub state: Arc<RwLock<DeviceState>>,
    pub location: Arc<dyn LocationSource>,
}
