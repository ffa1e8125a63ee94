//! Lodestone controller
//!
//! Issues remote commands through the synchronization store, fans out wake
//! signals, and observes command progress and device status. The controller
//! creates commands in PENDING and never writes `status` afterwards.

pub mod command;
pub mod watch;

pub use command::{CommandDispatcher, IssuedCommand, StalenessEvent, StalenessMonitor};
pub use watch::{CommandUpdates, DeviceStatusUpdates};
