//! Lodestone target device agent
//!
//! Claims and executes remote commands from the synchronization store and
//! publishes the device-status projection. Wake signals only accelerate the
//! sync loop; polling alone is sufficient for correctness.

pub mod command;
pub mod config;
pub mod location;
pub mod poller;
pub mod registrar;
pub mod retry;
pub mod state;
pub mod status;

pub use command::CommandExecutor;
pub use config::AgentConfig;
pub use location::{LocationSource, StaticLocationSource};
pub use poller::SyncLoop;
pub use registrar::{Identity, WakeRegistrar};
pub use state::DeviceState;
pub use status::StatusReporter;
