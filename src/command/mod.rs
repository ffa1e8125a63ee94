//! Command claim and execution

mod executor;
pub mod handlers;

pub use executor::CommandExecutor;

use serde_json::{Map, Value};

/// Result of running a command handler
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// Action completed; the payload becomes `device_response`
    Completed { response: Map<String, Value> },
    /// Action ran and failed; the reason is recorded in `device_response`
    Failed { reason: String },
}
