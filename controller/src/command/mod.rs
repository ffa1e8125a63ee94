//! Command issuing, tracking, and staleness detection

mod dispatcher;
mod staleness;

pub use dispatcher::{CommandDispatcher, IssuedCommand};
pub use staleness::{StalenessEvent, StalenessMonitor};
