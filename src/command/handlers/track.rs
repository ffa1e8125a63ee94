//! Tracking command handlers
//!
//! Tracking opens a wall-clock window during which the status reporter
//! publishes a location fix on every liveness beat.

use super::HandlerContext;
use crate::command::CommandResult;
use lodestone_shared::command::{response, CommandParams};
use lodestone_shared::now_ms;
use tracing::info;

/// Tracking window when the command carries no duration
const DEFAULT_TRACKING_SECS: u64 = 600;

/// Handle START_TRACKING: open (or extend) the tracking window
pub async fn handle_start_tracking(
    ctx: &HandlerContext,
    params: Option<&CommandParams>,
) -> CommandResult {
    let secs = params
        .and_then(|p| p.duration_seconds)
        .unwrap_or(DEFAULT_TRACKING_SECS);
    // duration_seconds comes off the wire; any u64 is possible
    let until = now_ms().saturating_add(secs.saturating_mul(1_000));

    ctx.state.write().await.tracking_until_ms = Some(until);
    info!("[{}] tracking for {secs}s", ctx.device_id);

    CommandResult::Completed {
        response: response::tracking(true, Some(until)),
    }
}

/// Handle STOP_TRACKING: close the tracking window. Idempotent.
pub async fn handle_stop_tracking(ctx: &HandlerContext) -> CommandResult {
    ctx.state.write().await.tracking_until_ms = None;
    info!("[{}] tracking stopped", ctx.device_id);

    CommandResult::Completed {
        response: response::tracking(false, None),
    }
}
