//! Lost-mode lock and unlock handlers
//!
//! Lock carries the overlay data the target must render; rendering itself is
//! outside this core.

use super::HandlerContext;
use crate::command::CommandResult;
use lodestone_shared::command::{response, CommandParams};
use lodestone_shared::{now_ms, LostModeData};
use tracing::info;

/// Handle LOCK: enable the lost-mode overlay with message and callback number
pub async fn handle_lock(ctx: &HandlerContext, params: Option<&CommandParams>) -> CommandResult {
    let mut state = ctx.state.write().await;
    state.lost_mode = Some(LostModeData {
        enabled: true,
        message: params.and_then(|p| p.message.clone()),
        phone_number: params.and_then(|p| p.phone_number.clone()),
        enabled_at_ms: Some(now_ms()),
    });
    info!("[{}] lost mode enabled", ctx.device_id);

    CommandResult::Completed {
        response: response::lost_mode(true),
    }
}

/// Handle UNLOCK: disable lost mode. Idempotent: unlocking an unlocked
/// device succeeds.
pub async fn handle_unlock(ctx: &HandlerContext) -> CommandResult {
    let mut state = ctx.state.write().await;
    if let Some(lost_mode) = state.lost_mode.as_mut() {
        lost_mode.enabled = false;
    }
    info!("[{}] lost mode disabled", ctx.device_id);

    CommandResult::Completed {
        response: response::lost_mode(false),
    }
}
