//! Locate command handler

use super::HandlerContext;
use crate::command::CommandResult;
use lodestone_shared::command::response;
use tracing::info;

/// Handle LOCATE: take a fresh fix and publish it through the projection
pub async fn handle_locate(ctx: &HandlerContext) -> CommandResult {
    match ctx.location.current_fix().await {
        Some(fix) => {
            info!(
                "[{}] location fix: {:.4},{:.4} (±{}m)",
                ctx.device_id, fix.latitude, fix.longitude, fix.accuracy_m
            );
            let response = response::location_fix(fix.latitude, fix.longitude, fix.accuracy_m);
            ctx.state.write().await.last_location = Some(fix);
            CommandResult::Completed { response }
        }
        None => CommandResult::Failed {
            reason: "no location fix available".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{NoFixLocationSource, StaticLocationSource};
    use crate::state::DeviceState;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[tokio::test]
    async fn test_locate_updates_state() {
        let ctx = HandlerContext {
            device_id: "d1".into(),
            state: Arc::new(RwLock::new(DeviceState::default())),
            location: Arc::new(StaticLocationSource::new(48.2082, 16.3738, 12.0)),
        };

        let result = handle_locate(&ctx).await;
        assert!(matches!(result, CommandResult::Completed { .. }));

        let state = ctx.state.read().await;
        let fix = state.last_location.as_ref().unwrap();
        assert_eq!(fix.latitude, 48.2082);
    }

    #[tokio::test]
    async fn test_locate_without_fix_fails() {
        let ctx = HandlerContext {
            device_id: "d1".into(),
            state: Arc::new(RwLock::new(DeviceState::default())),
            location: Arc::new(NoFixLocationSource),
        };

        let result = handle_locate(&ctx).await;
        assert!(matches!(result, CommandResult::Failed { .. }));
        assert!(ctx.state.read().await.last_location.is_none());
    }
}
