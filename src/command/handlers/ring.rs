//! Ring command handlers

use super::HandlerContext;
use crate::command::CommandResult;
use lodestone_shared::command::{response, CommandParams};
use lodestone_shared::{now_ms, RingData};
use tracing::info;

/// Handle RING: start an audible (or silent) ring on the device
pub async fn handle_ring(ctx: &HandlerContext, params: Option<&CommandParams>) -> CommandResult {
    let play_sound = params.map_or(true, |p| p.play_sound);

    let mut state = ctx.state.write().await;
    if state.last_ring.is_some_and(|ring| ring.is_active()) {
        // Already ringing; report success rather than restarting the window
        return CommandResult::Completed {
            response: response::ring_started(play_sound),
        };
    }

    state.last_ring = Some(RingData {
        triggered_at_ms: Some(now_ms()),
        stopped_at_ms: None,
    });
    info!("[{}] ring started (sound: {play_sound})", ctx.device_id);

    CommandResult::Completed {
        response: response::ring_started(play_sound),
    }
}

/// Handle STOP_RING: stop the active ring and report how long it ran
pub async fn handle_stop_ring(ctx: &HandlerContext) -> CommandResult {
    let mut state = ctx.state.write().await;

    match state.last_ring.as_mut() {
        Some(ring) if ring.is_active() => {
            let now = now_ms();
            ring.stopped_at_ms = Some(now);
            let duration = ring.duration_ms(now).unwrap_or(0);
            info!("[{}] ring stopped after {duration}ms", ctx.device_id);
            CommandResult::Completed {
                response: response::ring_stopped(duration),
            }
        }
        _ => CommandResult::Failed {
            reason: "device is not ringing".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StaticLocationSource;
    use crate::state::DeviceState;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn ctx() -> HandlerContext {
        HandlerContext {
            device_id: "d1".into(),
            state: Arc::new(RwLock::new(DeviceState::default())),
            location: Arc::new(StaticLocationSource::new(0.0, 0.0, 0.0)),
        }
    }

    #[tokio::test]
    async fn test_ring_then_stop_reports_duration() {
        let ctx = ctx();

        let result = handle_ring(&ctx, None).await;
        assert!(matches!(result, CommandResult::Completed { .. }));
        assert!(ctx.state.read().await.last_ring.unwrap().is_active());

        let result = handle_stop_ring(&ctx).await;
        let CommandResult::Completed { response } = result else {
            panic!("stop ring failed");
        };
        assert!(response.get("duration_ms").and_then(Value::as_u64).is_some());
        assert!(!ctx.state.read().await.last_ring.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_stop_without_ring_fails() {
        let ctx = ctx();
        let result = handle_stop_ring(&ctx).await;
        assert!(matches!(result, CommandResult::Failed { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_ring_does_not_restart_window() {
        let ctx = ctx();
        handle_ring(&ctx, None).await;
        let triggered = ctx.state.read().await.last_ring.unwrap().triggered_at_ms;

        handle_ring(&ctx, None).await;
        assert_eq!(
            ctx.state.read().await.last_ring.unwrap().triggered_at_ms,
            triggered
        );
    }
}
