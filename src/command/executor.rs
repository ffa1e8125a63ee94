//! Command executor - claims pending commands and runs their handlers

use super::handlers::{self, HandlerContext};
use super::CommandResult;
use crate::retry::with_backoff;
use lodestone_shared::command::{
    response, Command, CommandParams, CommandStatus, CommandType, WireCodec,
};
use lodestone_shared::document::{server_timestamp, Document};
use lodestone_shared::lifecycle::{Actor, CommandLifecycle, TransitionResult};
use lodestone_shared::store::{DocumentStore, StoreError};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Claims and executes commands for one device
///
/// A claim is never re-entrant: any command observed past PENDING is left
/// alone, which makes duplicate wake deliveries harmless.
pub struct CommandExecutor {
    store: Arc<dyn DocumentStore>,
    commands_path: String,
    ctx: HandlerContext,
}

impl CommandExecutor {
    pub fn new(store: Arc<dyn DocumentStore>, commands_path: String, ctx: HandlerContext) -> Self {
        Self {
            store,
            commands_path,
            ctx,
        }
    }

    /// Poll the command collection and execute everything still pending.
    /// Returns how many commands reached a terminal status in this pass.
    pub async fn drain_pending(&self) -> Result<usize, StoreError> {
        let records = self.store.list(&self.commands_path).await?;
        let mut executed = 0;

        for (id, doc) in records {
            let command = match Command::from_document(&doc) {
                Ok(command) => command,
                Err(e) => {
                    // One bad record never aborts the poll
                    warn!("skipping malformed command {id}: {e}");
                    continue;
                }
            };
            if command.status.known() != Some(CommandStatus::Pending) {
                continue;
            }
            if self.execute(&id, &command).await? {
                executed += 1;
            }
        }

        Ok(executed)
    }

    /// Execute one pending command.
    /// Returns `false` when the claim was lost or the record is unusable.
    pub async fn execute(&self, id: &str, command: &Command) -> Result<bool, StoreError> {
        let path = format!("{}/{}", self.commands_path, id);

        // Re-read before claiming: a duplicate wake may have raced us here
        let Some(doc) = self.store.get(&path).await? else {
            return Ok(false);
        };
        let current = match Command::from_document(&doc) {
            Ok(current) => current,
            Err(e) => {
                warn!("command {id} unreadable at claim time: {e}");
                return Ok(false);
            }
        };
        if current.status.known() != Some(CommandStatus::Pending) {
            debug!("command {id} already claimed, skipping");
            return Ok(false);
        }

        let mut lifecycle = CommandLifecycle::new();

        let Some(kind) = command.kind.known() else {
            // Unrecognized kind fails straight from PENDING; the claim is
            // never taken and the raw wire string is recorded for the
            // controller
            info!(
                "command {id}: unrecognized type \"{}\"",
                command.kind.wire_str()
            );
            let reason = format!("unrecognized command type: {}", command.kind.wire_str());
            self.advance(
                &path,
                &mut lifecycle,
                CommandStatus::Failed,
                Some(response::error(&reason)),
            )
            .await?;
            return Ok(true);
        };

        if !self
            .advance(&path, &mut lifecycle, CommandStatus::Executing, None)
            .await?
        {
            return Ok(false);
        }
        info!("executing command {id} ({kind})");

        match self.dispatch(kind, command.params.as_ref()).await {
            CommandResult::Completed { response } => {
                self.advance(&path, &mut lifecycle, CommandStatus::Executed, Some(response))
                    .await?;
            }
            CommandResult::Failed { reason } => {
                warn!("command {id} failed: {reason}");
                self.advance(
                    &path,
                    &mut lifecycle,
                    CommandStatus::Failed,
                    Some(response::error(&reason)),
                )
                .await?;
            }
        }
        Ok(true)
    }

    async fn dispatch(&self, kind: CommandType, params: Option<&CommandParams>) -> CommandResult {
        match kind {
            CommandType::Ring => handlers::handle_ring(&self.ctx, params).await,
            CommandType::StopRing => handlers::handle_stop_ring(&self.ctx).await,
            CommandType::Locate => handlers::handle_locate(&self.ctx).await,
            CommandType::Lock => handlers::handle_lock(&self.ctx, params).await,
            CommandType::Unlock => handlers::handle_unlock(&self.ctx).await,
            CommandType::StartTracking => {
                handlers::handle_start_tracking(&self.ctx, params).await
            }
            CommandType::StopTracking => handlers::handle_stop_tracking(&self.ctx).await,
        }
    }

    /// Apply a lifecycle transition and persist it. Terminal transitions also
    /// set `executed_at` and the device response. Returns `false` when the
    /// state machine rejects the transition; nothing is written in that case.
    async fn advance(
        &self,
        path: &str,
        lifecycle: &mut CommandLifecycle,
        to: CommandStatus,
        device_response: Option<Map<String, Value>>,
    ) -> Result<bool, StoreError> {
        match lifecycle.apply(to, Actor::Target) {
            TransitionResult::Advanced(status) => {
                let mut fields = Document::new();
                fields.insert("status".into(), json!(status.wire_str()));
                if status.is_terminal() {
                    fields.insert("executed_at".into(), server_timestamp());
                    if let Some(response) = device_response {
                        fields.insert("device_response".into(), Value::Object(response));
                    }
                }
                with_backoff("status transition", || {
                    self.store.update(path, fields.clone())
                })
                .await?;
                Ok(true)
            }
            TransitionResult::Rejected { from, to, .. } => {
                warn!("refusing illegal transition {from} -> {to} for {path}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StaticLocationSource;
    use crate::state::DeviceState;
    use lodestone_shared::emulator::MemoryStore;
    use lodestone_shared::paths;
    use tokio::sync::RwLock;

    fn executor(store: Arc<MemoryStore>) -> CommandExecutor {
        let ctx = HandlerContext {
            device_id: "d1".into(),
            state: Arc::new(RwLock::new(DeviceState::default())),
            location: Arc::new(StaticLocationSource::new(48.2082, 16.3738, 12.0)),
        };
        CommandExecutor::new(store, paths::commands("u1", "d1"), ctx)
    }

    async fn stored_command(store: &MemoryStore, id: &str) -> Command {
        let doc = store
            .get(&paths::command("u1", "d1", id))
            .await
            .unwrap()
            .unwrap();
        Command::from_document(&doc).unwrap()
    }

    #[tokio::test]
    async fn test_pending_ring_reaches_executed() {
        let store = Arc::new(MemoryStore::new());
        let id = store
            .create(
                &paths::commands("u1", "d1"),
                Command::new(CommandType::Ring).to_document(),
            )
            .await
            .unwrap();

        let executed = executor(store.clone()).drain_pending().await.unwrap();
        assert_eq!(executed, 1);

        let command = stored_command(&store, &id).await;
        assert_eq!(command.status.known(), Some(CommandStatus::Executed));
        assert!(command.executed_at_ms.is_some());
        assert!(command.device_response.is_some());
    }

    #[tokio::test]
    async fn test_second_reader_does_not_reclaim() {
        let store = Arc::new(MemoryStore::new());
        let id = store
            .create(
                &paths::commands("u1", "d1"),
                Command::new(CommandType::Ring).to_document(),
            )
            .await
            .unwrap();

        let pending = stored_command(&store, &id).await;

        // Two independent readers race on the same snapshot
        let first = executor(store.clone());
        let second = executor(store.clone());

        assert!(first.execute(&id, &pending).await.unwrap());
        // The second reader observes the command past PENDING and backs off
        assert!(!second.execute(&id, &pending).await.unwrap());

        let command = stored_command(&store, &id).await;
        assert_eq!(command.status.known(), Some(CommandStatus::Executed));
    }

    #[tokio::test]
    async fn test_unknown_type_fails_without_claim() {
        let store = Arc::new(MemoryStore::new());
        let mut doc = Document::new();
        doc.insert("type".into(), json!("RESTART"));
        doc.insert("status".into(), json!("PENDING"));
        let id = store.create(&paths::commands("u1", "d1"), doc).await.unwrap();

        // Watch before executing so intermediate states would be visible
        let mut watch = store
            .watch(&paths::command("u1", "d1", &id))
            .await
            .unwrap();

        let executed = executor(store.clone()).drain_pending().await.unwrap();
        assert_eq!(executed, 1);

        let command = stored_command(&store, &id).await;
        assert_eq!(command.status.known(), Some(CommandStatus::Failed));
        let reason = command.device_response.unwrap();
        assert!(reason
            .get("error")
            .and_then(Value::as_str)
            .unwrap()
            .contains("RESTART"));

        // Observed statuses: PENDING snapshot, then FAILED. Never EXECUTING.
        let mut seen = Vec::new();
        while let Some(event) = watch.try_next() {
            seen.push(event.doc.get("status").unwrap().as_str().unwrap().to_string());
        }
        assert_eq!(seen, vec!["PENDING".to_string(), "FAILED".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_abort_poll() {
        let store = Arc::new(MemoryStore::new());
        let mut bad = Document::new();
        bad.insert("status".into(), json!("PENDING")); // no type field
        store.create(&paths::commands("u1", "d1"), bad).await.unwrap();
        let good_id = store
            .create(
                &paths::commands("u1", "d1"),
                Command::new(CommandType::Lock).to_document(),
            )
            .await
            .unwrap();

        let executed = executor(store.clone()).drain_pending().await.unwrap();
        assert_eq!(executed, 1);
        let command = stored_command(&store, &good_id).await;
        assert_eq!(command.status.known(), Some(CommandStatus::Executed));
    }
}
