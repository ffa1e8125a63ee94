//! Command dispatcher for issuing commands to target devices

use crate::watch::{CommandUpdates, DeviceStatusUpdates};
use lodestone_shared::command::{Command, CommandParams, CommandStatus, CommandType};
use lodestone_shared::notify::WakeChannel;
use lodestone_shared::store::{DocumentStore, StoreError};
use lodestone_shared::user::UserRecord;
use lodestone_shared::{now_ms, paths};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tracks an issued command until a terminal status is observed
#[derive(Debug, Clone)]
pub struct IssuedCommand {
    pub command_id: String,
    pub device_id: String,
    pub kind: CommandType,
    pub issued_at_ms: u64,
    pub last_status: CommandStatus,
}

impl IssuedCommand {
    /// Outstanding past `threshold_ms` without reaching a terminal status.
    /// There is no lease in the data model; this is wall-clock detection.
    pub fn is_stale(&self, now_ms: u64, threshold_ms: u64) -> bool {
        !self.last_status.is_terminal()
            && now_ms.saturating_sub(self.issued_at_ms) >= threshold_ms
    }
}

/// Issues commands and fans out best-effort wake signals
pub struct CommandDispatcher {
    store: Arc<dyn DocumentStore>,
    wake: Arc<dyn WakeChannel>,
    uid: String,
    /// Issued commands by command id
    pending: Arc<RwLock<HashMap<String, IssuedCommand>>>,
}

impl CommandDispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, wake: Arc<dyn WakeChannel>, uid: &str) -> Self {
        Self {
            store,
            wake,
            uid: uid.to_string(),
            pending: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a PENDING command for `device_id` and send wake hints.
    /// Returns the store-assigned command id.
    pub async fn issue(
        &self,
        device_id: &str,
        kind: CommandType,
        params: Option<CommandParams>,
    ) -> Result<String, StoreError> {
        let mut command = Command::new(kind).with_requester(&self.uid);
        if let Some(params) = params {
            command = command.with_params(params);
        }

        let collection = paths::commands(&self.uid, device_id);
        let id = self.store.create(&collection, command.to_document()).await?;

        self.pending.write().await.insert(
            id.clone(),
            IssuedCommand {
                command_id: id.clone(),
                device_id: device_id.to_string(),
                kind,
                issued_at_ms: now_ms(),
                last_status: CommandStatus::Pending,
            },
        );

        // Wake fan-out is an optimization; failures never fail the issue
        self.send_wakes(device_id).await;

        println!(">>> Issued {kind} command {id} to {device_id}");
        Ok(id)
    }

    /// Wake every delivery address on the user record, plus the device topic
    async fn send_wakes(&self, device_id: &str) {
        let record = match self.store.get(&paths::user(&self.uid)).await {
            Ok(Some(doc)) => match UserRecord::from_document(&doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    eprintln!("unreadable user record, skipping token fan-out: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                eprintln!("wake fan-out read failed: {e}");
                None
            }
        };

        if let Some(record) = record {
            for token in &record.fcm_tokens {
                if let Err(e) = self.wake.notify_token(token).await {
                    eprintln!("wake delivery to {token} failed: {e}");
                }
            }
        }
        if let Err(e) = self.wake.notify_topic(&paths::device_topic(device_id)).await {
            eprintln!("topic wake failed: {e}");
        }
    }

    /// Record a status observed on a watch stream; terminal statuses clear
    /// the pending entry
    pub async fn observe_status(&self, command_id: &str, status: CommandStatus) {
        let mut pending = self.pending.write().await;
        if let Some(command) = pending.get_mut(command_id) {
            command.last_status = status;
            if status.is_terminal() {
                println!("<<< Command {command_id} finished: {status}");
                pending.remove(command_id);
            }
        }
    }

    /// Commands not yet observed terminal
    pub async fn outstanding(&self) -> Vec<IssuedCommand> {
        self.pending.read().await.values().cloned().collect()
    }

    /// Commands outstanding past the staleness threshold
    pub async fn stale_commands(&self, threshold_ms: u64) -> Vec<IssuedCommand> {
        let now = now_ms();
        self.pending
            .read()
            .await
            .values()
            .filter(|command| command.is_stale(now, threshold_ms))
            .cloned()
            .collect()
    }

    /// Watch one issued command's document for status changes
    pub async fn watch_command(
        &self,
        device_id: &str,
        command_id: &str,
    ) -> Result<CommandUpdates, StoreError> {
        let path = paths::command(&self.uid, device_id, command_id);
        Ok(CommandUpdates::new(self.store.watch(&path).await?))
    }

    /// Watch a device's status projection
    pub async fn watch_device(&self, device_id: &str) -> Result<DeviceStatusUpdates, StoreError> {
        let path = paths::device(&self.uid, device_id);
        Ok(DeviceStatusUpdates::new(self.store.watch(&path).await?))
    }
}
