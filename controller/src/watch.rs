//! Typed wrappers over raw document watches
//!
//! A record written by a newer peer may not decode into this build's types.
//! The wrappers skip such snapshots instead of closing the stream, so one
//! bad write never kills a subscription.

use lodestone_shared::command::Command;
use lodestone_shared::status::DeviceStatusEntity;
use lodestone_shared::store::Watch;

/// Decoded change stream for a single command document
pub struct CommandUpdates {
    watch: Watch,
}

impl CommandUpdates {
    pub fn new(watch: Watch) -> Self {
        Self { watch }
    }

    /// Next decodable snapshot, or `None` once the subscription is closed
    pub async fn next(&mut self) -> Option<Command> {
        while let Some(event) = self.watch.next().await {
            match Command::from_document(&event.doc) {
                Ok(command) => return Some(command),
                Err(e) => eprintln!("skipping undecodable command at {}: {e}", event.path),
            }
        }
        None
    }

    pub fn cancel(self) {
        self.watch.cancel();
    }
}

/// Decoded change stream for a device status document
pub struct DeviceStatusUpdates {
    watch: Watch,
}

impl DeviceStatusUpdates {
    pub fn new(watch: Watch) -> Self {
        Self { watch }
    }

    /// Next snapshot, or `None` once the subscription is closed.
    /// Status decoding is lenient: unknown or missing fields fall back to
    /// defaults rather than dropping the snapshot.
    pub async fn next(&mut self) -> Option<DeviceStatusEntity> {
        let event = self.watch.next().await?;
        Some(DeviceStatusEntity::from_document(&event.doc))
    }

    pub fn cancel(self) {
        self.watch.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_shared::command::{CommandStatus, CommandType};
    use lodestone_shared::emulator::MemoryStore;
    use lodestone_shared::store::DocumentStore;
    use lodestone_shared::{now_ms, paths};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_command_updates_deliver_snapshot_then_changes() {
        let store = Arc::new(MemoryStore::new());
        let path = paths::command("u1", "d1", "c1");
        store
            .set(&path, Command::new(CommandType::Ring).to_document())
            .await
            .unwrap();

        let mut updates = CommandUpdates::new(store.watch(&path).await.unwrap());
        let first = updates.next().await.unwrap();
        assert_eq!(first.status.known(), Some(CommandStatus::Pending));

        store
            .update(&path, {
                let mut fields = lodestone_shared::document::Document::new();
                fields.insert("status".into(), json!("EXECUTING"));
                fields
            })
            .await
            .unwrap();
        let second = updates.next().await.unwrap();
        assert_eq!(second.status.known(), Some(CommandStatus::Executing));
    }

    #[tokio::test]
    async fn test_undecodable_snapshot_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let path = paths::command("u1", "d1", "c1");

        // Missing the required "type" field
        let mut bad = lodestone_shared::document::Document::new();
        bad.insert("status".into(), json!("PENDING"));
        store.set(&path, bad).await.unwrap();

        let mut updates = CommandUpdates::new(store.watch(&path).await.unwrap());
        store
            .set(&path, Command::new(CommandType::Locate).to_document())
            .await
            .unwrap();

        // The bad initial snapshot is consumed silently; the good write lands
        let decoded = updates.next().await.unwrap();
        assert_eq!(decoded.kind.known(), Some(CommandType::Locate));
    }

    #[tokio::test]
    async fn test_status_updates_decode_entity() {
        let store = Arc::new(MemoryStore::new());
        let path = paths::device("u1", "d1");

        let entity = DeviceStatusEntity {
            online: true,
            last_seen_ms: Some(now_ms()),
            ..Default::default()
        };
        store.set(&path, entity.to_document()).await.unwrap();

        let mut updates = DeviceStatusUpdates::new(store.watch(&path).await.unwrap());
        let decoded = updates.next().await.unwrap();
        assert!(decoded.online);
    }
}
