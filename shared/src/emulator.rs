//! In-memory store and wake-channel doubles for development and tests
//!
//! Semantics match the production contracts: per-field last-write-wins
//! merges, server-timestamp resolution on commit, watch fan-out with full
//! document snapshots, best-effort wake routing by token and topic.

use crate::document::{is_server_timestamp, Document};
use crate::notify::{NotifyError, WakeChannel, WakeSignal};
use crate::store::{DocumentEvent, DocumentStore, StoreError, Watch};
use crate::{now_ms, sync};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::RwLock;

/// In-memory [`DocumentStore`]
#[derive(Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<HashMap<String, Document>>>,
    watchers: Arc<RwLock<HashMap<String, Vec<mpsc::Sender<DocumentEvent>>>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve_timestamps(doc: &mut Document) {
        let ts = now_ms();
        for value in doc.values_mut() {
            if is_server_timestamp(value) {
                *value = Value::from(ts);
            }
        }
    }

    async fn notify_watchers(&self, path: &str, doc: &Document) {
        let mut watchers = self.watchers.write().await;
        if let Some(senders) = watchers.get_mut(path) {
            // Closed subscribers are pruned; a full buffer drops the event
            // but keeps the subscription (watch is not a durable log)
            senders.retain(|tx| {
                !matches!(
                    tx.try_send(DocumentEvent {
                        path: path.to_string(),
                        doc: doc.clone(),
                    }),
                    Err(TrySendError::Closed(_))
                )
            });
            if senders.is_empty() {
                watchers.remove(path);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.read().await.get(path).cloned())
    }

    async fn set(&self, path: &str, mut doc: Document) -> Result<(), StoreError> {
        Self::resolve_timestamps(&mut doc);
        self.docs
            .write()
            .await
            .insert(path.to_string(), doc.clone());
        self.notify_watchers(path, &doc).await;
        Ok(())
    }

    async fn create(&self, collection: &str, mut doc: Document) -> Result<String, StoreError> {
        let id = format!("c{:06}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let path = format!("{collection}/{id}");
        Self::resolve_timestamps(&mut doc);
        self.docs.write().await.insert(path.clone(), doc.clone());
        self.notify_watchers(&path, &doc).await;
        Ok(id)
    }

    async fn update(&self, path: &str, mut fields: Document) -> Result<(), StoreError> {
        Self::resolve_timestamps(&mut fields);
        let snapshot = {
            let mut docs = self.docs.write().await;
            let doc = docs
                .get_mut(path)
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            for (key, value) in fields {
                doc.insert(key, value);
            }
            doc.clone()
        };
        self.notify_watchers(path, &snapshot).await;
        Ok(())
    }

    async fn add_to_set(&self, path: &str, field: &str, value: Value) -> Result<(), StoreError> {
        let snapshot = {
            let mut docs = self.docs.write().await;
            let doc = docs
                .get_mut(path)
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            let entry = doc
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            let Value::Array(items) = entry else {
                return Err(StoreError::Malformed {
                    path: path.to_string(),
                    reason: format!("field {field} is not an array"),
                });
            };
            if !items.contains(&value) {
                items.push(value);
            }
            doc.clone()
        };
        self.notify_watchers(path, &snapshot).await;
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        let prefix = format!("{collection}/");
        let docs = self.docs.read().await;
        let mut records: Vec<(String, Document)> = docs
            .iter()
            .filter_map(|(path, doc)| {
                let id = path.strip_prefix(&prefix)?;
                // Direct children only, not nested collections
                (!id.contains('/')).then(|| (id.to_string(), doc.clone()))
            })
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }

    async fn watch(&self, path: &str) -> Result<Watch, StoreError> {
        let (tx, rx) = mpsc::channel(sync::WATCH_BUFFER);
        // Deliver the current snapshot first, if any
        if let Some(doc) = self.docs.read().await.get(path) {
            let _ = tx.try_send(DocumentEvent {
                path: path.to_string(),
                doc: doc.clone(),
            });
        }
        self.watchers
            .write()
            .await
            .entry(path.to_string())
            .or_default()
            .push(tx);
        Ok(Watch::new(rx))
    }
}

/// In-memory [`WakeChannel`]
///
/// Devices attach a listener per delivery token; topics fan out to tokens.
#[derive(Default)]
pub struct MemoryWakeChannel {
    listeners: Arc<RwLock<HashMap<String, mpsc::Sender<WakeSignal>>>>,
    topics: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl MemoryWakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listening device; signals for `token` arrive on the receiver
    pub async fn attach(&self, token: &str) -> mpsc::Receiver<WakeSignal> {
        let (tx, rx) = mpsc::channel(16);
        self.listeners.write().await.insert(token.to_string(), tx);
        rx
    }
}

#[async_trait]
impl WakeChannel for MemoryWakeChannel {
    async fn notify_token(&self, token: &str) -> Result<(), NotifyError> {
        // Unknown or closed listeners are fine: delivery is best-effort
        if let Some(tx) = self.listeners.read().await.get(token) {
            let _ = tx.try_send(WakeSignal {
                topic: token.to_string(),
            });
        }
        Ok(())
    }

    async fn notify_topic(&self, topic: &str) -> Result<(), NotifyError> {
        let tokens = self
            .topics
            .read()
            .await
            .get(topic)
            .cloned()
            .unwrap_or_default();
        for token in tokens {
            self.notify_token(&token).await?;
        }
        Ok(())
    }

    async fn subscribe(&self, token: &str, topic: &str) -> Result<(), NotifyError> {
        let mut topics = self.topics.write().await;
        let members = topics.entry(topic.to_string()).or_default();
        if !members.iter().any(|t| t == token) {
            members.push(token.to_string());
        }
        Ok(())
    }

    async fn unsubscribe(&self, token: &str, topic: &str) -> Result<(), NotifyError> {
        if let Some(members) = self.topics.write().await.get_mut(topic) {
            members.retain(|t| t != token);
        }
        Ok(())
    }
}
