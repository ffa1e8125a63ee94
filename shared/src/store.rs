//! Document store contract
//!
//! The store is a remote, eventually-consistent document database: per-field
//! last-write-wins inside a document, no transactions across documents. Only
//! the contract lives here; transports implement it.

use crate::document::Document;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The update target does not exist
    #[error("document not found: {0}")]
    NotFound(String),

    /// Network-level failure; retryable at the call site
    #[error("transport failure: {0}")]
    Transport(String),

    /// The stored record cannot satisfy the requested operation
    #[error("malformed record at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// A change notification carrying the full document snapshot
#[derive(Debug, Clone)]
pub struct DocumentEvent {
    pub path: String,
    pub doc: Document,
}

/// A cancellable change subscription
///
/// Dropping the watch cancels delivery. Events already queued when a watch is
/// cancelled are discarded, not delivered.
pub struct Watch {
    rx: mpsc::Receiver<DocumentEvent>,
}

impl Watch {
    pub fn new(rx: mpsc::Receiver<DocumentEvent>) -> Self {
        Self { rx }
    }

    /// Next change, or `None` once the subscription is closed
    pub async fn next(&mut self) -> Option<DocumentEvent> {
        self.rx.recv().await
    }

    /// Already-delivered change, without waiting
    pub fn try_next(&mut self) -> Option<DocumentEvent> {
        self.rx.try_recv().ok()
    }

    /// Stop all future deliveries
    pub fn cancel(mut self) {
        self.rx.close();
    }
}

/// Asynchronous document store operations
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document; `None` when absent
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError>;

    /// Create or fully overwrite a document
    async fn set(&self, path: &str, doc: Document) -> Result<(), StoreError>;

    /// Append to a collection; the store assigns and returns the id
    async fn create(&self, collection: &str, doc: Document) -> Result<String, StoreError>;

    /// Merge fields into an existing document.
    /// Fails with [`StoreError::NotFound`] when the document is absent.
    async fn update(&self, path: &str, fields: Document) -> Result<(), StoreError>;

    /// Commutative, idempotent set-add on an array field.
    /// Fails with [`StoreError::NotFound`] when the document is absent.
    async fn add_to_set(&self, path: &str, field: &str, value: Value) -> Result<(), StoreError>;

    /// List a collection's documents as `(id, document)` pairs
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError>;

    /// Subscribe to changes of a single document path.
    /// The current snapshot, if any, is delivered first.
    async fn watch(&self, path: &str) -> Result<Watch, StoreError>;
}
