//! Wake-notification channel contract
//!
//! Delivery is best-effort, at-least-once, and unordered. A signal may arrive
//! before the document write it announces is readable, or never arrive at
//! all; receipt is only a hint to poll. The command loop must be correct if
//! this channel stays silent forever.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the wake channel
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("wake channel unavailable: {0}")]
    Unavailable(String),
}

/// A wake-up hint for one device; carries no payload contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeSignal {
    /// Token or topic the signal was addressed to
    pub topic: String,
}

/// Asynchronous wake-notification operations
#[async_trait]
pub trait WakeChannel: Send + Sync {
    /// Deliver a wake hint to one delivery address
    async fn notify_token(&self, token: &str) -> Result<(), NotifyError>;

    /// Deliver a wake hint to every member of a topic
    async fn notify_topic(&self, topic: &str) -> Result<(), NotifyError>;

    /// Add a delivery address to a topic; idempotent
    async fn subscribe(&self, token: &str, topic: &str) -> Result<(), NotifyError>;

    /// Remove a delivery address from a topic; idempotent
    async fn unsubscribe(&self, token: &str, topic: &str) -> Result<(), NotifyError>;
}
