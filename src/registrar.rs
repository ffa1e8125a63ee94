//! Wake-notification registration for the target device
//!
//! Registers this device's delivery address on the user record and manages
//! topic subscriptions. Registration is a commutative set-add so concurrent
//! registrations from a user's other devices never lose an address.

use crate::retry::with_backoff;
use lodestone_shared::notify::{NotifyError, WakeChannel};
use lodestone_shared::paths;
use lodestone_shared::store::{DocumentStore, StoreError};
use lodestone_shared::user::UserRecord;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Authenticated identity of the device owner
#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn signed_in(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            email: Some(email.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            uid: None,
            email: None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.uid.is_none()
    }
}

/// Registers delivery addresses and topic subscriptions for wake signals
pub struct WakeRegistrar {
    store: Arc<dyn DocumentStore>,
    channel: Arc<dyn WakeChannel>,
}

impl WakeRegistrar {
    pub fn new(store: Arc<dyn DocumentStore>, channel: Arc<dyn WakeChannel>) -> Self {
        Self { store, channel }
    }

    /// Add `token` to the user's delivery-address set, creating the user
    /// record when it does not exist yet. Idempotent. A no-op for anonymous
    /// identities.
    pub async fn register_delivery_address(
        &self,
        identity: &Identity,
        token: &str,
    ) -> Result<(), StoreError> {
        let Some(uid) = identity.uid.as_deref() else {
            info!("skipping wake registration for anonymous identity");
            return Ok(());
        };
        let path = paths::user(uid);

        // Incremental set-add first; only an absent record falls through to
        // full-document creation
        match with_backoff("token set-add", || {
            self.store.add_to_set(&path, "fcm_tokens", json!(token))
        })
        .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => {
                info!("user record missing, creating {path}");
                let record = UserRecord::new(uid, identity.email.clone(), token).to_document();
                with_backoff("user record create", || {
                    self.store.set(&path, record.clone())
                })
                .await
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort topic membership; failure never blocks command processing
    pub async fn subscribe(&self, token: &str, topic: &str) -> Result<(), NotifyError> {
        self.channel.subscribe(token, topic).await
    }

    /// Best-effort topic removal; idempotent
    pub async fn unsubscribe(&self, token: &str, topic: &str) -> Result<(), NotifyError> {
        self.channel.unsubscribe(token, topic).await
    }
}
