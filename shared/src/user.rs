//! User record carrying the delivery-address set

/// Per-user record at `users/{uid}`
///
/// `fcm_tokens` has set semantics: adding an address that is already present
/// is a no-op, and concurrent adds from multiple devices never lose entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    /// Delivery addresses for wake signals, one per registered device
    pub fcm_tokens: Vec<String>,
    /// Server-assigned on creation
    pub created_at_ms: Option<u64>,
}

impl UserRecord {
    /// Minimal record created when a token is registered for a new user
    pub fn new(uid: impl Into<String>, email: Option<String>, token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
            fcm_tokens: vec![token.into()],
            created_at_ms: None,
        }
    }
}
