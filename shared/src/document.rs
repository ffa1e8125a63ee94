//! Explicit document codecs for the store's key/value records
//!
//! Every entity maps to and from the generic record field-by-field. Absent
//! optional fields decode to `None`, never to a zero value that looks like
//! real data; unknown enum strings decode to `WireValue::Unrecognized`,
//! never an error. One malformed record yields a typed `DocumentError` the
//! batch reader classifies independently.

use crate::command::{Command, CommandParams, WireValue};
use crate::status::{DeviceStatusEntity, LocationData, LostModeData, RingData};
use crate::user::UserRecord;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// The store's native record representation
pub type Document = Map<String, Value>;

/// Marker key for a value the store resolves to its own clock on commit
pub const SERVER_TIMESTAMP_KEY: &str = "__server_timestamp__";

/// Field value the store replaces with its own clock on commit
pub fn server_timestamp() -> Value {
    json!({ SERVER_TIMESTAMP_KEY: true })
}

/// Whether a value is an unresolved server-timestamp sentinel
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| map.contains_key(SERVER_TIMESTAMP_KEY))
        .unwrap_or(false)
}

/// Errors for records that are structurally unusable
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} has wrong type: expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

fn require_str(doc: &Document, field: &'static str) -> Result<String, DocumentError> {
    match doc.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DocumentError::WrongType {
            field,
            expected: "string",
        }),
        None => Err(DocumentError::MissingField(field)),
    }
}

fn get_str(doc: &Document, field: &str) -> Option<String> {
    doc.get(field).and_then(Value::as_str).map(str::to_string)
}

fn get_u64(doc: &Document, field: &str) -> Option<u64> {
    // Unresolved server-timestamp sentinels read as absent
    doc.get(field).and_then(Value::as_u64)
}

fn get_f64(doc: &Document, field: &str) -> Option<f64> {
    doc.get(field).and_then(Value::as_f64)
}

fn get_bool(doc: &Document, field: &str) -> Option<bool> {
    doc.get(field).and_then(Value::as_bool)
}

fn get_object<'a>(doc: &'a Document, field: &str) -> Option<&'a Document> {
    doc.get(field).and_then(Value::as_object)
}

fn put_ts(doc: &mut Document, field: &str, ts: Option<u64>) {
    match ts {
        Some(value) => {
            doc.insert(field.to_string(), json!(value));
        }
        None => {
            doc.insert(field.to_string(), server_timestamp());
        }
    }
}

impl Command {
    /// Decode a command record; unknown type/status degrade to sentinels
    pub fn from_document(doc: &Document) -> Result<Command, DocumentError> {
        let kind = WireValue::from_wire(&require_str(doc, "type")?);
        let status = WireValue::from_wire(&require_str(doc, "status")?);

        let params = match doc.get("params") {
            Some(Value::Object(map)) => Some(CommandParams::from_document(map)),
            None | Some(Value::Null) => None,
            Some(_) => {
                return Err(DocumentError::WrongType {
                    field: "params",
                    expected: "object",
                })
            }
        };

        Ok(Command {
            kind,
            status,
            params,
            created_at_ms: get_u64(doc, "created_at"),
            executed_at_ms: get_u64(doc, "executed_at"),
            device_response: get_object(doc, "device_response").cloned(),
            requester_uid: get_str(doc, "requester_uid"),
        })
    }

    /// Encode for the store; an unassigned `created_at` is written as a
    /// server-timestamp sentinel
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("type".into(), json!(self.kind.wire_str()));
        doc.insert("status".into(), json!(self.status.wire_str()));
        if let Some(params) = &self.params {
            doc.insert("params".into(), Value::Object(params.to_document()));
        }
        put_ts(&mut doc, "created_at", self.created_at_ms);
        if let Some(ts) = self.executed_at_ms {
            doc.insert("executed_at".into(), json!(ts));
        }
        if let Some(response) = &self.device_response {
            doc.insert("device_response".into(), Value::Object(response.clone()));
        }
        if let Some(uid) = &self.requester_uid {
            doc.insert("requester_uid".into(), json!(uid));
        }
        doc
    }
}

impl CommandParams {
    pub fn from_document(doc: &Document) -> CommandParams {
        CommandParams {
            message: get_str(doc, "message"),
            phone_number: get_str(doc, "phone_number"),
            play_sound: get_bool(doc, "play_sound").unwrap_or(true),
            duration_seconds: get_u64(doc, "duration_seconds"),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(message) = &self.message {
            doc.insert("message".into(), json!(message));
        }
        if let Some(phone) = &self.phone_number {
            doc.insert("phone_number".into(), json!(phone));
        }
        doc.insert("play_sound".into(), json!(self.play_sound));
        if let Some(secs) = self.duration_seconds {
            doc.insert("duration_seconds".into(), json!(secs));
        }
        doc
    }
}

impl LocationData {
    pub fn from_document(doc: &Document) -> LocationData {
        LocationData {
            latitude: get_f64(doc, "latitude").unwrap_or(0.0),
            longitude: get_f64(doc, "longitude").unwrap_or(0.0),
            accuracy_m: get_f64(doc, "accuracy").unwrap_or(0.0),
            timestamp_ms: get_u64(doc, "timestamp"),
            address: get_str(doc, "address"),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("latitude".into(), json!(self.latitude));
        doc.insert("longitude".into(), json!(self.longitude));
        doc.insert("accuracy".into(), json!(self.accuracy_m));
        if let Some(ts) = self.timestamp_ms {
            doc.insert("timestamp".into(), json!(ts));
        }
        if let Some(address) = &self.address {
            doc.insert("address".into(), json!(address));
        }
        doc
    }
}

impl LostModeData {
    pub fn from_document(doc: &Document) -> LostModeData {
        LostModeData {
            enabled: get_bool(doc, "enabled").unwrap_or(false),
            message: get_str(doc, "message"),
            phone_number: get_str(doc, "phone_number"),
            enabled_at_ms: get_u64(doc, "enabled_at"),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("enabled".into(), json!(self.enabled));
        if let Some(message) = &self.message {
            doc.insert("message".into(), json!(message));
        }
        if let Some(phone) = &self.phone_number {
            doc.insert("phone_number".into(), json!(phone));
        }
        if let Some(ts) = self.enabled_at_ms {
            doc.insert("enabled_at".into(), json!(ts));
        }
        doc
    }
}

impl RingData {
    pub fn from_document(doc: &Document) -> RingData {
        RingData {
            triggered_at_ms: get_u64(doc, "triggered_at"),
            stopped_at_ms: get_u64(doc, "stopped_at"),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(ts) = self.triggered_at_ms {
            doc.insert("triggered_at".into(), json!(ts));
        }
        if let Some(ts) = self.stopped_at_ms {
            doc.insert("stopped_at".into(), json!(ts));
        }
        doc
    }
}

impl DeviceStatusEntity {
    pub fn from_document(doc: &Document) -> DeviceStatusEntity {
        DeviceStatusEntity {
            last_location: get_object(doc, "last_location").map(LocationData::from_document),
            lost_mode: get_object(doc, "lost_mode").map(LostModeData::from_document),
            last_ring: get_object(doc, "last_ring").map(RingData::from_document),
            online: get_bool(doc, "online").unwrap_or(false),
            last_seen_ms: get_u64(doc, "last_seen"),
        }
    }

    /// Encode for the store; an unassigned `last_seen` becomes a
    /// server-timestamp sentinel
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(location) = &self.last_location {
            doc.insert("last_location".into(), Value::Object(location.to_document()));
        }
        if let Some(lost_mode) = &self.lost_mode {
            doc.insert("lost_mode".into(), Value::Object(lost_mode.to_document()));
        }
        if let Some(ring) = &self.last_ring {
            doc.insert("last_ring".into(), Value::Object(ring.to_document()));
        }
        doc.insert("online".into(), json!(self.online));
        put_ts(&mut doc, "last_seen", self.last_seen_ms);
        doc
    }
}

impl UserRecord {
    pub fn from_document(doc: &Document) -> Result<UserRecord, DocumentError> {
        let tokens = match doc.get("fcm_tokens") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(DocumentError::WrongType {
                    field: "fcm_tokens",
                    expected: "array",
                })
            }
        };

        Ok(UserRecord {
            uid: require_str(doc, "uid")?,
            email: get_str(doc, "email"),
            fcm_tokens: tokens,
            created_at_ms: get_u64(doc, "created_at"),
        })
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("uid".into(), json!(self.uid));
        if let Some(email) = &self.email {
            doc.insert("email".into(), json!(email));
        }
        doc.insert("fcm_tokens".into(), json!(self.fcm_tokens));
        put_ts(&mut doc, "created_at", self.created_at_ms);
        doc
    }
}
