//! Remote command model and wire codec
//!
//! A command is a single requested action with a lifecycle status. Both the
//! controller and the target read and write the same command document under
//! last-write-wins semantics, so every type here is pure data.

use serde_json::{Map, Value};
use std::fmt;

/// String codec shared by the closed wire enums
pub trait WireCodec: Sized + Copy {
    /// The unique wire string for this member
    fn wire_str(&self) -> &'static str;

    /// Reverse lookup; unknown strings return `None`, never an error
    fn from_wire(s: &str) -> Option<Self>;
}

/// Kinds of remote command a controller can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    Ring,
    StopRing,
    Locate,
    Lock,
    Unlock,
    StartTracking,
    StopTracking,
}

impl CommandType {
    /// Every defined member, for table-driven tests and registries
    pub const ALL: [CommandType; 7] = [
        CommandType::Ring,
        CommandType::StopRing,
        CommandType::Locate,
        CommandType::Lock,
        CommandType::Unlock,
        CommandType::StartTracking,
        CommandType::StopTracking,
    ];
}

impl WireCodec for CommandType {
    fn wire_str(&self) -> &'static str {
        match self {
            CommandType::Ring => "RING",
            CommandType::StopRing => "STOP_RING",
            CommandType::Locate => "LOCATE",
            CommandType::Lock => "LOCK",
            CommandType::Unlock => "UNLOCK",
            CommandType::StartTracking => "START_TRACKING",
            CommandType::StopTracking => "STOP_TRACKING",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "RING" => Some(CommandType::Ring),
            "STOP_RING" => Some(CommandType::StopRing),
            "LOCATE" => Some(CommandType::Locate),
            "LOCK" => Some(CommandType::Lock),
            "UNLOCK" => Some(CommandType::Unlock),
            "START_TRACKING" => Some(CommandType::StartTracking),
            "STOP_TRACKING" => Some(CommandType::StopTracking),
            _ => None,
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_str())
    }
}

/// Lifecycle states of a command, strictly forward-moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    Pending,
    Executing,
    Executed,
    Failed,
}

impl CommandStatus {
    /// Every defined member
    pub const ALL: [CommandStatus; 4] = [
        CommandStatus::Pending,
        CommandStatus::Executing,
        CommandStatus::Executed,
        CommandStatus::Failed,
    ];

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Executed | CommandStatus::Failed)
    }
}

impl WireCodec for CommandStatus {
    fn wire_str(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "PENDING",
            CommandStatus::Executing => "EXECUTING",
            CommandStatus::Executed => "EXECUTED",
            CommandStatus::Failed => "FAILED",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(CommandStatus::Pending),
            "EXECUTING" => Some(CommandStatus::Executing),
            "EXECUTED" => Some(CommandStatus::Executed),
            "FAILED" => Some(CommandStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_str())
    }
}

/// A wire value this build may not recognize
///
/// Unrecognized values keep their raw string and re-encode unchanged, so a
/// reader that does not understand a field never corrupts it for one that
/// does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue<T> {
    Known(T),
    Unrecognized(String),
}

impl<T: WireCodec> WireValue<T> {
    /// Decode a wire string; never fails
    pub fn from_wire(raw: &str) -> Self {
        match T::from_wire(raw) {
            Some(value) => WireValue::Known(value),
            None => WireValue::Unrecognized(raw.to_string()),
        }
    }

    /// The decoded member, or `None` for unrecognized values
    pub fn known(&self) -> Option<T> {
        match self {
            WireValue::Known(value) => Some(*value),
            WireValue::Unrecognized(_) => None,
        }
    }

    /// The wire string, preserved verbatim for unrecognized values
    pub fn wire_str(&self) -> &str {
        match self {
            WireValue::Known(value) => value.wire_str(),
            WireValue::Unrecognized(raw) => raw,
        }
    }
}

/// Command-specific arguments
///
/// Which fields are meaningful depends on the command kind; validity is
/// decided by the executing target, not enforced structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandParams {
    /// Free-text message (lock screen overlay, ring banner)
    pub message: Option<String>,
    /// Contact phone number to display while locked
    pub phone_number: Option<String>,
    /// Whether a ring should play an audible sound
    pub play_sound: bool,
    /// Tracking window length in seconds
    pub duration_seconds: Option<u64>,
}

impl Default for CommandParams {
    fn default() -> Self {
        Self {
            message: None,
            phone_number: None,
            play_sound: true,
            duration_seconds: None,
        }
    }
}

/// A single remote command document
///
/// The document id is assigned by the store on creation and travels alongside
/// the value, never inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: WireValue<CommandType>,
    pub status: WireValue<CommandStatus>,
    pub params: Option<CommandParams>,
    /// Server-assigned on creation; absent until the store commits it
    pub created_at_ms: Option<u64>,
    /// Set by the target when it reaches a terminal status
    pub executed_at_ms: Option<u64>,
    /// Free-form payload returned by the target
    pub device_response: Option<Map<String, Value>>,
    /// Identity of the issuing controller
    pub requester_uid: Option<String>,
}

impl Command {
    /// Create a new command in PENDING state
    pub fn new(kind: CommandType) -> Self {
        Self {
            kind: WireValue::Known(kind),
            status: WireValue::Known(CommandStatus::Pending),
            params: None,
            created_at_ms: None,
            executed_at_ms: None,
            device_response: None,
            requester_uid: None,
        }
    }

    /// Attach command-specific arguments
    pub fn with_params(mut self, params: CommandParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Record the issuing controller's identity
    pub fn with_requester(mut self, uid: impl Into<String>) -> Self {
        self.requester_uid = Some(uid.into());
        self
    }

    /// Age since creation by the store's clock, if the store has assigned one
    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.created_at_ms.map(|ts| now_ms.saturating_sub(ts))
    }
}

/// Canonical `device_response` payload shapes written by the target
///
/// The field stays an open map on the wire; these builders give each command
/// kind a minimal canonical shape.
pub mod response {
    use serde_json::{json, Map, Value};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn ring_started(play_sound: bool) -> Map<String, Value> {
        object(json!({ "ringing": true, "play_sound": play_sound }))
    }

    pub fn ring_stopped(duration_ms: u64) -> Map<String, Value> {
        object(json!({ "ringing": false, "duration_ms": duration_ms }))
    }

    pub fn location_fix(latitude: f64, longitude: f64, accuracy_m: f64) -> Map<String, Value> {
        object(json!({
            "latitude": latitude,
            "longitude": longitude,
            "accuracy": accuracy_m,
        }))
    }

    pub fn lost_mode(enabled: bool) -> Map<String, Value> {
        object(json!({ "lost_mode_enabled": enabled }))
    }

    pub fn tracking(active: bool, until_ms: Option<u64>) -> Map<String, Value> {
        let mut map = object(json!({ "tracking": active }));
        if let Some(until) = until_ms {
            map.insert("until".into(), json!(until));
        }
        map
    }

    pub fn error(reason: &str) -> Map<String, Value> {
        object(json!({ "error": reason }))
    }
}
