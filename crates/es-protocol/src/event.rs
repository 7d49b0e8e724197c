//! Wire protocol events streamed by an agent backend.
//!
//! One frame on the wire is one JSON object, discriminated by its `kind`
//! field. Decoding is a single explicit step that fails closed: unrecognized
//! kinds become [`ProtocolEvent::Unknown`] instead of errors, so protocol
//! extensions never crash a consumer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A frame could not be decoded. Local to the frame: callers skip it and
/// keep decoding the stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
}

/// Task lifecycle state carried by a status-update event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Rejected,
    AuthRequired,
    /// Any state this client does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

/// One part of a message payload. Only text parts are interpreted; every
/// other part kind is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Part {
    Text { text: String },
    #[serde(untagged)]
    Other(Value),
}

/// Message attached to a status update. Part order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// The `status` object of a status-update frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<EventMessage>,
}

/// A `kind: "status-update"` frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(default)]
    pub status: TaskStatus,
}

impl StatusUpdate {
    /// A terminal failure update, used when the transport dies mid-stream
    /// and the session has to tell subscribers something went wrong.
    pub fn failed() -> Self {
        Self {
            is_final: true,
            status: TaskStatus {
                state: TaskState::Failed,
                message: None,
            },
        }
    }
}

/// A decoded protocol event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    /// Progress or result of the running task.
    StatusUpdate(StatusUpdate),
    /// Task lifecycle metadata. Opaque to this client.
    Task(Value),
    /// A direct message payload. Opaque to this client.
    Message(Value),
    /// Any frame whose `kind` is unrecognized or absent.
    Unknown { kind: Option<String>, raw: Value },
}

impl ProtocolEvent {
    /// Decode one frame. Unrecognized `kind` values route to [`Self::Unknown`];
    /// only frames that are not JSON objects (or a recognized kind with an
    /// undeserializable payload) are errors.
    pub fn decode(frame: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(frame)?;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .map(str::to_string);

        match kind.as_deref() {
            Some("status-update") => {
                let update: StatusUpdate = serde_json::from_value(value)?;
                Ok(Self::StatusUpdate(update))
            }
            Some("task") => Ok(Self::Task(value)),
            Some("message") => Ok(Self::Message(value)),
            _ => Ok(Self::Unknown { kind, raw: value }),
        }
    }

    /// The wire kind, for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::StatusUpdate(_) => "status-update",
            Self::Task(_) => "task",
            Self::Message(_) => "message",
            Self::Unknown { kind, .. } => kind.as_deref().unwrap_or("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_status_update() {
        let frame = r#"{"kind":"status-update","final":true,"status":{"state":"completed","message":{"parts":[{"kind":"text","text":"done"}]}}}"#;
        let event = ProtocolEvent::decode(frame).unwrap();

        let ProtocolEvent::StatusUpdate(update) = event else {
            panic!("expected status update");
        };
        assert!(update.is_final);
        assert_eq!(update.status.state, TaskState::Completed);
        let message = update.status.message.unwrap();
        assert_eq!(
            message.parts,
            vec![Part::Text {
                text: "done".to_string()
            }]
        );
    }

    #[test]
    fn decode_status_update_defaults() {
        // Missing final/status fields default instead of erroring.
        let event = ProtocolEvent::decode(r#"{"kind":"status-update"}"#).unwrap();
        let ProtocolEvent::StatusUpdate(update) = event else {
            panic!("expected status update");
        };
        assert!(!update.is_final);
        assert_eq!(update.status.state, TaskState::Unknown);
        assert!(update.status.message.is_none());
    }

    #[test]
    fn decode_unrecognized_state_value() {
        let frame = r#"{"kind":"status-update","status":{"state":"some-future-state"}}"#;
        let ProtocolEvent::StatusUpdate(update) = ProtocolEvent::decode(frame).unwrap() else {
            panic!("expected status update");
        };
        assert_eq!(update.status.state, TaskState::Unknown);
    }

    #[test]
    fn decode_task_is_opaque() {
        let frame = r#"{"kind":"task","id":"task-7","contextId":"ctx-1"}"#;
        let event = ProtocolEvent::decode(frame).unwrap();
        let ProtocolEvent::Task(raw) = event else {
            panic!("expected task");
        };
        assert_eq!(raw["id"], "task-7");
    }

    #[test]
    fn decode_message_is_opaque() {
        let frame = r#"{"kind":"message","role":"agent","parts":[]}"#;
        assert!(matches!(
            ProtocolEvent::decode(frame).unwrap(),
            ProtocolEvent::Message(_)
        ));
    }

    #[test]
    fn decode_unknown_kind_passes_through() {
        let frame = r#"{"kind":"artifact-update","artifact":{"name":"report"}}"#;
        let event = ProtocolEvent::decode(frame).unwrap();
        let ProtocolEvent::Unknown { kind, raw } = event else {
            panic!("expected unknown");
        };
        assert_eq!(kind.as_deref(), Some("artifact-update"));
        assert_eq!(raw["artifact"]["name"], "report");
    }

    #[test]
    fn decode_missing_kind_is_unknown() {
        let event = ProtocolEvent::decode(r#"{"payload":42}"#).unwrap();
        let ProtocolEvent::Unknown { kind, .. } = event else {
            panic!("expected unknown");
        };
        assert!(kind.is_none());
    }

    #[test]
    fn decode_non_string_kind_is_unknown() {
        let event = ProtocolEvent::decode(r#"{"kind":17}"#).unwrap();
        assert!(matches!(event, ProtocolEvent::Unknown { kind: None, .. }));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(matches!(
            ProtocolEvent::decode("{not json"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn decode_rejects_non_object() {
        assert!(matches!(
            ProtocolEvent::decode("[1,2,3]"),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            ProtocolEvent::decode("\"hello\""),
            Err(DecodeError::NotAnObject)
        ));
    }

    #[test]
    fn part_order_is_preserved() {
        let frame = r#"{"kind":"status-update","status":{"state":"working","message":{"parts":[{"kind":"data","data":{"x":1}},{"kind":"text","text":"first"},{"kind":"text","text":"second"}]}}}"#;
        let ProtocolEvent::StatusUpdate(update) = ProtocolEvent::decode(frame).unwrap() else {
            panic!("expected status update");
        };
        let parts = update.status.message.unwrap().parts;
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0], Part::Other(_)));
        assert_eq!(
            parts[1],
            Part::Text {
                text: "first".to_string()
            }
        );
    }

    #[test]
    fn non_text_part_is_carried_through() {
        let json = r#"{"kind":"data","data":{"rows":[1,2]}}"#;
        let part: Part = serde_json::from_str(json).unwrap();
        let Part::Other(raw) = part else {
            panic!("expected pass-through part");
        };
        assert_eq!(raw["kind"], "data");
        assert_eq!(raw["data"]["rows"][0], 1);
    }

    #[test]
    fn task_state_wire_names() {
        let state: TaskState = serde_json::from_str("\"input-required\"").unwrap();
        assert_eq!(state, TaskState::InputRequired);
        let state: TaskState = serde_json::from_str("\"auth-required\"").unwrap();
        assert_eq!(state, TaskState::AuthRequired);
    }

    #[test]
    fn failed_update_is_terminal() {
        let update = StatusUpdate::failed();
        assert!(update.is_final);
        assert_eq!(update.status.state, TaskState::Failed);
        assert!(update.status.message.is_none());
    }

    #[test]
    fn status_update_roundtrip() {
        let update = StatusUpdate {
            is_final: true,
            status: TaskStatus {
                state: TaskState::Completed,
                message: Some(EventMessage {
                    parts: vec![Part::Text {
                        text: "done".to_string(),
                    }],
                }),
            },
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"final\":true"));
        let update2: StatusUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(update, update2);
    }

    #[test]
    fn event_kind_names() {
        assert_eq!(
            ProtocolEvent::decode(r#"{"kind":"task"}"#).unwrap().kind(),
            "task"
        );
        assert_eq!(
            ProtocolEvent::decode(r#"{"other":true}"#).unwrap().kind(),
            "unknown"
        );
    }
}
