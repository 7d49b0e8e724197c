//! Event normalization: one displayable status line per protocol event.
//!
//! Every consumer runs the same pure projection over the event stream and
//! keeps its own copy of the result, so there is no shared normalized state
//! anywhere in the process.

use crate::event::{Part, ProtocolEvent, TaskState};

/// The single human-readable line a consumer should display, and whether the
/// exchange has concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStatus {
    pub text: String,
    pub terminal: bool,
}

impl NormalizedStatus {
    /// Status of a consumer that has not seen any event yet.
    pub fn ready() -> Self {
        Self {
            text: "Ready".to_string(),
            terminal: false,
        }
    }
}

impl Default for NormalizedStatus {
    fn default() -> Self {
        Self::ready()
    }
}

/// Map a protocol event to the status a consumer should now display.
///
/// Deterministic and side-effect free: the result depends only on `event`.
/// `previous` is part of the contract so a consumer state machine can decide
/// what to overwrite; the new text never depends on it. Consumers apply the
/// result last-write-wins, including after a terminal status (a terminal
/// status never restarts the exchange, later events simply keep overwriting).
pub fn normalize(event: &ProtocolEvent, _previous: &NormalizedStatus) -> NormalizedStatus {
    match event {
        ProtocolEvent::StatusUpdate(update) => {
            // Failure is terminal no matter what the final flag says.
            if update.status.state == TaskState::Failed {
                return NormalizedStatus {
                    text: "Task failed - An error occurred".to_string(),
                    terminal: true,
                };
            }
            match &update.status.message {
                Some(message) => {
                    let text = match message.parts.first() {
                        Some(Part::Text { text }) => text.clone(),
                        _ => "No text content".to_string(),
                    };
                    NormalizedStatus {
                        text,
                        terminal: update.is_final,
                    }
                }
                None => NormalizedStatus {
                    text: "Server did not send any message parts".to_string(),
                    terminal: update.is_final,
                },
            }
        }
        ProtocolEvent::Task(_) => NormalizedStatus {
            text: "Task management event received".to_string(),
            terminal: false,
        },
        ProtocolEvent::Message(_) => NormalizedStatus {
            text: "Direct message received".to_string(),
            terminal: false,
        },
        ProtocolEvent::Unknown { kind, .. } => NormalizedStatus {
            text: format!("Event type: {}", kind.as_deref().unwrap_or("unknown")),
            terminal: false,
        },
    }
}
