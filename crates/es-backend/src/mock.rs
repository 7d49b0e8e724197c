//! Mock backend for testing.
//!
//! Produces the exact same `EventStream` as the HTTP client, allowing tests
//! at every layer (and the `--mock` demo mode) to run without real HTTP.

use std::time::Duration;

use async_stream::stream;
use es_protocol::{EventMessage, Part, ProtocolEvent, StatusUpdate, TaskState, TaskStatus};
use tokio::time::sleep;

use crate::client::{ConnectionError, EventStream, StreamError};

/// One scripted step of a mock exchange.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Emit a status-update frame.
    Status {
        state: TaskState,
        is_final: bool,
        /// When set, the update carries a message with one text part.
        text: Option<String>,
    },
    /// Emit an arbitrary pre-built event.
    Event(ProtocolEvent),
    /// Fail the transport mid-stream; the stream ends after this.
    TransportError { message: String },
    /// Delay before the next event (for timing tests).
    Delay { ms: u64 },
}

/// Scripted mock backend.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    /// Sequence of responses to emit.
    pub responses: Vec<MockResponse>,
    /// Optional delay between each event (ms).
    pub chunk_delay_ms: Option<u64>,
    /// When set, `open` rejects with a connection error instead of streaming.
    pub fail_connect: Option<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(mut self, responses: Vec<MockResponse>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_chunk_delay(mut self, ms: u64) -> Self {
        self.chunk_delay_ms = Some(ms);
        self
    }

    pub fn with_connect_failure(mut self, message: impl Into<String>) -> Self {
        self.fail_connect = Some(message.into());
        self
    }

    /// Open the scripted exchange. Mirrors `AgentClient::send_message`.
    pub fn open(&self, _server_url: &str, _text: &str) -> Result<EventStream, ConnectionError> {
        if let Some(message) = &self.fail_connect {
            return Err(ConnectionError::Refused(message.clone()));
        }

        let responses = self.responses.clone();
        let chunk_delay_ms = self.chunk_delay_ms;

        Ok(Box::pin(stream! {
            for response in responses {
                if let Some(delay_ms) = chunk_delay_ms {
                    sleep(Duration::from_millis(delay_ms)).await;
                }

                match response {
                    MockResponse::Status { state, is_final, text } => {
                        yield Ok(status_event(state, is_final, text));
                    }
                    MockResponse::Event(event) => {
                        yield Ok(event);
                    }
                    MockResponse::TransportError { message } => {
                        yield Err(StreamError::new(message));
                        return;
                    }
                    MockResponse::Delay { ms } => {
                        sleep(Duration::from_millis(ms)).await;
                    }
                }
            }
        }))
    }
}

fn status_event(state: TaskState, is_final: bool, text: Option<String>) -> ProtocolEvent {
    ProtocolEvent::StatusUpdate(StatusUpdate {
        is_final,
        status: TaskStatus {
            state,
            message: text.map(|text| EventMessage {
                parts: vec![Part::Text { text }],
            }),
        },
    })
}

/// Built-in scripts for common scenarios.
pub mod fixtures {
    use super::*;

    /// A working update with no message, then a final completed update
    /// carrying one text part.
    pub fn working_then_completed(text: &str) -> MockBackend {
        MockBackend::new().with_responses(vec![
            MockResponse::Status {
                state: TaskState::Working,
                is_final: false,
                text: None,
            },
            MockResponse::Status {
                state: TaskState::Completed,
                is_final: true,
                text: Some(text.to_string()),
            },
        ])
    }

    /// A working update, then a failed state with the final flag unset.
    pub fn failed_mid_stream() -> MockBackend {
        MockBackend::new().with_responses(vec![
            MockResponse::Status {
                state: TaskState::Working,
                is_final: false,
                text: None,
            },
            MockResponse::Status {
                state: TaskState::Failed,
                is_final: false,
                text: None,
            },
        ])
    }

    /// A single event with an unrecognized kind.
    pub fn unknown_kind(kind: &str) -> MockBackend {
        MockBackend::new().with_responses(vec![MockResponse::Event(ProtocolEvent::Unknown {
            kind: Some(kind.to_string()),
            raw: serde_json::json!({ "kind": kind }),
        })])
    }

    /// One working update, then the transport dies.
    pub fn transport_failure() -> MockBackend {
        MockBackend::new().with_responses(vec![
            MockResponse::Status {
                state: TaskState::Working,
                is_final: false,
                text: None,
            },
            MockResponse::TransportError {
                message: "connection reset by peer".to_string(),
            },
        ])
    }
}
