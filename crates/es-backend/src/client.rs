//! HTTP client for agent backends.

use std::pin::Pin;
use std::time::Duration;

use es_protocol::{AgentConfigDocument, ConfigResponse, Part, ProtocolEvent};
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::decode::decode_frames;
use crate::mock::MockBackend;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Establishing the outbound exchange failed. This is the only condition the
/// router surfaces as a rejection; everything after connection establishment
/// arrives as events.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server rejected request ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("connection refused: {0}")]
    Refused(String),
}

/// The transport failed after the connection was accepted. Carried in-stream
/// so the session can turn it into a terminal failure status.
#[derive(Debug, Error)]
#[error("stream error: {message}")]
pub struct StreamError {
    message: String,
}

impl StreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Decoded events from one open exchange, in receipt order.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ProtocolEvent, StreamError>> + Send>>;

/// Build an HTTP client with appropriate timeouts and connection limits.
fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
}

/// Agent backend client.
pub struct AgentClient {
    http: Client,
}

impl AgentClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
        }
    }

    /// Submit a user query and open the event stream over the response.
    ///
    /// Rejects only when the exchange cannot be established (network error or
    /// non-success HTTP status); once this returns `Ok`, all further
    /// conditions are delivered as events.
    pub async fn send_message(
        &self,
        server_url: &str,
        text: &str,
    ) -> Result<EventStream, ConnectionError> {
        let body = MessageRequest::user_text(text);

        let response = self
            .http
            .post(server_url)
            .header("accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Api { status, body });
        }

        debug!(server_url, "message stream established");
        let frames = decode_frames(response.bytes_stream());
        Ok(Box::pin(frames.map(|item| item.map_err(StreamError::from))))
    }

    /// POST the agent configuration document. Plain request/response; the
    /// reply body is displayed to the user as-is.
    pub async fn post_config(
        &self,
        config_url: &str,
        document: &AgentConfigDocument,
    ) -> Result<ConfigResponse, ConnectionError> {
        let response = self.http.post(config_url).json(document).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

impl Default for AgentClient {
    fn default() -> Self {
        Self::new()
    }
}

/// How a session reaches its agent. The mock arm produces the exact same
/// stream type as the HTTP arm, so everything above this seam can run
/// without a network.
pub enum Backend {
    Http(AgentClient),
    Mock(MockBackend),
}

impl Backend {
    pub async fn open(&self, server_url: &str, text: &str) -> Result<EventStream, ConnectionError> {
        match self {
            Backend::Http(client) => client.send_message(server_url, text).await,
            Backend::Mock(mock) => mock.open(server_url, text),
        }
    }
}

// Outbound request document: the query as a single-text-part user message,
// mirroring the part shape the backend streams back.

#[derive(Debug, Serialize)]
struct MessageRequest {
    message: MessagePayload,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    role: String,
    parts: Vec<Part>,
}

impl MessageRequest {
    fn user_text(text: &str) -> Self {
        Self {
            message: MessagePayload {
                role: "user".to_string(),
                parts: vec![Part::Text {
                    text: text.to_string(),
                }],
            },
        }
    }
}
