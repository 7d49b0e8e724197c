//! One request/response exchange with an agent backend.

use std::fmt;
use std::time::Instant;

use async_stream::stream;
use es_backend::{Backend, ConnectionError, EventStream};
use es_protocol::{ProtocolEvent, StatusUpdate};
use futures::{Stream, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifier of one exchange. Never reused across submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
    Errored,
}

/// An open exchange: submits the query on `open`, then yields decoded events
/// in receipt order until the transport ends.
pub struct Session {
    id: SessionId,
    server_url: String,
    query: String,
    started_at: Instant,
    state: SessionState,
    source: EventStream,
}

impl Session {
    /// Submit `query` to the agent at `server_url`.
    ///
    /// Rejects with [`ConnectionError`] if the exchange cannot be
    /// established; in that case no events are ever produced.
    pub async fn open(
        backend: &Backend,
        server_url: &str,
        query: &str,
    ) -> Result<Self, ConnectionError> {
        let source = backend.open(server_url, query).await?;
        let session = Self {
            id: SessionId::new(),
            server_url: server_url.to_string(),
            query: query.to_string(),
            started_at: Instant::now(),
            state: SessionState::Open,
            source,
        };
        debug!(session = %session.id, server_url, "session opened");
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drain the exchange, yielding each event in receipt order.
    ///
    /// Ends when the underlying stream ends. A mid-stream transport failure
    /// is converted into one final synthetic failed status-update so
    /// subscribers see a failure status rather than silent termination.
    /// There is no cancellation: once opened, a session runs to its end.
    pub fn run(mut self) -> impl Stream<Item = ProtocolEvent> + Send {
        stream! {
            while let Some(item) = self.source.next().await {
                match item {
                    Ok(event) => yield event,
                    Err(e) => {
                        self.state = SessionState::Errored;
                        warn!(
                            session = %self.id,
                            error = %e,
                            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
                            "transport failed mid-stream"
                        );
                        yield ProtocolEvent::StatusUpdate(StatusUpdate::failed());
                        return;
                    }
                }
            }
            self.state = SessionState::Closed;
            debug!(
                session = %self.id,
                state = ?self.state,
                elapsed_ms = self.started_at.elapsed().as_millis() as u64,
                "session closed"
            );
        }
    }
}
