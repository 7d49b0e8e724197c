//! Subscription bus: fans every session's events out to subscribers.
//!
//! The router is an explicit service object, created once at shell startup
//! (or per test) and passed to whatever needs it. Producers submit queries
//! through [`Router::send_text_message`]; consumers either subscribe to the
//! whole bus and self-filter, or use the session-scoped handle returned to
//! the producer.

use es_backend::{Backend, ConnectionError};
use es_protocol::ProtocolEvent;
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::session::{Session, SessionId};

/// Size of the broadcast channel for session events.
const EVENT_BUFFER_SIZE: usize = 256;

/// One routed event: which session produced it, plus the event itself.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub session_id: SessionId,
    pub event: ProtocolEvent,
}

/// Why a submission was rejected. Protocol-level failures are never
/// rejections; they arrive as events.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("message text is empty")]
    EmptyMessage,
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// The process-wide event router.
pub struct Router {
    backend: Backend,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl Router {
    pub fn new(backend: Backend) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { backend, events_tx }
    }

    /// Submit a user query to the agent at `server_url`.
    ///
    /// The text must be non-empty after trimming. The caller suspends only
    /// until the connection is established; events are then delivered
    /// asynchronously to every subscriber. Each call opens exactly one new
    /// session, drained on its own task, so concurrently open sessions never
    /// block each other.
    pub async fn send_text_message(
        &self,
        server_url: &str,
        text: &str,
    ) -> Result<SessionHandle, SendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendError::EmptyMessage);
        }

        let session = Session::open(&self.backend, server_url, text).await?;
        let session_id = session.id();
        info!(session = %session_id, server_url, "query submitted");

        // Subscribe the handle before the drain task starts so the producer
        // cannot miss the session's first events.
        let events_rx = self.events_tx.subscribe();

        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let mut events = std::pin::pin!(session.run());
            while let Some(event) = events.next().await {
                // A send error only means nobody is subscribed right now;
                // delivery is broadcast, not acknowledged.
                let _ = events_tx.send(SessionEvent { session_id, event });
            }
        });

        Ok(SessionHandle {
            id: session_id,
            events_rx,
        })
    }

    /// Subscribe to every event from every open session. Consumers are
    /// expected to filter and normalize on their own. Subscribing and
    /// dropping receivers while broadcasts are in progress is safe.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Number of currently subscribed receivers (session handles included).
    pub fn subscriber_count(&self) -> usize {
        self.events_tx.receiver_count()
    }
}

/// Producer-side handle to one session: a subscription already scoped to
/// that session's events.
pub struct SessionHandle {
    id: SessionId,
    events_rx: broadcast::Receiver<SessionEvent>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Next event from this session, skipping other sessions' traffic.
    ///
    /// Returns `None` once the bus shuts down. A session's events arrive in
    /// production order; there is no cross-session ordering guarantee, which
    /// is exactly why the handle filters by id.
    pub async fn next_event(&mut self) -> Option<ProtocolEvent> {
        loop {
            match self.events_rx.recv().await {
                Ok(routed) if routed.session_id == self.id => return Some(routed.event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(session = %self.id, skipped, "subscriber lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
