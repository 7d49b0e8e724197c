//! Shell module projections.
//!
//! Modules are thin consumers: each one folds the shared normalizer's output
//! into its own display state and renders a couple of lines. No module holds
//! protocol knowledge beyond calling [`normalize`].

use es_protocol::{normalize, NormalizedStatus, Part, ProtocolEvent};

/// An agent-backed chat panel.
#[derive(Debug, Clone)]
pub struct ChatModule {
    pub title: String,
    pub subtitle: Option<String>,
    /// Latest text response, shown in the module body.
    response: Option<String>,
    status: NormalizedStatus,
}

impl ChatModule {
    pub fn new(title: impl Into<String>, subtitle: Option<String>) -> Self {
        Self {
            title: title.into(),
            subtitle,
            response: None,
            status: NormalizedStatus::ready(),
        }
    }

    /// Fold one protocol event into the display state.
    ///
    /// Last-write-wins: a terminal status does not freeze the module, later
    /// events keep overwriting (the exchange is never treated as restarted).
    pub fn apply(&mut self, event: &ProtocolEvent) {
        if let ProtocolEvent::StatusUpdate(update) = event {
            if let Some(message) = &update.status.message {
                if let Some(Part::Text { text }) = message.parts.first() {
                    self.response = Some(text.clone());
                }
            }
        }
        self.status = normalize(event, &self.status);
    }

    pub fn status(&self) -> &NormalizedStatus {
        &self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.terminal
    }

    /// Module body text.
    pub fn response_line(&self) -> &str {
        self.response.as_deref().unwrap_or("Waiting for query...")
    }

    /// Status footer, e.g. `Status: Ready`.
    pub fn status_line(&self) -> String {
        format!("Status: {}", self.status.text)
    }
}

/// A module with fixed content and no backend.
#[derive(Debug, Clone)]
pub struct StaticModule {
    pub title: String,
    pub content: String,
    pub notes: Vec<String>,
}

impl StaticModule {
    pub fn demo_default() -> Self {
        Self {
            title: "Traditional app container".to_string(),
            content: "App using traditional methods".to_string(),
            notes: vec![
                "This application is still in progress".to_string(),
                "Objective is to emulate common traditional apps before AI".to_string(),
            ],
        }
    }
}
