//! Configuration-form collaborator: pushes the agent configuration document
//! to the backend and renders the raw reply for display.

use es_backend::{AgentClient, ConnectionError};
use es_protocol::{AgentConfigDocument, ConfigResponse};

/// POST the document and produce the line the shell displays.
pub async fn push_agent_config(
    client: &AgentClient,
    config_url: &str,
    document: &AgentConfigDocument,
) -> String {
    render_response(client.post_config(config_url, document).await)
}

/// Success shows the server's message verbatim; anything else gets the
/// `Error: ` prefix. Never a stack trace or payload dump.
fn render_response(result: Result<ConfigResponse, ConnectionError>) -> String {
    match result {
        Ok(response) if response.is_success() => response.message,
        Ok(response) => format!("Error: {}", response.message),
        Err(e) => format!("Error: {e}"),
    }
}
