//! es-protocol: Shared types for the agent event-stream protocol.
//!
//! This crate defines the wire events streamed by agent backends, the
//! normalization that turns them into a displayable status line, and the
//! agent configuration document posted by the configuration form.

pub mod agent_config;
pub mod event;
pub mod normalize;

pub use agent_config::{AgentConfigDocument, AgentSpec, ConfigResponse};
pub use event::{
    DecodeError, EventMessage, Part, ProtocolEvent, StatusUpdate, TaskState, TaskStatus,
};
pub use normalize::{normalize, NormalizedStatus};
