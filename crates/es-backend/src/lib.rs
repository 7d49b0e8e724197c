//! es-backend: Agent backend adapters for edgeshell.
//!
//! Opens a streaming exchange with an agent backend over HTTP/SSE, decodes
//! response frames into protocol events, and posts the agent configuration
//! document. A mock backend produces the same stream type so every layer
//! above can be tested without real HTTP.

pub mod client;
pub mod decode;
pub mod mock;

pub use client::{AgentClient, Backend, ConnectionError, EventStream, StreamError};
pub use decode::{decode_frames, FrameDecoder};
pub use mock::{MockBackend, MockResponse};
