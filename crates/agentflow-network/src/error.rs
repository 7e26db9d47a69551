use agentflow_protocol::ProtocolError;
use thiserror::Error;

/// Stream failures. Every variant ends the current run.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to connect to stream: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("stream endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected content type {0:?}, expected text/event-stream")]
    ContentType(String),

    #[error("stream transport failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("sse line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error(transparent)]
    Decode(#[from] ProtocolError),

    #[error("stream closed by server")]
    Closed,
}
