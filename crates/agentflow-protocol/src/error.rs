use thiserror::Error;

/// Errors raised while decoding a stream payload.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed stream event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
}
