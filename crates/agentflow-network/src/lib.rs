//! Agent flow network - server-sent event transport.
//!
//! Opens one long-lived `GET` against the stream endpoint, decodes
//! `text/event-stream` frames into [`StreamEvent`]s and hands them to the
//! consumer over a channel. There is no retry: the first failure is
//! delivered as a [`StreamItem::Error`] and the reader stops.
//!
//! [`StreamEvent`]: agentflow_protocol::StreamEvent

pub mod connection;
pub mod error;
pub mod http;
pub mod sse;

pub use connection::{StreamConnection, StreamConnector, StreamItem};
pub use error::StreamError;
pub use http::HttpStreamConnector;
pub use sse::{SseDecoder, SseFrame, DEFAULT_MAX_LINE_BYTES};
