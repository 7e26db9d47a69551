/// Name of the master node. A `complete` event for it ends the run.
pub const MASTER_NODE: &str = "DB-MASTER";

/// Default SSE endpoint of the agent flow producer.
pub const DEFAULT_STREAM_URL: &str = "http://localhost:8000/stream";

/// SSE event type delivered to the message handler when a frame has no `event:` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

pub const EVENT_STREAM_MIME: &str = "text/event-stream";
