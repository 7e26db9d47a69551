use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tokio::sync::mpsc;
use url::Url;

use agentflow_protocol::{StreamEvent, DEFAULT_EVENT_TYPE, EVENT_STREAM_MIME};

use crate::connection::{StreamConnection, StreamConnector, StreamItem};
use crate::error::StreamError;
use crate::sse::{SseDecoder, DEFAULT_MAX_LINE_BYTES};

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Connects to an SSE endpoint over HTTP(S) with a plain `GET`.
#[derive(Debug, Clone)]
pub struct HttpStreamConnector {
    client: reqwest::Client,
    url: Url,
    channel_capacity: usize,
    max_line_bytes: usize,
}

impl HttpStreamConnector {
    pub fn new(url: Url) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("agentflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StreamError::Client)?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self {
            client,
            url,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Bound on events decoded ahead of the consumer.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Longest SSE line accepted before the stream is failed.
    pub fn with_max_line_bytes(mut self, limit: usize) -> Self {
        self.max_line_bytes = limit.max(1);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl StreamConnector for HttpStreamConnector {
    fn connect(&self) -> StreamConnection {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let decoder = SseDecoder::with_max_line_bytes(self.max_line_bytes);
        let reader = tokio::spawn(read_stream(self.client.clone(), self.url.clone(), decoder, tx));
        StreamConnection::new(rx, reader)
    }

    fn endpoint(&self) -> String {
        self.url.to_string()
    }
}

async fn read_stream(
    client: reqwest::Client,
    url: Url,
    mut decoder: SseDecoder,
    tx: mpsc::Sender<StreamItem>,
) {
    if let Err(e) = forward_events(&client, &url, &mut decoder, &tx).await {
        tracing::debug!(url = %url, error = %e, "event stream ended");
        // the consumer may already be gone
        let _ = tx.send(StreamItem::Error(e)).await;
    }
}

/// Decode frames until the body ends or fails. `Ok` means the consumer
/// dropped its end of the channel.
async fn forward_events(
    client: &reqwest::Client,
    url: &Url,
    decoder: &mut SseDecoder,
    tx: &mpsc::Sender<StreamItem>,
) -> Result<(), StreamError> {
    let response = client
        .get(url.clone())
        .header(ACCEPT, EVENT_STREAM_MIME)
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
        .map_err(StreamError::Connect)?;

    let status = response.status();
    if !status.is_success() {
        return Err(StreamError::Status(status));
    }
    check_content_type(response.headers().get(CONTENT_TYPE))?;

    tracing::info!(url = %url, "event stream opened");

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(StreamError::Transport)?;
        for frame in decoder.feed(&chunk)? {
            if frame.event_type() != DEFAULT_EVENT_TYPE {
                tracing::trace!(event = frame.event_type(), "skipping named sse event");
                continue;
            }
            let event = StreamEvent::from_json(&frame.data)?;
            tracing::debug!(node = %event.node, status = %event.status, "stream event");
            if tx.send(StreamItem::Event(event)).await.is_err() {
                return Ok(());
            }
        }
    }

    Err(StreamError::Closed)
}

fn check_content_type(value: Option<&reqwest::header::HeaderValue>) -> Result<(), StreamError> {
    let Some(value) = value else {
        return Err(StreamError::ContentType("<none>".to_string()));
    };
    let value = value.to_str().unwrap_or_default();
    let mime = value.split(';').next().unwrap_or_default().trim();
    if mime.eq_ignore_ascii_case(EVENT_STREAM_MIME) {
        Ok(())
    } else {
        Err(StreamError::ContentType(value.to_string()))
    }
}
