use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use agentflow_protocol::StreamEvent;

use crate::error::StreamError;

/// What the reader task delivers to the consumer.
#[derive(Debug)]
pub enum StreamItem {
    Event(StreamEvent),
    /// The stream failed. Nothing follows an error.
    Error(StreamError),
}

/// Opens push connections to the event stream.
pub trait StreamConnector {
    /// Open a new connection. Must be called from within a tokio runtime.
    fn connect(&self) -> StreamConnection;

    /// Human-readable target, for logs.
    fn endpoint(&self) -> String;
}

/// Receiving end of one open stream.
///
/// Owns the reader task; [`close`](Self::close) or dropping the connection
/// stops it.
#[derive(Debug)]
pub struct StreamConnection {
    rx: mpsc::Receiver<StreamItem>,
    reader: Option<JoinHandle<()>>,
    closed: bool,
}

impl StreamConnection {
    pub fn new(rx: mpsc::Receiver<StreamItem>, reader: JoinHandle<()>) -> Self {
        Self {
            rx,
            reader: Some(reader),
            closed: false,
        }
    }

    /// Connection fed directly through the returned sender, without a reader task.
    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamItem>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            tx,
            Self {
                rx,
                reader: None,
                closed: false,
            },
        )
    }

    /// Next buffered item, without waiting.
    ///
    /// A producer that went away without reporting an error surfaces as
    /// [`StreamError::Closed`], once.
    pub fn try_next(&mut self) -> Option<StreamItem> {
        if self.closed {
            return None;
        }
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                Some(StreamItem::Error(StreamError::Closed))
            }
        }
    }

    /// Wait for the next item. Returns `None` once the connection is closed.
    pub async fn next(&mut self) -> Option<StreamItem> {
        if self.closed {
            return None;
        }
        match self.rx.recv().await {
            Some(item) => Some(item),
            None => {
                self.closed = true;
                Some(StreamItem::Error(StreamError::Closed))
            }
        }
    }

    /// Stop the reader and discard anything still buffered.
    pub fn close(&mut self) {
        self.closed = true;
        self.rx.close();
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.close();
    }
}
