#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use agentflow_network::{StreamConnection, StreamConnector, StreamItem};
use agentflow_protocol::{NodeStatus, StreamEvent};
use tokio::sync::mpsc;

/// In-process connector: every `connect` opens a fresh channel, pre-filled
/// with the script. When `keep_open` is false the producer hangs up after
/// the script, which the consumer sees as a closed stream.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Vec<StreamEvent>,
    keep_open: bool,
    capacity: usize,
    senders: Arc<Mutex<Vec<mpsc::Sender<StreamItem>>>>,
    opened: Arc<Mutex<usize>>,
}

impl ScriptedConnector {
    /// No script; the test drives items through [`sender`](Self::sender).
    pub fn open() -> Self {
        Self {
            keep_open: true,
            ..Default::default()
        }
    }

    pub fn with_script(script: Vec<StreamEvent>, keep_open: bool) -> Self {
        Self {
            script,
            keep_open,
            ..Default::default()
        }
    }

    /// Channel size per connection; 64 when unset.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn opened(&self) -> usize {
        *self.opened.lock().unwrap()
    }

    pub fn sender(&self, connection: usize) -> mpsc::Sender<StreamItem> {
        self.senders.lock().unwrap()[connection].clone()
    }

    pub fn latest(&self) -> mpsc::Sender<StreamItem> {
        self.senders.lock().unwrap().last().cloned().expect("no connection opened")
    }
}

impl StreamConnector for ScriptedConnector {
    fn connect(&self) -> StreamConnection {
        let (tx, conn) = StreamConnection::channel(self.capacity.max(64));
        for event in &self.script {
            tx.try_send(StreamItem::Event(event.clone())).unwrap();
        }
        *self.opened.lock().unwrap() += 1;
        if self.keep_open {
            self.senders.lock().unwrap().push(tx);
        }
        conn
    }

    fn endpoint(&self) -> String {
        "scripted://agent-flow".to_string()
    }
}

pub fn ev(node: &str, status: NodeStatus, message: &str) -> StreamEvent {
    StreamEvent::new(node, status, message)
}

pub fn send(tx: &mpsc::Sender<StreamItem>, event: StreamEvent) {
    tx.try_send(StreamItem::Event(event)).unwrap();
}
