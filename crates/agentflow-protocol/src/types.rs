use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Visual state of a node at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// No event has been seen for the node in the current run.
    #[default]
    Idle,
    /// The node currently holds the turn. At most one node is active.
    Active,
    /// The node held the turn earlier in the run.
    Inactive,
    /// The node finished its work.
    Complete,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of the agent flow stream. Consumed once and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Node the event is about. Names outside the registry are kept but have no position.
    pub node: String,
    pub status: NodeStatus,
    /// Free text, shown only while the node is active.
    #[serde(default)]
    pub message: String,
    /// Tool the agent is calling, when the producer reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl StreamEvent {
    pub fn new(node: impl Into<String>, status: NodeStatus, message: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            status,
            message: message.into(),
            tool: None,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Decode the JSON payload of one `data:` frame.
    pub fn from_json(payload: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// True when this event ends the run: the terminal node reports `complete`.
    pub fn is_terminal(&self, terminal_node: &str) -> bool {
        self.node == terminal_node && self.status == NodeStatus::Complete
    }
}
