use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use agentflow_protocol::{NodeStatus, StreamEvent};

/// Last recorded state of one node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeState {
    pub status: NodeStatus,
    pub message: String,
    pub tool: Option<String>,
}

impl NodeState {
    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }
}

impl From<&StreamEvent> for NodeState {
    fn from(event: &StreamEvent) -> Self {
        Self {
            status: event.status,
            message: event.message.clone(),
            tool: event.tool.clone(),
        }
    }
}

/// What a single [`ViewState::apply`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Node the event was about.
    pub node: String,
    /// State before the event, `None` when the node was first seen.
    pub previous: Option<NodeState>,
    /// Nodes forced from `active` to `inactive` by this event, in name order.
    pub deactivated: Vec<String>,
}

/// Node name → state for the current run.
///
/// Invariant: at most one entry has status `active`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    nodes: BTreeMap<String, NodeState>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one stream event. Last write wins for the event's node; an
    /// `active` event downgrades every other active node to `inactive`.
    pub fn apply(&mut self, event: &StreamEvent) -> Applied {
        let previous = self
            .nodes
            .insert(event.node.clone(), NodeState::from(event));

        let mut deactivated = Vec::new();
        if event.status == NodeStatus::Active {
            for (name, state) in self.nodes.iter_mut() {
                if *name != event.node && state.is_active() {
                    state.status = NodeStatus::Inactive;
                    deactivated.push(name.clone());
                }
            }
        }

        if !deactivated.is_empty() {
            tracing::trace!(node = %event.node, ?deactivated, "turn passed");
        }

        Applied {
            node: event.node.clone(),
            previous,
            deactivated,
        }
    }

    /// Forget every node, as at the start of a run.
    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    pub fn get(&self, node: &str) -> Option<&NodeState> {
        self.nodes.get(node)
    }

    /// Status to display for `node`; nodes without events are idle.
    pub fn status_of(&self, node: &str) -> NodeStatus {
        self.nodes
            .get(node)
            .map(|s| s.status)
            .unwrap_or_default()
    }

    /// Message to display for `node`; empty unless the node is active.
    pub fn message_of(&self, node: &str) -> &str {
        match self.nodes.get(node) {
            Some(state) if state.is_active() => &state.message,
            _ => "",
        }
    }

    pub fn active_node(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, s)| s.is_active())
            .map(|(name, _)| name.as_str())
    }

    pub fn active_count(&self) -> usize {
        self.nodes.values().filter(|s| s.is_active()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeState)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
