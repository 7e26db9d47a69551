//! Compiled-in node layout.
//!
//! Positions are percentages of the canvas, measured to the node's centre.

/// Canvas position of a node, in percent of the canvas height (`top`) and width (`left`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub top: u8,
    pub left: u8,
}

impl Position {
    pub const fn new(top: u8, left: u8) -> Self {
        Self { top, left }
    }
}

/// A named participant of the agent flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: &'static str,
    pub position: Position,
}

impl NodeSpec {
    /// Name with `<br>` line-break markup flattened to spaces.
    pub fn display_name(&self) -> String {
        self.name.replace("<br>", " ")
    }
}

const BUILTIN_NODES: &[NodeSpec] = &[
    NodeSpec { name: "DB-MASTER", position: Position::new(50, 50) },
    NodeSpec { name: "DB-AI báo giá", position: Position::new(30, 20) },
    NodeSpec { name: "AI Thư ký", position: Position::new(70, 20) },
    NodeSpec { name: "VISION-AI", position: Position::new(30, 80) },
    NodeSpec { name: "USER", position: Position::new(10, 50) },
    NodeSpec { name: "TRẢ LỜI CHO USER", position: Position::new(90, 50) },
];

/// Fixed set of known nodes, enumerated in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct NodeRegistry {
    nodes: &'static [NodeSpec],
}

impl NodeRegistry {
    pub const fn builtin() -> Self {
        Self { nodes: BUILTIN_NODES }
    }

    /// Registry over a caller-provided table.
    pub const fn from_static(nodes: &'static [NodeSpec]) -> Self {
        Self { nodes }
    }

    pub fn get(&self, name: &str) -> Option<&'static NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn position(&self, name: &str) -> Option<Position> {
        self.get(name).map(|n| n.position)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static NodeSpec> {
        self.nodes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.nodes.iter().map(|n| n.name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
