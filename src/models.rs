use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use crate::constants::{CONNECTOR_CHAT_MODEL, CONNECTOR_TOOL};
use crate::error::CanvasError;

/// Fresh random identifier such as `node-3f2a...` or `conn-91c0...`.
pub fn fresh_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

/// A point in canvas space (or screen space, depending on context).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn distance_to(self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: Position) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Discriminant of every node placeable on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Agent,
    ChatModel,
    ToolDisplay,
    ChatTrigger,
    MessagingTrigger,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Agent,
        NodeKind::ChatModel,
        NodeKind::ToolDisplay,
        NodeKind::ChatTrigger,
        NodeKind::MessagingTrigger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Agent => "AGENT",
            NodeKind::ChatModel => "CHAT_MODEL",
            NodeKind::ToolDisplay => "TOOL_DISPLAY",
            NodeKind::ChatTrigger => "CHAT_TRIGGER",
            NodeKind::MessagingTrigger => "MESSAGING_TRIGGER",
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self, NodeKind::ChatTrigger | NodeKind::MessagingTrigger)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorDirection {
    Input,
    Output,
}

/// Identifies one connector on one node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRef {
    pub node_id: String,
    pub connector_id: String,
}

impl ConnectorRef {
    pub fn new(node_id: impl Into<String>, connector_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            connector_id: connector_id.into(),
        }
    }
}

/// Per-connector view of the connection set, stored on each node.
///
/// Never edited directly: [`crate::graph::ConnectionGraph`] recomputes it from
/// the connection list after every mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorState {
    pub direction: ConnectorDirection,
    #[serde(default)]
    pub connected_to: Vec<ConnectorRef>,
}

/// Type-specific payload of a node, keyed by the node's type tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeData {
    #[serde(rename_all = "camelCase")]
    Agent {
        /// Companion chat-model display node spawned with this agent.
        #[serde(default)]
        model_node_id: Option<String>,
        #[serde(default)]
        tool_node_ids: Vec<String>,
        #[serde(default)]
        system_prompt: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ChatModel {
        owner_id: String,
        provider: String,
        model: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolDisplay { owner_id: String, tool_name: String },
    #[serde(rename_all = "camelCase")]
    ChatTrigger {
        #[serde(default)]
        public: bool,
    },
    #[serde(rename_all = "camelCase")]
    MessagingTrigger { platform: String },
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Agent { .. } => NodeKind::Agent,
            NodeData::ChatModel { .. } => NodeKind::ChatModel,
            NodeData::ToolDisplay { .. } => NodeKind::ToolDisplay,
            NodeData::ChatTrigger { .. } => NodeKind::ChatTrigger,
            NodeData::MessagingTrigger { .. } => NodeKind::MessagingTrigger,
        }
    }
}

/// A placeable unit on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub processing: bool,
    #[serde(default)]
    pub connectors: BTreeMap<String, ConnectorState>,
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, data: NodeData) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: None,
            disabled: false,
            processing: false,
            connectors: BTreeMap::new(),
            data,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Owning node of a companion (model / tool display) node.
    pub fn owner_id(&self) -> Option<&str> {
        match &self.data {
            NodeData::ChatModel { owner_id, .. } | NodeData::ToolDisplay { owner_id, .. } => {
                Some(owner_id.as_str())
            }
            NodeData::Agent { .. } | NodeData::ChatTrigger { .. } | NodeData::MessagingTrigger { .. } => None,
        }
    }

    /// Owner connector a companion hangs below.
    pub fn companion_slot(&self) -> Option<&'static str> {
        match &self.data {
            NodeData::ChatModel { .. } => Some(CONNECTOR_CHAT_MODEL),
            NodeData::ToolDisplay { .. } => Some(CONNECTOR_TOOL),
            NodeData::Agent { .. } | NodeData::ChatTrigger { .. } | NodeData::MessagingTrigger { .. } => None,
        }
    }

    pub fn connected_to(&self, connector_id: &str) -> &[ConnectorRef] {
        self.connectors
            .get(connector_id)
            .map(|c| c.connected_to.as_slice())
            .unwrap_or(&[])
    }
}

/// A committed directed edge between two connectors on two distinct nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from_node_id: String,
    pub from_connector_id: String,
    pub to_node_id: String,
    pub to_connector_id: String,
}

impl Connection {
    pub fn from_ref(&self) -> ConnectorRef {
        ConnectorRef::new(self.from_node_id.clone(), self.from_connector_id.clone())
    }

    pub fn to_ref(&self) -> ConnectorRef {
        ConnectorRef::new(self.to_node_id.clone(), self.to_connector_id.clone())
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.from_node_id == node_id || self.to_node_id == node_id
    }
}

/// Serializable node/connection graph handed to and from the persistence
/// collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl WorkflowSnapshot {
    pub fn to_json(&self) -> Result<String, CanvasError> {
        serde_json::to_string(self).map_err(|e| CanvasError::InvalidSnapshot(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, CanvasError> {
        serde_json::from_str(raw).map_err(|e| CanvasError::InvalidSnapshot(e.to_string()))
    }
}
