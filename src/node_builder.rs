use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::models::{fresh_id, Node, NodeData, NodeKind, Position};

/// Fluent builder for canvas nodes.  The payload (and therefore the node
/// type) is fixed up front so a half-formed node can never be built.
pub struct NodeBuilder {
    id: Option<String>,
    data: NodeData,
    name: Option<String>,
    position: Option<Position>,
    disabled: bool,
}

impl NodeBuilder {
    pub fn from_data(data: NodeData) -> Self {
        Self {
            id: None,
            data,
            name: None,
            position: None,
            disabled: false,
        }
    }

    pub fn agent() -> Self {
        Self::from_data(NodeData::Agent {
            model_node_id: None,
            tool_node_ids: Vec::new(),
            system_prompt: None,
        })
    }

    pub fn chat_trigger() -> Self {
        Self::from_data(NodeData::ChatTrigger { public: false })
    }

    pub fn messaging_trigger(platform: &str) -> Self {
        Self::from_data(NodeData::MessagingTrigger {
            platform: platform.to_string(),
        })
    }

    /// Chat-model display companion for `owner_id`.
    pub fn chat_model(owner_id: &str) -> Self {
        Self::from_data(NodeData::ChatModel {
            owner_id: owner_id.to_string(),
            provider: DEFAULT_MODEL_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn tool(owner_id: &str, tool_name: &str) -> Self {
        Self::from_data(NodeData::ToolDisplay {
            owner_id: owner_id.to_string(),
            tool_name: tool_name.to_string(),
        })
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Finalize node creation.  The node's `connectors` map is left empty;
    /// the graph fills it in when the node joins a canvas.
    pub fn build(self) -> Node {
        let name = self.name.unwrap_or_else(|| default_name(&self.data));
        let id = self.id.unwrap_or_else(|| fresh_id("node"));
        let mut node = Node::new(id, name, self.data);
        node.position = self.position;
        node.disabled = self.disabled;
        node
    }
}

fn default_name(data: &NodeData) -> String {
    match data {
        NodeData::Agent { .. } => DEFAULT_AGENT_NAME.to_string(),
        NodeData::ChatModel { model, .. } => {
            if model.is_empty() {
                DEFAULT_CHAT_MODEL_NAME.to_string()
            } else {
                model.clone()
            }
        }
        NodeData::ToolDisplay { tool_name, .. } => tool_name.clone(),
        NodeData::ChatTrigger { .. } => DEFAULT_CHAT_TRIGGER_NAME.to_string(),
        NodeData::MessagingTrigger { .. } => DEFAULT_MESSAGING_TRIGGER_NAME.to_string(),
    }
}

/// Host request to place a new node (palette selection).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub data: NodeData,
    #[serde(default)]
    pub name: Option<String>,
    /// Omitted: next free grid cell (or the companion anchor).
    #[serde(default)]
    pub position: Option<Position>,
}

impl NodeSpec {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            name: None,
            position: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn into_builder(self) -> NodeBuilder {
        let builder = NodeBuilder::from_data(self.data).position(self.position);
        match self.name {
            Some(name) => builder.name(name),
            None => builder,
        }
    }
}
