//! Canvas state: nodes, connections, viewport, the active session and hover.
//!
//! Structural edits (add/delete/load) live here so the reducer stays a thin
//! translation from messages to state changes and events.

use std::collections::BTreeSet;

use crate::canvas::layout;
use crate::canvas::viewport::Viewport;
use crate::config::CanvasConfig;
use crate::constants::{CONNECTOR_CHAT_MODEL, CONNECTOR_INPUT, CONNECTOR_TOOL, DEFAULT_CONTAINER_WIDTH};
use crate::debug_log;
use crate::error::CanvasError;
use crate::graph::ConnectionGraph;
use crate::models::{Connection, ConnectorRef, Node, NodeData, Position, WorkflowSnapshot};
use crate::node_builder::{NodeBuilder, NodeSpec};
use crate::session::SessionSlot;

/// Nodes and connections produced by one `add_node` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AddedNodes {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

#[derive(Default)]
struct PendingAdd {
    node_ids: Vec<String>,
    connections: Vec<Connection>,
}

impl PendingAdd {
    /// Snapshot the final state of every added node (connectors included).
    fn resolve(self, nodes: &[Node]) -> AddedNodes {
        AddedNodes {
            nodes: self
                .node_ids
                .iter()
                .filter_map(|id| nodes.iter().find(|n| &n.id == id).cloned())
                .collect(),
            connections: self.connections,
        }
    }
}

/// Nodes and connections removed by one `delete_node` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemovedNodes {
    pub node_ids: Vec<String>,
    pub connections: Vec<Connection>,
}

#[derive(Clone, Debug)]
pub struct CanvasState {
    pub config: CanvasConfig,
    /// Render order: later nodes draw on top.
    pub nodes: Vec<Node>,
    pub graph: ConnectionGraph,
    pub viewport: Viewport,
    pub session: SessionSlot,
    /// Connector under the pointer while idle.
    pub hovered_connector: Option<ConnectorRef>,
    /// Last container width seen by auto-layout, also used for default placement.
    pub container_width: f64,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new(CanvasConfig::defaults().clone())
    }
}

impl CanvasState {
    pub fn new(config: CanvasConfig) -> Self {
        let viewport = Viewport::new(&config.zoom);
        Self {
            config,
            nodes: Vec::new(),
            graph: ConnectionGraph::new(),
            viewport,
            session: SessionSlot::default(),
            hovered_connector: None,
            container_width: DEFAULT_CONTAINER_WIDTH,
        }
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    pub fn connections(&self) -> &[Connection] {
        self.graph.connections()
    }

    pub fn to_canvas(&self, screen: Position) -> Position {
        self.viewport.to_canvas(screen)
    }

    /// Place a node from a palette request.
    ///
    /// Agents spawn their chat-model companion; companions are wired to their
    /// owner through the validated connection path.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<AddedNodes, CanvasError> {
        let mut added = PendingAdd::default();
        let node = spec.into_builder().build();
        let node_id = node.id.clone();

        if let (Some(owner_id), Some(slot)) = (node.owner_id(), node.companion_slot()) {
            let owner = self
                .node(owner_id)
                .ok_or_else(|| CanvasError::UnknownNode(owner_id.to_string()))?;
            if self.config.registry.connector(owner.kind(), slot).is_none() {
                return Err(CanvasError::NoCompanionSlot {
                    owner_id: owner_id.to_string(),
                    slot,
                });
            }
            self.insert_companion(node, &mut added);
        } else {
            let mut node = node;
            if node.position.is_none() {
                node.position = Some(layout::next_free_cell(&self.nodes, self.container_width, &self.config));
            }
            self.nodes.push(node);
            self.graph.sync_connectors(&mut self.nodes, &self.config.registry);
            added.node_ids.push(node_id.clone());
        }

        if matches!(self.node(&node_id).map(|n| &n.data), Some(NodeData::Agent { .. })) {
            let model = NodeBuilder::chat_model(&node_id).build();
            self.insert_companion(model, &mut added);
        }

        debug_log!(
            "Added node {} ({} node(s), {} connection(s))",
            node_id,
            added.node_ids.len(),
            added.connections.len()
        );
        Ok(added.resolve(&self.nodes))
    }

    fn insert_companion(&mut self, mut companion: Node, added: &mut PendingAdd) {
        let Some(owner_id) = companion.owner_id().map(str::to_string) else {
            return;
        };
        let Some(slot) = companion.companion_slot() else {
            return;
        };

        if companion.position.is_none() {
            let siblings: Vec<Position> = self
                .nodes
                .iter()
                .filter(|n| n.owner_id() == Some(owner_id.as_str()) && n.companion_slot() == Some(slot))
                .filter_map(|n| n.position)
                .collect();
            if let Some(owner) = self.node(&owner_id) {
                // First anchor along the slot not already occupied by a sibling.
                let free = (0..=siblings.len())
                    .filter_map(|index| {
                        layout::companion_anchor(&self.config.registry, &self.config.layout, owner, &companion, index)
                    })
                    .find(|at| siblings.iter().all(|s| s.distance_to(*at) >= 0.5));
                companion.position = free;
            }
        }

        let companion_id = companion.id.clone();
        let is_model = slot == CONNECTOR_CHAT_MODEL;
        self.nodes.push(companion);
        self.graph.sync_connectors(&mut self.nodes, &self.config.registry);
        added.node_ids.push(companion_id.clone());

        if let Some(NodeData::Agent { model_node_id, tool_node_ids, .. }) = self.node_mut(&owner_id).map(|n| &mut n.data) {
            if is_model {
                model_node_id.get_or_insert_with(|| companion_id.clone());
            } else if slot == CONNECTOR_TOOL {
                tool_node_ids.push(companion_id.clone());
            }
        }

        let from = ConnectorRef::new(owner_id, slot);
        let to = ConnectorRef::new(companion_id, CONNECTOR_INPUT);
        match self.graph.try_create_connection(&mut self.nodes, &self.config, &from, &to) {
            Ok(connection) => added.connections.push(connection),
            Err(reason) => debug_log!("Companion {} left unwired: {}", to.node_id, reason.as_str()),
        }
    }

    /// Delete a node, its companions (transitively) and every connection
    /// touching any of them.
    pub fn delete_node(&mut self, node_id: &str) -> Result<RemovedNodes, CanvasError> {
        if self.node(node_id).is_none() {
            return Err(CanvasError::UnknownNode(node_id.to_string()));
        }

        let mut doomed: BTreeSet<String> = BTreeSet::new();
        doomed.insert(node_id.to_string());
        loop {
            let before = doomed.len();
            for node in &self.nodes {
                if node.owner_id().is_some_and(|owner| doomed.contains(owner)) {
                    doomed.insert(node.id.clone());
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        let connections = self.graph.remove_touching(&doomed);
        let node_ids: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| doomed.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();
        self.nodes.retain(|n| !doomed.contains(&n.id));

        for node in self.nodes.iter_mut() {
            if let NodeData::Agent { model_node_id, tool_node_ids, .. } = &mut node.data {
                if model_node_id.as_ref().is_some_and(|id| doomed.contains(id)) {
                    *model_node_id = None;
                }
                tool_node_ids.retain(|id| !doomed.contains(id));
            }
        }
        self.graph.sync_connectors(&mut self.nodes, &self.config.registry);
        if self.hovered_connector.as_ref().is_some_and(|h| doomed.contains(&h.node_id)) {
            self.hovered_connector = None;
        }

        debug_log!("Deleted {} node(s) and {} connection(s)", node_ids.len(), connections.len());
        Ok(RemovedNodes { node_ids, connections })
    }

    pub fn delete_connection(&mut self, connection_id: &str) -> Option<Connection> {
        self.graph
            .delete_connection(&mut self.nodes, &self.config.registry, connection_id)
    }

    /// Replace the whole graph.  Returns the connections that were dropped
    /// because they did not resolve or broke the single-inbound rule.
    pub fn load_snapshot(&mut self, snapshot: WorkflowSnapshot) -> Vec<Connection> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        self.nodes = snapshot
            .nodes
            .into_iter()
            .filter(|n| seen.insert(n.id.clone()))
            .collect();
        self.hovered_connector = None;
        self.graph
            .load(snapshot.connections, &mut self.nodes, &self.config.registry)
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            nodes: self.nodes.clone(),
            connections: self.graph.connections().to_vec(),
        }
    }

    /// Apply auto-layout and return the nodes whose position changed.
    pub fn auto_layout(&mut self, container_width: f64) -> Vec<(String, Position)> {
        if container_width.is_finite() && container_width > 0.0 {
            self.container_width = container_width;
        }
        let laid_out = layout::auto_layout(&self.nodes, self.container_width, &self.config);
        let moved = laid_out
            .iter()
            .zip(self.nodes.iter())
            .filter(|(after, before)| after.position != before.position)
            .filter_map(|(after, _)| after.position.map(|p| (after.id.clone(), p)))
            .collect();
        self.nodes = laid_out;
        moved
    }

    pub fn set_node_disabled(&mut self, node_id: &str, disabled: bool) -> Result<bool, CanvasError> {
        let node = self
            .node_mut(node_id)
            .ok_or_else(|| CanvasError::UnknownNode(node_id.to_string()))?;
        let changed = node.disabled != disabled;
        node.disabled = disabled;
        Ok(changed)
    }

    pub fn set_node_processing(&mut self, node_id: &str, processing: bool) -> Result<bool, CanvasError> {
        let node = self
            .node_mut(node_id)
            .ok_or_else(|| CanvasError::UnknownNode(node_id.to_string()))?;
        let changed = node.processing != processing;
        node.processing = processing;
        Ok(changed)
    }
}
