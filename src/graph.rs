//! Connection Graph Manager.
//!
//! The connection list is the single source of truth.  Every mutation ends
//! with [`ConnectionGraph::sync_connectors`], which rebuilds each node's
//! `connectors` map from scratch.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::config::{CanvasConfig, NodeTypeRegistry};
use crate::debug_log;
use crate::error::RejectionReason;
use crate::models::{fresh_id, Connection, ConnectorRef, ConnectorState, Node};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionGraph {
    connections: Vec<Connection>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn get(&self, connection_id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == connection_id)
    }

    /// The connection terminating at `to`, if any.
    pub fn inbound(&self, to: &ConnectorRef) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to_node_id == to.node_id && c.to_connector_id == to.connector_id)
    }

    /// Apply the three validation rules in order.
    pub fn validate(
        &self,
        nodes: &[Node],
        config: &CanvasConfig,
        from: &ConnectorRef,
        to: &ConnectorRef,
    ) -> Result<(), RejectionReason> {
        if from.node_id == to.node_id {
            return Err(RejectionReason::SelfConnection);
        }

        let from_node = find(nodes, &from.node_id).ok_or(RejectionReason::IncompatibleTypes)?;
        let to_node = find(nodes, &to.node_id).ok_or(RejectionReason::IncompatibleTypes)?;
        if !config
            .compatibility
            .allows(from_node.kind(), &from.connector_id, to_node.kind(), &to.connector_id)
        {
            return Err(RejectionReason::IncompatibleTypes);
        }

        if self.inbound(to).is_some() {
            return Err(RejectionReason::InputAlreadyConnected);
        }
        Ok(())
    }

    pub fn try_create_connection(
        &mut self,
        nodes: &mut [Node],
        config: &CanvasConfig,
        from: &ConnectorRef,
        to: &ConnectorRef,
    ) -> Result<Connection, RejectionReason> {
        if let Err(reason) = self.validate(nodes, config, from, to) {
            debug_log!(
                "Rejected connection {}.{} -> {}.{}: {}",
                from.node_id,
                from.connector_id,
                to.node_id,
                to.connector_id,
                reason.as_str()
            );
            return Err(reason);
        }

        let connection = Connection {
            id: fresh_id("conn"),
            from_node_id: from.node_id.clone(),
            from_connector_id: from.connector_id.clone(),
            to_node_id: to.node_id.clone(),
            to_connector_id: to.connector_id.clone(),
        };
        self.connections.push(connection.clone());
        self.sync_connectors(nodes, &config.registry);
        debug_log!("Created connection {}", connection.id);
        Ok(connection)
    }

    /// Unknown ids are a no-op and return `None`.
    pub fn delete_connection(
        &mut self,
        nodes: &mut [Node],
        registry: &NodeTypeRegistry,
        connection_id: &str,
    ) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id == connection_id)?;
        let removed = self.connections.remove(index);
        self.sync_connectors(nodes, registry);
        debug_log!("Deleted connection {}", removed.id);
        Some(removed)
    }

    /// Drop every connection touching any of `node_ids`.  Back-references are
    /// left for the caller to resync once the nodes themselves are gone.
    pub fn remove_touching(&mut self, node_ids: &BTreeSet<String>) -> Vec<Connection> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .connections
            .drain(..)
            .partition(|c| node_ids.contains(&c.from_node_id) || node_ids.contains(&c.to_node_id));
        self.connections = kept;
        removed
    }

    /// Rebuild every node's `connectors` map from the connection list.  Each
    /// registry connector is present, unconnected ones with an empty list.
    pub fn sync_connectors(&self, nodes: &mut [Node], registry: &NodeTypeRegistry) {
        let index: BTreeMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        for node in nodes.iter_mut() {
            node.connectors = registry
                .get(node.kind())
                .map(|layout| {
                    layout
                        .connectors
                        .iter()
                        .map(|(id, spec)| {
                            (
                                id.clone(),
                                ConnectorState {
                                    direction: spec.direction,
                                    connected_to: Vec::new(),
                                },
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
        }

        for connection in &self.connections {
            if let Some(&i) = index.get(&connection.from_node_id) {
                if let Some(state) = nodes[i].connectors.get_mut(&connection.from_connector_id) {
                    state.connected_to.push(connection.to_ref());
                }
            }
            if let Some(&i) = index.get(&connection.to_node_id) {
                if let Some(state) = nodes[i].connectors.get_mut(&connection.to_connector_id) {
                    state.connected_to.push(connection.from_ref());
                }
            }
        }
    }

    /// Replace the connection list with `incoming`, keeping only connections
    /// whose endpoints resolve to live connectors and honouring the
    /// single-inbound rule (first wins).  Returns what was dropped.
    pub fn load(
        &mut self,
        incoming: Vec<Connection>,
        nodes: &mut [Node],
        registry: &NodeTypeRegistry,
    ) -> Vec<Connection> {
        let mut seen_inbound: HashSet<ConnectorRef> = HashSet::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut dropped = Vec::new();
        self.connections.clear();

        let live: &[Node] = nodes;
        for connection in incoming {
            let resolves = |node_id: &str, connector_id: &str| {
                find(live, node_id).is_some_and(|n| registry.connector(n.kind(), connector_id).is_some())
            };
            let valid = connection.from_node_id != connection.to_node_id
                && resolves(&connection.from_node_id, &connection.from_connector_id)
                && resolves(&connection.to_node_id, &connection.to_connector_id)
                && !seen_ids.contains(&connection.id)
                && !seen_inbound.contains(&connection.to_ref());
            if valid {
                seen_inbound.insert(connection.to_ref());
                seen_ids.insert(connection.id.clone());
                self.connections.push(connection);
            } else {
                debug_log!("Dropping unresolvable connection {}", connection.id);
                dropped.push(connection);
            }
        }

        self.sync_connectors(nodes, registry);
        dropped
    }

    /// Node ids reachable from any trigger, following connections forward.
    /// Companions of a reachable owner count as reachable.
    pub fn reachable_from_triggers(&self, nodes: &[Node]) -> BTreeSet<String> {
        let mut reachable: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = nodes
            .iter()
            .filter(|n| n.kind().is_trigger())
            .map(|n| n.id.as_str())
            .collect();

        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id.to_string()) {
                continue;
            }
            for connection in self.connections.iter().filter(|c| c.from_node_id == id) {
                queue.push_back(connection.to_node_id.as_str());
            }
            for companion in nodes.iter().filter(|n| n.owner_id() == Some(id)) {
                queue.push_back(companion.id.as_str());
            }
        }
        reachable
    }
}

fn find<'a>(nodes: &'a [Node], node_id: &str) -> Option<&'a Node> {
    nodes.iter().find(|n| n.id == node_id)
}
