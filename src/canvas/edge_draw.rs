//! Edge Draw Controller.
//!
//! While drawing, only the rubber-band endpoint moves.  The graph is touched
//! once, on release, and only if the release landed on a connector.

use crate::canvas::geometry::{self, ConnectorDescriptor};
use crate::canvas::hit::HitTarget;
use crate::config::NodeTypeRegistry;
use crate::models::{ConnectorRef, Node, Position};

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDrawSession {
    pub from: ConnectorRef,
    pub from_position: Position,
    /// Live rubber-band endpoint, canvas space.
    pub pointer: Position,
}

/// Result of releasing the pointer while drawing.
#[derive(Clone, Debug, PartialEq)]
pub enum DropOutcome {
    /// Released over a connector; the caller validates and commits.
    Connect { from: ConnectorRef, to: ConnectorDescriptor },
    Cancel,
}

impl EdgeDrawSession {
    /// `None` when the start connector cannot be resolved.
    pub fn start(registry: &NodeTypeRegistry, nodes: &[Node], from: ConnectorRef, pointer: Position) -> Option<Self> {
        let node = nodes.iter().find(|n| n.id == from.node_id)?;
        let from_position = geometry::connector_position(registry, node, &from.connector_id)?;
        Some(Self {
            from,
            from_position,
            pointer,
        })
    }

    pub fn track(&mut self, pointer: Position) {
        self.pointer = pointer;
    }

    /// Resolve the drop target.  Anything other than a known connector on a
    /// live node cancels.
    pub fn finish(&self, registry: &NodeTypeRegistry, nodes: &[Node], target: &HitTarget) -> DropOutcome {
        let Some(to) = target.drop_connector() else {
            return DropOutcome::Cancel;
        };
        let Some(node) = nodes.iter().find(|n| n.id == to.node_id) else {
            return DropOutcome::Cancel;
        };
        match geometry::connector_descriptor(registry, node, &to.connector_id) {
            Some(descriptor) => DropOutcome::Connect {
                from: self.from.clone(),
                to: descriptor,
            },
            None => DropOutcome::Cancel,
        }
    }
}
