//! Geometry resolver: node type + position + connector id -> canvas point.
//!
//! Pure functions over the [`NodeTypeRegistry`].  The renderer places its
//! connector hit-targets with the very same functions, so drawing and
//! hit-testing cannot drift apart.

use serde::Serialize;

use crate::config::NodeTypeRegistry;
use crate::models::{Connection, ConnectorDirection, ConnectorRef, Node, Position};

/// Axis-aligned bounding box in canvas space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn origin(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// A connector resolved to absolute canvas coordinates.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDescriptor {
    pub node_id: String,
    pub connector_id: String,
    pub direction: ConnectorDirection,
    pub position: Position,
}

/// Absolute position of `connector_id` on `node`.
///
/// `None` when the node has no position yet or its type does not define the
/// connector.
pub fn connector_position(registry: &NodeTypeRegistry, node: &Node, connector_id: &str) -> Option<Position> {
    let origin = node.position?;
    let offset = registry.get(node.kind())?.connector_offset(connector_id)?;
    Some(origin + offset)
}

pub fn connector_descriptor(
    registry: &NodeTypeRegistry,
    node: &Node,
    connector_id: &str,
) -> Option<ConnectorDescriptor> {
    let spec = registry.connector(node.kind(), connector_id)?;
    let position = connector_position(registry, node, connector_id)?;
    Some(ConnectorDescriptor {
        node_id: node.id.clone(),
        connector_id: connector_id.to_string(),
        direction: spec.direction,
        position,
    })
}

/// Every connector of `node`, in registry order.  Empty for unplaced nodes.
pub fn connectors_of(registry: &NodeTypeRegistry, node: &Node) -> Vec<ConnectorDescriptor> {
    let Some(layout) = registry.get(node.kind()) else {
        return Vec::new();
    };
    layout
        .connectors
        .keys()
        .filter_map(|id| connector_descriptor(registry, node, id))
        .collect()
}

pub fn node_bounds(registry: &NodeTypeRegistry, node: &Node) -> Option<Bounds> {
    let origin = node.position?;
    let layout = registry.get(node.kind())?;
    Some(Bounds {
        x: origin.x,
        y: origin.y,
        width: layout.width,
        height: layout.height,
    })
}

/// Both endpoints of a connection, `None` if either cannot be resolved.
pub fn connection_endpoints(
    registry: &NodeTypeRegistry,
    nodes: &[Node],
    connection: &Connection,
) -> Option<(Position, Position)> {
    let from = nodes.iter().find(|n| n.id == connection.from_node_id)?;
    let to = nodes.iter().find(|n| n.id == connection.to_node_id)?;
    Some((
        connector_position(registry, from, &connection.from_connector_id)?,
        connector_position(registry, to, &connection.to_connector_id)?,
    ))
}

/// Topmost node whose box contains `point`.  Later nodes render on top.
pub fn node_at_point<'a>(registry: &NodeTypeRegistry, nodes: &'a [Node], point: Position) -> Option<&'a Node> {
    nodes
        .iter()
        .rev()
        .find(|node| node_bounds(registry, node).is_some_and(|b| b.contains(point)))
}

/// Nearest connector within `radius` of `point`.
pub fn connector_at_point(
    registry: &NodeTypeRegistry,
    nodes: &[Node],
    point: Position,
    radius: f64,
) -> Option<ConnectorRef> {
    let mut best: Option<(f64, ConnectorRef)> = None;
    for node in nodes.iter().rev() {
        for descriptor in connectors_of(registry, node) {
            let distance = descriptor.position.distance_to(point);
            if distance > radius {
                continue;
            }
            if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                best = Some((distance, ConnectorRef::new(descriptor.node_id, descriptor.connector_id)));
            }
        }
    }
    best.map(|(_, found)| found)
}
