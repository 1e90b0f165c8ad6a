//! Hit-target marker stacks.
//!
//! Whatever sits under the pointer is described as a stack of markers,
//! deepest element first.  The DOM glue fills it from `data-*` attributes;
//! non-DOM hosts use [`HitTarget::from_geometry`].

use serde::{Deserialize, Serialize};

use crate::config::NodeTypeRegistry;
use crate::canvas::geometry;
use crate::models::{ConnectorRef, Node, Position};

/// Markers declared by one element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub connector_id: Option<String>,
    #[serde(default)]
    pub interactive: bool,
}

impl Marker {
    pub fn is_empty(&self) -> bool {
        self.node_id.is_none() && self.connector_id.is_none() && !self.interactive
    }
}

/// What a pointer-down landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PressTarget {
    Connector(ConnectorRef),
    Node(String),
    /// A button, input or other control inside a node. Starts nothing.
    Interactive,
    Canvas,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HitTarget {
    markers: Vec<Marker>,
}

impl HitTarget {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Push an element further out than everything recorded so far.
    /// Elements without any marker are skipped.
    pub fn push(&mut self, marker: Marker) {
        if !marker.is_empty() {
            self.markers.push(marker);
        }
    }

    pub fn with(mut self, marker: Marker) -> Self {
        self.push(marker);
        self
    }

    pub fn node(node_id: impl Into<String>) -> Self {
        Self::empty().with(Marker {
            node_id: Some(node_id.into()),
            ..Marker::default()
        })
    }

    /// A connector element nested inside its node's element.
    pub fn connector(node_id: impl Into<String>, connector_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        Self::empty()
            .with(Marker {
                node_id: Some(node_id.clone()),
                connector_id: Some(connector_id.into()),
                interactive: true,
            })
            .with(Marker {
                node_id: Some(node_id),
                ..Marker::default()
            })
    }

    /// A control inside a node's element.
    pub fn control(node_id: impl Into<String>) -> Self {
        Self::empty()
            .with(Marker {
                interactive: true,
                ..Marker::default()
            })
            .with(Marker {
                node_id: Some(node_id.into()),
                ..Marker::default()
            })
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Classify a pointer-down.  The deepest meaningful marker decides:
    /// a connector starts an edge draw, an interactive control starts
    /// nothing, a bare node starts a drag, no marker at all starts a pan.
    pub fn classify_press(&self) -> PressTarget {
        for marker in &self.markers {
            if let Some(connector_id) = &marker.connector_id {
                return match &marker.node_id {
                    Some(node_id) => PressTarget::Connector(ConnectorRef::new(node_id.clone(), connector_id.clone())),
                    None => PressTarget::Interactive,
                };
            }
            if marker.interactive {
                return PressTarget::Interactive;
            }
            if let Some(node_id) = &marker.node_id {
                return PressTarget::Node(node_id.clone());
            }
        }
        PressTarget::Canvas
    }

    /// Drop target of an edge draw: the deepest element declaring a connector
    /// id, provided it also names its node.  Node-only hits are "no connector".
    pub fn drop_connector(&self) -> Option<ConnectorRef> {
        let marker = self.markers.iter().find(|m| m.connector_id.is_some())?;
        Some(ConnectorRef::new(marker.node_id.clone()?, marker.connector_id.clone()?))
    }

    /// Build the stack geometrically from canvas-space state.
    pub fn from_geometry(registry: &NodeTypeRegistry, nodes: &[Node], point: Position, radius: f64) -> Self {
        let mut target = Self::empty();
        if let Some(found) = geometry::connector_at_point(registry, nodes, point, radius) {
            target.push(Marker {
                node_id: Some(found.node_id),
                connector_id: Some(found.connector_id),
                interactive: true,
            });
        }
        if let Some(node) = geometry::node_at_point(registry, nodes, point) {
            target.push(Marker {
                node_id: Some(node.id.clone()),
                ..Marker::default()
            });
        }
        target
    }
}
