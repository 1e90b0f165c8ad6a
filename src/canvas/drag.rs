//! Node Drag Controller.
//!
//! Positions are tracked in canvas space so a drag follows the pointer 1:1
//! at any zoom level.  Every move writes straight into the node; there is no
//! separate commit on release.

use crate::models::{Node, Position};

#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub node_id: String,
    /// Pointer at pointer-down, canvas space.
    pub pointer_start: Position,
    pub node_start: Position,
    /// Pointer at pointer-down, screen space.  Used for click detection.
    pub screen_start: Position,
    /// Companions that travel with the dragged node, with their start positions.
    pub companions: Vec<(String, Position)>,
}

impl DragSession {
    /// `None` if the node has not been placed yet.
    pub fn start(node: &Node, nodes: &[Node], pointer_canvas: Position, screen: Position) -> Option<Self> {
        let node_start = node.position?;
        let companions = nodes
            .iter()
            .filter(|n| n.owner_id() == Some(node.id.as_str()))
            .filter_map(|n| n.position.map(|p| (n.id.clone(), p)))
            .collect();
        Some(Self {
            node_id: node.id.clone(),
            pointer_start: pointer_canvas,
            node_start,
            screen_start: screen,
            companions,
        })
    }

    /// `nodePositionStart + (pointerCurrent - pointerStart)`
    pub fn position_for(&self, pointer_canvas: Position) -> Position {
        self.node_start + (pointer_canvas - self.pointer_start)
    }

    /// Move the node (and its companions) under the pointer.  Returns every
    /// position written, dragged node first, or `None` once the node has
    /// disappeared.
    pub fn apply(&self, nodes: &mut [Node], pointer_canvas: Position) -> Option<Vec<(String, Position)>> {
        let delta = pointer_canvas - self.pointer_start;
        let position = self.position_for(pointer_canvas);
        let node = nodes.iter_mut().find(|n| n.id == self.node_id)?;
        node.position = Some(position);

        let mut moved = vec![(self.node_id.clone(), position)];
        for (companion_id, start) in &self.companions {
            if let Some(companion) = nodes.iter_mut().find(|n| &n.id == companion_id) {
                let at = *start + delta;
                companion.position = Some(at);
                moved.push((companion_id.clone(), at));
            }
        }
        Some(moved)
    }

    /// Pointer released within `threshold` screen px of where it went down.
    pub fn is_click(&self, screen_end: Position, threshold: f64) -> bool {
        self.screen_start.distance_to(screen_end) <= threshold
    }
}
