//! Auto-layout: row-major grid packing for primary nodes, fixed anchoring for
//! companions.
//!
//! Layout is a pure function of the node list, the container width and the
//! config, so running it twice gives the same positions.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{CanvasConfig, LayoutConfig, NodeTypeRegistry};
use crate::models::{Node, Position};

/// Grid columns that fit in `container_width`; never fewer than one.
pub fn columns_for(container_width: f64, layout: &LayoutConfig) -> usize {
    if !container_width.is_finite() || layout.cell_width <= 0.0 {
        return 1;
    }
    ((container_width / layout.cell_width).floor() as usize).max(1)
}

pub fn grid_cell(index: usize, columns: usize, layout: &LayoutConfig) -> Position {
    let columns = columns.max(1);
    let col = (index % columns) as f64;
    let row = (index / columns) as f64;
    Position::new(
        layout.origin.x + col * layout.cell_width,
        layout.origin.y + row * layout.cell_height,
    )
}

/// Where the `index`-th companion hanging off `slot` on `owner` goes.
///
/// `x = owner.x + slot.x - width/2 + index * (width + spacing)`,
/// `y = owner.y + owner.height + gap`.
pub fn companion_anchor(
    registry: &NodeTypeRegistry,
    layout: &LayoutConfig,
    owner: &Node,
    companion: &Node,
    index: usize,
) -> Option<Position> {
    let origin = owner.position?;
    let owner_layout = registry.get(owner.kind())?;
    let slot = owner_layout.connector_offset(companion.companion_slot()?)?;
    let width = registry.get(companion.kind())?.width;
    Some(Position::new(
        origin.x + slot.x - width / 2.0 + index as f64 * (width + layout.companion_spacing),
        origin.y + owner_layout.height + layout.companion_gap,
    ))
}

/// A companion is only anchored while its owner is on the canvas.
fn is_anchored(node: &Node, ids: &BTreeSet<&str>) -> bool {
    node.owner_id().is_some_and(|owner| ids.contains(owner))
}

/// Re-anchor every companion to its owner's current position.
pub fn anchor_companions(nodes: &mut [Node], config: &CanvasConfig) {
    let ids: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut slot_counts: BTreeMap<(String, &'static str), usize> = BTreeMap::new();
    let mut placements: Vec<(usize, Position)> = Vec::new();

    for (i, node) in nodes.iter().enumerate() {
        if !is_anchored(node, &ids) {
            continue;
        }
        let (Some(owner_id), Some(slot)) = (node.owner_id(), node.companion_slot()) else {
            continue;
        };
        let Some(owner) = nodes.iter().find(|n| n.id == owner_id) else {
            continue;
        };
        let index = slot_counts.entry((owner_id.to_string(), slot)).or_insert(0);
        if let Some(position) = companion_anchor(&config.registry, &config.layout, owner, node, *index) {
            placements.push((i, position));
        }
        *index += 1;
    }

    for (i, position) in placements {
        nodes[i].position = Some(position);
    }
}

/// Pack primaries into the grid in list order, then anchor companions.
pub fn auto_layout(nodes: &[Node], container_width: f64, config: &CanvasConfig) -> Vec<Node> {
    let columns = columns_for(container_width, &config.layout);
    let ids: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut laid_out = nodes.to_vec();

    let mut index = 0;
    for node in laid_out.iter_mut() {
        if is_anchored(node, &ids) {
            continue;
        }
        node.position = Some(grid_cell(index, columns, &config.layout));
        index += 1;
    }

    anchor_companions(&mut laid_out, config);
    laid_out
}

/// First grid cell not already holding a primary node.
pub fn next_free_cell(nodes: &[Node], container_width: f64, config: &CanvasConfig) -> Position {
    let columns = columns_for(container_width, &config.layout);
    let ids: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let taken: Vec<Position> = nodes
        .iter()
        .filter(|n| !is_anchored(n, &ids))
        .filter_map(|n| n.position)
        .collect();

    (0..)
        .map(|i| grid_cell(i, columns, &config.layout))
        .find(|cell| !taken.contains(cell))
        .unwrap_or(config.layout.origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::models::NodeData;
    use proptest::prelude::*;

    fn agent(id: &str) -> Node {
        Node::new(
            id,
            id,
            NodeData::Agent { model_node_id: None, tool_node_ids: vec![], system_prompt: None },
        )
    }

    fn model_of(id: &str, owner: &str) -> Node {
        Node::new(
            id,
            id,
            NodeData::ChatModel { owner_id: owner.into(), provider: "p".into(), model: "m".into() },
        )
    }

    fn tool_of(id: &str, owner: &str) -> Node {
        Node::new(id, id, NodeData::ToolDisplay { owner_id: owner.into(), tool_name: id.into() })
    }

    #[test]
    fn primaries_fill_rows_left_to_right() {
        let config = CanvasConfig::default();
        let nodes = vec![agent("a"), agent("b"), agent("c"), agent("d"), agent("e")];
        let laid = auto_layout(&nodes, 1000.0, &config);
        let at = |i: usize| laid[i].position.unwrap();
        assert_eq!(at(0), Position::new(40.0, 40.0));
        assert_eq!(at(2), Position::new(40.0 + 2.0 * GRID_CELL_WIDTH, 40.0));
        assert_eq!(at(3), Position::new(40.0, 40.0 + GRID_CELL_HEIGHT));
    }

    #[test]
    fn narrow_container_still_has_one_column() {
        let config = CanvasConfig::default();
        assert_eq!(columns_for(10.0, &config.layout), 1);
        assert_eq!(columns_for(f64::NAN, &config.layout), 1);
        assert_eq!(columns_for(1280.0, &config.layout), 4);
    }

    #[test]
    fn companions_anchor_under_their_slot() {
        let config = CanvasConfig::default();
        let nodes = vec![agent("a"), model_of("m", "a"), tool_of("t1", "a"), tool_of("t2", "a")];
        let laid = auto_layout(&nodes, 1280.0, &config);
        let y = 40.0 + AGENT_NODE_HEIGHT + COMPANION_GAP;
        assert_eq!(
            laid[1].position,
            Some(Position::new(40.0 + AGENT_NODE_WIDTH / 6.0 - COMPANION_NODE_WIDTH / 2.0, y))
        );
        let tool_x = 40.0 + 5.0 * AGENT_NODE_WIDTH / 6.0 - COMPANION_NODE_WIDTH / 2.0;
        assert_eq!(laid[2].position, Some(Position::new(tool_x, y)));
        assert_eq!(
            laid[3].position,
            Some(Position::new(tool_x + COMPANION_NODE_WIDTH + COMPANION_SPACING, y))
        );
    }

    #[test]
    fn orphaned_companion_is_packed_like_a_primary() {
        let config = CanvasConfig::default();
        let laid = auto_layout(&[agent("a"), model_of("m", "gone")], 1280.0, &config);
        assert_eq!(laid[1].position, Some(Position::new(40.0 + GRID_CELL_WIDTH, 40.0)));
    }

    #[test]
    fn next_free_cell_skips_occupied_cells() {
        let config = CanvasConfig::default();
        let laid = auto_layout(&[agent("a"), model_of("m", "a")], 1280.0, &config);
        assert_eq!(next_free_cell(&laid, 1280.0, &config), Position::new(40.0 + GRID_CELL_WIDTH, 40.0));
        assert_eq!(next_free_cell(&[], 1280.0, &config), Position::new(40.0, 40.0));
    }

    proptest! {
        #[test]
        fn layout_is_idempotent(primaries in 0usize..12, companions in 0usize..12, width in 100.0f64..4000.0) {
            let config = CanvasConfig::default();
            let mut nodes: Vec<Node> = (0..primaries).map(|i| agent(&format!("a{i}"))).collect();
            for i in 0..companions {
                let owner = if primaries == 0 { "none".to_string() } else { format!("a{}", i % primaries) };
                nodes.push(tool_of(&format!("t{i}"), &owner));
            }
            let once = auto_layout(&nodes, width, &config);
            let twice = auto_layout(&once, width, &config);
            prop_assert_eq!(once, twice);
        }
    }
}
