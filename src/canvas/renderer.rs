//! Canvas renderer: a pure function from [`CanvasState`] to a [`Scene`].
//!
//! The scene is in local screen space (relative to the canvas element), so
//! the host only has to position absolutely and stroke lines.  Connector dots
//! are placed with the geometry resolver, the same code hit-testing uses.

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::canvas::geometry;
use crate::constants::*;
use crate::models::{ConnectorDirection, NodeKind, Position};
use crate::state::CanvasState;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub zoom: f64,
    pub background: &'static str,
    pub grid: GridView,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub rubber_band: Option<LineView>,
}

/// Background grid: line spacing and phase, both in screen px.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub spacing: f64,
    pub offset: Position,
    pub color: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub disabled: bool,
    pub processing: bool,
    pub reachable: bool,
    pub connectors: Vec<ConnectorView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorView {
    pub connector_id: String,
    pub direction: ConnectorDirection,
    pub x: f64,
    pub y: f64,
    pub connected: bool,
    pub hovered: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub from: Position,
    pub to: Position,
    pub color: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeAction {
    AddNode,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub id: String,
    pub line: LineView,
    /// Where the add-node / delete affordances sit.
    pub midpoint: Position,
    pub actions: Vec<EdgeAction>,
}

pub fn render(state: &CanvasState) -> Scene {
    let zoom = state.viewport.zoom;
    Scene {
        zoom,
        background: CANVAS_BACKGROUND_COLOR,
        grid: draw_grid(state),
        nodes: draw_nodes(state),
        edges: draw_connections(state),
        rubber_band: draw_connection_preview(state),
    }
}

fn draw_grid(state: &CanvasState) -> GridView {
    let spacing = BACKGROUND_GRID_SPACING * state.viewport.zoom;
    let origin = state.viewport.to_local_screen(Position::default());
    GridView {
        spacing,
        offset: Position::new(origin.x.rem_euclid(spacing), origin.y.rem_euclid(spacing)),
        color: GRID_LINE_COLOR,
    }
}

fn draw_nodes(state: &CanvasState) -> Vec<NodeView> {
    let registry = &state.config.registry;
    let reachable = state.graph.reachable_from_triggers(&state.nodes);
    let zoom = state.viewport.zoom;

    state
        .nodes
        .iter()
        .filter_map(|node| {
            let bounds = geometry::node_bounds(registry, node)?;
            let top_left = state.viewport.to_local_screen(bounds.origin());
            let connectors = geometry::connectors_of(registry, node)
                .into_iter()
                .map(|c| {
                    let at = state.viewport.to_local_screen(c.position);
                    let hovered = state
                        .hovered_connector
                        .as_ref()
                        .is_some_and(|h| h.node_id == node.id && h.connector_id == c.connector_id);
                    ConnectorView {
                        connected: !node.connected_to(&c.connector_id).is_empty(),
                        connector_id: c.connector_id,
                        direction: c.direction,
                        x: at.x,
                        y: at.y,
                        hovered,
                    }
                })
                .collect();

            Some(NodeView {
                id: node.id.clone(),
                kind: node.kind(),
                label: truncate_label(&node.name, bounds.width),
                x: top_left.x,
                y: top_left.y,
                width: bounds.width * zoom,
                height: bounds.height * zoom,
                disabled: node.disabled,
                processing: node.processing,
                reachable: reachable.contains(&node.id),
                connectors,
            })
        })
        .collect()
}

fn draw_connections(state: &CanvasState) -> Vec<EdgeView> {
    let registry = &state.config.registry;
    state
        .graph
        .connections()
        .iter()
        .filter_map(|connection| {
            let (from, to) = geometry::connection_endpoints(registry, &state.nodes, connection)?;
            let to_kind = state.node(&connection.to_node_id)?.kind();
            let from = state.viewport.to_local_screen(from);
            let to = state.viewport.to_local_screen(to);
            Some(EdgeView {
                id: connection.id.clone(),
                line: LineView {
                    from,
                    to,
                    color: state
                        .config
                        .edge_styles
                        .color_for(&connection.from_connector_id, to_kind)
                        .to_string(),
                },
                midpoint: from.midpoint(to),
                actions: vec![EdgeAction::AddNode, EdgeAction::Delete],
            })
        })
        .collect()
}

fn draw_connection_preview(state: &CanvasState) -> Option<LineView> {
    let draw = state.session.edge_draw()?;
    Some(LineView {
        from: state.viewport.to_local_screen(draw.from_position),
        to: state.viewport.to_local_screen(draw.pointer),
        color: RUBBER_BAND_COLOR.to_string(),
    })
}

/// Fit `name` inside a node `width` canvas units wide, cutting on grapheme
/// boundaries and appending an ellipsis.
pub fn truncate_label(name: &str, width: f64) -> String {
    let max = ((width - LABEL_PADDING) / LABEL_CHAR_WIDTH).floor().max(1.0) as usize;
    let graphemes: Vec<&str> = name.graphemes(true).collect();
    if graphemes.len() <= max {
        return name.to_string();
    }
    let mut out: String = graphemes[..max.saturating_sub(1)].concat();
    out.push('…');
    out
}
