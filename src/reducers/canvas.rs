//! Canvas reducer.
//!
//! Drives the drag, edge-draw and pan controllers from pointer messages and
//! applies structural edits.  Returns whether the scene needs re-rendering;
//! everything the host should hear about is appended to `events`.

use crate::canvas::drag::DragSession;
use crate::canvas::edge_draw::{DropOutcome, EdgeDrawSession};
use crate::canvas::geometry;
use crate::canvas::hit::{HitTarget, PressTarget};
use crate::canvas::viewport::PanSession;
use crate::error::CanvasError;
use crate::messages::{CanvasEvent, Message};
use crate::models::{ConnectorRef, Position};
use crate::session::{ActiveSession, SessionKind};
use crate::state::CanvasState;
use crate::{debug_log, warn_log};

pub fn update(state: &mut CanvasState, msg: &Message, events: &mut Vec<CanvasEvent>) -> bool {
    match msg {
        Message::PointerDown { target, screen } => pointer_down(state, target, *screen, events),
        Message::PointerMove { screen } => pointer_move(state, *screen, events),
        Message::PointerUp { target, screen } => pointer_up(state, target, *screen, events),
        Message::CancelSession => end_session(state, events).is_some(),
        Message::ZoomIn => {
            let changed = state.viewport.zoom_in(&state.config.zoom);
            viewport_changed(state, changed, events)
        }
        Message::ZoomOut => {
            let changed = state.viewport.zoom_out(&state.config.zoom);
            viewport_changed(state, changed, events)
        }
        Message::Wheel { delta_y, screen } => {
            if *delta_y == 0.0 || !delta_y.is_finite() {
                return false;
            }
            let changed = state
                .viewport
                .zoom_about(*delta_y < 0.0, *screen, &state.config.zoom);
            viewport_changed(state, changed, events)
        }
        Message::SetViewportOrigin { origin } => {
            // Only affects how future pointer events map; nothing to redraw.
            state.viewport.origin = *origin;
            false
        }
        Message::AutoLayout { container_width } => {
            // Sessions hold pre-layout positions.
            end_session(state, events);
            let moved = state.auto_layout(*container_width);
            debug_log!("Auto-layout moved {} node(s)", moved.len());
            for (node_id, position) in moved {
                events.push(CanvasEvent::NodeMoved { node_id, position });
            }
            true
        }
        Message::AddNode { spec } => match state.add_node(spec.clone()) {
            Ok(added) => {
                for node in added.nodes {
                    events.push(CanvasEvent::NodeAdded { node });
                }
                for connection in added.connections {
                    events.push(CanvasEvent::ConnectionCreated { connection });
                }
                true
            }
            Err(err) => {
                warn_log!("Cannot add node: {}", err);
                false
            }
        },
        Message::DeleteNode { node_id } => match state.delete_node(node_id) {
            Ok(removed) => {
                for connection in removed.connections {
                    events.push(CanvasEvent::ConnectionDeleted {
                        connection_id: connection.id,
                    });
                }
                for node_id in removed.node_ids {
                    events.push(CanvasEvent::NodeDeleted { node_id });
                }
                true
            }
            Err(err) => {
                warn_log!("Cannot delete node: {}", err);
                false
            }
        },
        Message::DeleteConnection { connection_id } => match state.delete_connection(connection_id) {
            Some(connection) => {
                events.push(CanvasEvent::ConnectionDeleted {
                    connection_id: connection.id,
                });
                true
            }
            None => {
                debug_log!("Connection {} already gone", connection_id);
                false
            }
        },
        Message::RequestAddNodeOnConnection { connection_id } => {
            if state.graph.get(connection_id).is_some() {
                events.push(CanvasEvent::AddNodeOnConnectionRequested {
                    connection_id: connection_id.clone(),
                });
            }
            false
        }
        Message::SetNodeDisabled { node_id, disabled } => {
            report(state.set_node_disabled(node_id, *disabled))
        }
        Message::SetNodeProcessing { node_id, processing } => {
            report(state.set_node_processing(node_id, *processing))
        }
        Message::LoadSnapshot(snapshot) => {
            end_session(state, events);
            let dropped = state.load_snapshot(snapshot.clone());
            if !dropped.is_empty() {
                warn_log!("Dropped {} invalid connection(s) while loading", dropped.len());
            }
            true
        }
    }
}

fn report(result: Result<bool, CanvasError>) -> bool {
    result.unwrap_or_else(|err| {
        warn_log!("{}", err);
        false
    })
}

fn viewport_changed(state: &CanvasState, changed: bool, events: &mut Vec<CanvasEvent>) -> bool {
    if changed {
        events.push(CanvasEvent::ViewportChanged {
            viewport: state.viewport,
        });
    }
    changed
}

fn pointer_down(state: &mut CanvasState, target: &HitTarget, screen: Position, events: &mut Vec<CanvasEvent>) -> bool {
    if let Some(kind) = state.session.kind() {
        let err = CanvasError::SessionAlreadyActive { active: kind.as_str() };
        warn_log!("Ignoring pointer-down: {}", err);
        return false;
    }

    let canvas = state.to_canvas(screen);
    let session = match target.classify_press() {
        PressTarget::Connector(from) => {
            match EdgeDrawSession::start(&state.config.registry, &state.nodes, from, canvas) {
                Some(draw) => ActiveSession::EdgeDraw(draw),
                None => {
                    debug_log!("Pressed connector has no geometry, ignoring");
                    return false;
                }
            }
        }
        PressTarget::Node(node_id) => {
            let Some(node) = state.node(&node_id) else {
                return false;
            };
            match DragSession::start(node, &state.nodes, canvas, screen) {
                Some(drag) => ActiveSession::Drag(drag),
                None => return false,
            }
        }
        PressTarget::Interactive => return false,
        PressTarget::Canvas => ActiveSession::Pan(PanSession::start(screen, &state.viewport)),
    };

    let drag_node = match &session {
        ActiveSession::Drag(drag) => Some(drag.node_id.clone()),
        _ => None,
    };
    match state.session.begin(session) {
        Ok(kind) => {
            state.hovered_connector = None;
            debug_log!("Started {} session", kind.as_str());
            events.push(CanvasEvent::SessionStarted { kind });
            if let Some(node_id) = drag_node {
                events.push(CanvasEvent::NodeDragStarted { node_id });
            }
            true
        }
        Err(err) => {
            warn_log!("{}", err);
            false
        }
    }
}

fn pointer_move(state: &mut CanvasState, screen: Position, events: &mut Vec<CanvasEvent>) -> bool {
    let canvas = state.to_canvas(screen);
    if !state.session.is_active() {
        return update_hover(state, canvas);
    }

    let zoom = state.viewport.zoom;
    let stale = match state.session.get_mut() {
        Some(ActiveSession::Drag(drag)) => match drag.apply(&mut state.nodes, canvas) {
            Some(moved) => {
                for (node_id, position) in moved {
                    events.push(CanvasEvent::NodeMoved { node_id, position });
                }
                false
            }
            None => true,
        },
        Some(ActiveSession::EdgeDraw(draw)) => {
            if state.nodes.iter().any(|n| n.id == draw.from.node_id) {
                draw.track(canvas);
                false
            } else {
                true
            }
        }
        Some(ActiveSession::Pan(pan)) => {
            state.viewport.scroll = pan.scroll_for(screen, zoom);
            events.push(CanvasEvent::ViewportChanged {
                viewport: state.viewport,
            });
            false
        }
        None => false,
    };

    if stale {
        debug_log!("Session target vanished, ending session");
        end_session(state, events);
    }
    true
}

fn update_hover(state: &mut CanvasState, canvas: Position) -> bool {
    let hovered = geometry::connector_at_point(
        &state.config.registry,
        &state.nodes,
        canvas,
        state.config.connector_hit_radius,
    );
    if hovered == state.hovered_connector {
        return false;
    }
    state.hovered_connector = hovered;
    true
}

fn pointer_up(state: &mut CanvasState, target: &HitTarget, screen: Position, events: &mut Vec<CanvasEvent>) -> bool {
    let Some(session) = state.session.end() else {
        return false;
    };
    let kind = session.kind();

    match session {
        ActiveSession::Drag(drag) => {
            if state.node(&drag.node_id).is_some() && drag.is_click(screen, state.config.click_threshold) {
                events.push(CanvasEvent::NodeClicked {
                    node_id: drag.node_id.clone(),
                });
            }
            events.push(CanvasEvent::NodeDragEnded { node_id: drag.node_id });
        }
        ActiveSession::EdgeDraw(draw) => finish_edge(state, &draw, target, events),
        ActiveSession::Pan(_) => {}
    }

    debug_log!("Ended {} session", kind.as_str());
    events.push(CanvasEvent::SessionEnded { kind });
    true
}

fn finish_edge(state: &mut CanvasState, draw: &EdgeDrawSession, target: &HitTarget, events: &mut Vec<CanvasEvent>) {
    if state.node(&draw.from.node_id).is_none() {
        debug_log!("Edge source {} vanished, cancelling", draw.from.node_id);
        return;
    }

    match draw.finish(&state.config.registry, &state.nodes, target) {
        DropOutcome::Connect { from, to } => {
            let to = ConnectorRef::new(to.node_id, to.connector_id);
            match state
                .graph
                .try_create_connection(&mut state.nodes, &state.config, &from, &to)
            {
                Ok(connection) => events.push(CanvasEvent::ConnectionCreated { connection }),
                Err(reason) => events.push(CanvasEvent::ConnectionCreationRejected { reason, from, to }),
            }
        }
        DropOutcome::Cancel => debug_log!("Edge draw dropped on empty space"),
    }
}

/// End the active session on any path other than a pointer-up.
fn end_session(state: &mut CanvasState, events: &mut Vec<CanvasEvent>) -> Option<SessionKind> {
    let session = state.session.end()?;
    let kind = session.kind();
    if let ActiveSession::Drag(drag) = session {
        events.push(CanvasEvent::NodeDragEnded { node_id: drag.node_id });
    }
    debug_log!("Cancelled {} session", kind.as_str());
    events.push(CanvasEvent::SessionEnded { kind });
    Some(kind)
}
