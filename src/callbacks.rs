//! Host callback surface.
//!
//! Hosts implement only the hooks they care about; every method defaults to a
//! no-op.  [`dispatch`] fans a batch of reducer events out to them in order.

use crate::error::RejectionReason;
use crate::messages::CanvasEvent;
use crate::models::{Connection, ConnectorRef, Node, Position};
use crate::canvas::viewport::Viewport;
use crate::session::SessionKind;

#[allow(unused_variables)]
pub trait CanvasCallbacks {
    /// Called for every event before the specific hook.
    fn on_event(&mut self, event: &CanvasEvent) {}

    fn on_node_moved(&mut self, node_id: &str, position: Position) {}
    fn on_node_drag_start(&mut self, node_id: &str) {}
    fn on_node_drag_end(&mut self, node_id: &str) {}
    fn on_node_clicked(&mut self, node_id: &str) {}
    fn on_connection_created(&mut self, connection: &Connection) {}
    fn on_connection_creation_rejected(&mut self, reason: RejectionReason, from: &ConnectorRef, to: &ConnectorRef) {}
    fn on_connection_deleted(&mut self, connection_id: &str) {}
    fn on_node_added(&mut self, node: &Node) {}
    fn on_node_deleted(&mut self, node_id: &str) {}
    fn on_add_node_on_connection(&mut self, connection_id: &str) {}
    fn on_viewport_changed(&mut self, viewport: &Viewport) {}
    fn on_session_started(&mut self, kind: SessionKind) {}
    fn on_session_ended(&mut self, kind: SessionKind) {}
}

pub fn dispatch<C: CanvasCallbacks + ?Sized>(events: &[CanvasEvent], callbacks: &mut C) {
    for event in events {
        callbacks.on_event(event);
        match event {
            CanvasEvent::NodeMoved { node_id, position } => callbacks.on_node_moved(node_id, *position),
            CanvasEvent::NodeDragStarted { node_id } => callbacks.on_node_drag_start(node_id),
            CanvasEvent::NodeDragEnded { node_id } => callbacks.on_node_drag_end(node_id),
            CanvasEvent::NodeClicked { node_id } => callbacks.on_node_clicked(node_id),
            CanvasEvent::ConnectionCreated { connection } => callbacks.on_connection_created(connection),
            CanvasEvent::ConnectionCreationRejected { reason, from, to } => {
                callbacks.on_connection_creation_rejected(*reason, from, to)
            }
            CanvasEvent::ConnectionDeleted { connection_id } => callbacks.on_connection_deleted(connection_id),
            CanvasEvent::NodeAdded { node } => callbacks.on_node_added(node),
            CanvasEvent::NodeDeleted { node_id } => callbacks.on_node_deleted(node_id),
            CanvasEvent::AddNodeOnConnectionRequested { connection_id } => {
                callbacks.on_add_node_on_connection(connection_id)
            }
            CanvasEvent::ViewportChanged { viewport } => callbacks.on_viewport_changed(viewport),
            CanvasEvent::SessionStarted { kind } => callbacks.on_session_started(*kind),
            CanvasEvent::SessionEnded { kind } => callbacks.on_session_ended(*kind),
        }
    }
}
