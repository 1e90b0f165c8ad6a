// The inputs the canvas reacts to and the events it reports back to its host.

use serde::{Deserialize, Serialize};

use crate::canvas::hit::HitTarget;
use crate::canvas::viewport::Viewport;
use crate::error::RejectionReason;
use crate::models::{Connection, ConnectorRef, Node, Position, WorkflowSnapshot};
use crate::node_builder::NodeSpec;
use crate::session::SessionKind;

#[derive(Debug, Clone)]
pub enum Message {
    // Pointer input (screen coordinates)
    PointerDown { target: HitTarget, screen: Position },
    PointerMove { screen: Position },
    PointerUp { target: HitTarget, screen: Position },
    /// Abandon whatever session is active (Escape, pointercancel, teardown).
    CancelSession,

    // Viewport
    ZoomIn,
    ZoomOut,
    Wheel { delta_y: f64, screen: Position },
    SetViewportOrigin { origin: Position },

    // Graph editing
    AutoLayout { container_width: f64 },
    AddNode { spec: NodeSpec },
    DeleteNode { node_id: String },
    DeleteConnection { connection_id: String },
    RequestAddNodeOnConnection { connection_id: String },
    SetNodeDisabled { node_id: String, disabled: bool },
    SetNodeProcessing { node_id: String, processing: bool },
    LoadSnapshot(WorkflowSnapshot),
}

/// Everything the host may want to hear about, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CanvasEvent {
    #[serde(rename_all = "camelCase")]
    NodeMoved { node_id: String, position: Position },
    #[serde(rename_all = "camelCase")]
    NodeDragStarted { node_id: String },
    #[serde(rename_all = "camelCase")]
    NodeDragEnded { node_id: String },
    #[serde(rename_all = "camelCase")]
    NodeClicked { node_id: String },
    ConnectionCreated { connection: Connection },
    ConnectionCreationRejected {
        reason: RejectionReason,
        from: ConnectorRef,
        to: ConnectorRef,
    },
    #[serde(rename_all = "camelCase")]
    ConnectionDeleted { connection_id: String },
    NodeAdded { node: Node },
    #[serde(rename_all = "camelCase")]
    NodeDeleted { node_id: String },
    #[serde(rename_all = "camelCase")]
    AddNodeOnConnectionRequested { connection_id: String },
    ViewportChanged { viewport: Viewport },
    SessionStarted { kind: SessionKind },
    SessionEnded { kind: SessionKind },
}

impl CanvasEvent {
    /// Name a host subscribes to, matching the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            CanvasEvent::NodeMoved { .. } => "nodeMoved",
            CanvasEvent::NodeDragStarted { .. } => "nodeDragStarted",
            CanvasEvent::NodeDragEnded { .. } => "nodeDragEnded",
            CanvasEvent::NodeClicked { .. } => "nodeClicked",
            CanvasEvent::ConnectionCreated { .. } => "connectionCreated",
            CanvasEvent::ConnectionCreationRejected { .. } => "connectionCreationRejected",
            CanvasEvent::ConnectionDeleted { .. } => "connectionDeleted",
            CanvasEvent::NodeAdded { .. } => "nodeAdded",
            CanvasEvent::NodeDeleted { .. } => "nodeDeleted",
            CanvasEvent::AddNodeOnConnectionRequested { .. } => "addNodeOnConnectionRequested",
            CanvasEvent::ViewportChanged { .. } => "viewportChanged",
            CanvasEvent::SessionStarted { .. } => "sessionStarted",
            CanvasEvent::SessionEnded { .. } => "sessionEnded",
        }
    }
}
