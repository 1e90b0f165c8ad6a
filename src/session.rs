//! The single active-session holder.
//!
//! Drag, edge-draw and pan are mutually exclusive.  Starting one while another
//! is active is refused with [`CanvasError::SessionAlreadyActive`].

use serde::{Deserialize, Serialize};

use crate::canvas::drag::DragSession;
use crate::canvas::edge_draw::EdgeDrawSession;
use crate::canvas::viewport::PanSession;
use crate::error::CanvasError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    Drag,
    EdgeDraw,
    Pan,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Drag => "drag",
            SessionKind::EdgeDraw => "edge-draw",
            SessionKind::Pan => "pan",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActiveSession {
    Drag(DragSession),
    EdgeDraw(EdgeDrawSession),
    Pan(PanSession),
}

impl ActiveSession {
    pub fn kind(&self) -> SessionKind {
        match self {
            ActiveSession::Drag(_) => SessionKind::Drag,
            ActiveSession::EdgeDraw(_) => SessionKind::EdgeDraw,
            ActiveSession::Pan(_) => SessionKind::Pan,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSlot {
    active: Option<ActiveSession>,
}

impl SessionSlot {
    pub fn begin(&mut self, session: ActiveSession) -> Result<SessionKind, CanvasError> {
        if let Some(current) = &self.active {
            return Err(CanvasError::SessionAlreadyActive {
                active: current.kind().as_str(),
            });
        }
        let kind = session.kind();
        self.active = Some(session);
        Ok(kind)
    }

    pub fn end(&mut self) -> Option<ActiveSession> {
        self.active.take()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn kind(&self) -> Option<SessionKind> {
        self.active.as_ref().map(ActiveSession::kind)
    }

    pub fn get(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut ActiveSession> {
        self.active.as_mut()
    }

    pub fn edge_draw(&self) -> Option<&EdgeDrawSession> {
        match &self.active {
            Some(ActiveSession::EdgeDraw(session)) => Some(session),
            _ => None,
        }
    }
}
