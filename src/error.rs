use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a candidate connection was refused.  Always recoverable: the attempted
/// edge is discarded and the graph is left untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    #[error("a node cannot be connected to itself")]
    SelfConnection,

    #[error("these connectors cannot be connected to each other")]
    IncompatibleTypes,

    #[error("the target input already has an incoming connection")]
    InputAlreadyConnected,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::SelfConnection => "SELF_CONNECTION",
            RejectionReason::IncompatibleTypes => "INCOMPATIBLE_TYPES",
            RejectionReason::InputAlreadyConnected => "INPUT_ALREADY_CONNECTED",
        }
    }
}

/// Errors surfaced by canvas state operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("Node '{0}' not found")]
    UnknownNode(String),

    #[error("Node '{owner_id}' has no '{slot}' connector to hold a companion")]
    NoCompanionSlot { owner_id: String, slot: &'static str },

    #[error("A {active} session is already active")]
    SessionAlreadyActive { active: &'static str },

    #[error("Invalid workflow snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Errors raised while loading or validating a [`crate::config::CanvasConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse canvas config JSON: {0}")]
    Parse(String),

    #[error("Node type '{0}' has no layout in the registry")]
    UnknownNodeKind(String),

    #[error("Connector '{connector_id}' is not defined for node type '{kind}'")]
    UnknownConnector { kind: String, connector_id: String },

    #[error("Pairing {from} -> {to} must connect an output to an input")]
    DirectionMismatch { from: String, to: String },

    #[error("Zoom range is invalid: min={min}, initial={initial}, max={max}")]
    InvalidZoomRange { min: f64, initial: f64, max: f64 },

    #[error("Node type '{kind}' has a non-positive dimension ({width}x{height})")]
    InvalidDimension { kind: String, width: f64, height: f64 },
}
