//! Constants for the canvas engine
//!
//! This module centralizes commonly used string literals and layout numbers
//! to prevent typos and enable safe refactoring across the codebase.

// Connector ids
pub const CONNECTOR_INPUT_TRIGGER: &str = "input-trigger";
pub const CONNECTOR_OUTPUT_MAIN: &str = "output-main";
pub const CONNECTOR_CHAT_MODEL: &str = "chat-model";
pub const CONNECTOR_MEMORY: &str = "memory";
pub const CONNECTOR_TOOL: &str = "tool";
pub const CONNECTOR_INPUT: &str = "input";
pub const CONNECTOR_OUTPUT: &str = "output";

// DOM marker attributes (hit-testing)
pub const ATTR_NODE_ID: &str = "data-node-id";
pub const ATTR_CONNECTOR_ID: &str = "data-connector-id";
pub const ATTR_INTERACTIVE: &str = "data-interactive";

// Node dimensions
pub const AGENT_NODE_WIDTH: f64 = 256.0;
pub const AGENT_NODE_HEIGHT: f64 = 120.0;
pub const COMPANION_NODE_WIDTH: f64 = 160.0;
pub const COMPANION_NODE_HEIGHT: f64 = 64.0;
pub const TRIGGER_NODE_WIDTH: f64 = 180.0;
pub const TRIGGER_NODE_HEIGHT: f64 = 72.0;
/// Distance below an agent's bottom edge of its auxiliary connectors.
pub const AUX_CONNECTOR_OFFSET: f64 = 10.0;

// Viewport
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_ZOOM: f64 = 1.0;

// Grid / auto-layout
pub const GRID_CELL_WIDTH: f64 = 320.0;
pub const GRID_CELL_HEIGHT: f64 = 280.0;
pub const GRID_ORIGIN_X: f64 = 40.0;
pub const GRID_ORIGIN_Y: f64 = 40.0;
pub const COMPANION_GAP: f64 = 60.0;
pub const COMPANION_SPACING: f64 = 24.0;
pub const DEFAULT_CONTAINER_WIDTH: f64 = 1280.0;
/// Spacing of the background grid lines, canvas units.
pub const BACKGROUND_GRID_SPACING: f64 = 20.0;

// Interaction
pub const CONNECTOR_HIT_RADIUS: f64 = 8.0;
pub const CLICK_THRESHOLD: f64 = 5.0;

// Canvas colors
pub const CANVAS_BACKGROUND_COLOR: &str = "#33334a";
pub const GRID_LINE_COLOR: &str = "rgba(255, 255, 255, 0.06)";
pub const CONNECTION_LINE_COLOR: &str = "#95a5a6";
pub const RUBBER_BAND_COLOR: &str = "#3498db";

// Connection colors by semantic type
pub const EDGE_COLOR_TRIGGER: &str = "#10b981";
pub const EDGE_COLOR_AGENT_CHAIN: &str = "#6366f1";
pub const EDGE_COLOR_MODEL: &str = "#f59e0b";
pub const EDGE_COLOR_TOOL: &str = "#8b5cf6";

// Default labels
pub const DEFAULT_AGENT_NAME: &str = "AI Agent";
pub const DEFAULT_CHAT_MODEL_NAME: &str = "Chat Model";
pub const DEFAULT_CHAT_TRIGGER_NAME: &str = "When chat message received";
pub const DEFAULT_MESSAGING_TRIGGER_NAME: &str = "On new message";
pub const DEFAULT_MODEL_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

// Rendering
/// Rough glyph width used to fit node labels inside their boxes.
pub const LABEL_CHAR_WIDTH: f64 = 8.0;
pub const LABEL_PADDING: f64 = 16.0;
