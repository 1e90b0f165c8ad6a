//! Canvas interaction engine for an agent workflow builder.
//!
//! Node placement, drag-to-move, connector-based edge drawing with validation,
//! viewport pan/zoom and auto-layout.  The core is plain Rust driven through
//! [`reducers::canvas::update`]; [`dom`] wires it to a browser host.

// Export convenience macros crate-wide
#[macro_use]
mod macros;

pub mod callbacks;
pub mod canvas;
pub mod config;
pub mod constants;
pub mod error;
pub mod graph;
pub mod messages;
pub mod models;
pub mod node_builder;
pub mod reducers;
pub mod session;
pub mod state;

#[cfg(target_arch = "wasm32")]
pub mod dom;

// Cross-module scenario tests
#[cfg(test)]
mod tests;

pub use callbacks::{dispatch, CanvasCallbacks};
pub use canvas::hit::{HitTarget, Marker};
pub use canvas::renderer::{render, Scene};
pub use config::CanvasConfig;
pub use error::{CanvasError, ConfigError, RejectionReason};
pub use messages::{CanvasEvent, Message};
pub use models::{Connection, ConnectorRef, Node, NodeData, NodeKind, Position, WorkflowSnapshot};
pub use node_builder::{NodeBuilder, NodeSpec};
pub use reducers::canvas::update;
pub use state::CanvasState;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    // Initialize better panic messages
    console_error_panic_hook::set_once();
}
