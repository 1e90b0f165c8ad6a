pub mod drag;
pub mod edge_draw;
pub mod geometry;
pub mod hit;
pub mod layout;
pub mod renderer;
pub mod viewport;
