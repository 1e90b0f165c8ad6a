//! Viewport transform, zoom stepping and the pan session.
//!
//! Screen points are page coordinates as reported by pointer events.  The
//! canvas element's top-left corner sits at `origin` on screen, so:
//!
//! ```text
//! canvas = (screen - origin) / zoom + scroll
//! screen = (canvas - scroll) * zoom + origin
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ZoomConfig;
use crate::models::Position;

/// `(screen - origin) / zoom`: the zoom-only part of the transform.
pub fn to_canvas_space(screen: Position, origin: Position, zoom: f64) -> Position {
    (screen - origin).scale(1.0 / zoom)
}

/// Round to two decimals, then clamp into `[min, max]`.
pub fn clamp_zoom(zoom: f64, limits: &ZoomConfig) -> f64 {
    let rounded = (zoom * 100.0).round() / 100.0;
    rounded.clamp(limits.min, limits.max)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub zoom: f64,
    pub scroll: Position,
    /// Screen position of the canvas element's top-left corner.
    #[serde(default)]
    pub origin: Position,
}

impl Viewport {
    pub fn new(limits: &ZoomConfig) -> Self {
        Self {
            zoom: clamp_zoom(limits.initial, limits),
            scroll: Position::default(),
            origin: Position::default(),
        }
    }

    pub fn to_canvas(&self, screen: Position) -> Position {
        to_canvas_space(screen, self.origin, self.zoom) + self.scroll
    }

    /// Screen position relative to the canvas element (what the renderer
    /// emits, the host adds its own offset).
    pub fn to_local_screen(&self, canvas: Position) -> Position {
        (canvas - self.scroll).scale(self.zoom)
    }

    pub fn to_screen(&self, canvas: Position) -> Position {
        self.to_local_screen(canvas) + self.origin
    }

    /// Returns `true` when the zoom level actually changed.
    pub fn zoom_in(&mut self, limits: &ZoomConfig) -> bool {
        self.set_zoom(self.zoom + limits.step, limits)
    }

    pub fn zoom_out(&mut self, limits: &ZoomConfig) -> bool {
        self.set_zoom(self.zoom - limits.step, limits)
    }

    pub fn set_zoom(&mut self, requested: f64, limits: &ZoomConfig) -> bool {
        let next = clamp_zoom(requested, limits);
        let changed = next != self.zoom;
        self.zoom = next;
        changed
    }

    /// Step the zoom while keeping the canvas point under `screen` fixed.
    pub fn zoom_about(&mut self, zoom_in: bool, screen: Position, limits: &ZoomConfig) -> bool {
        let anchor = self.to_canvas(screen);
        let changed = if zoom_in { self.zoom_in(limits) } else { self.zoom_out(limits) };
        if changed {
            self.scroll = anchor - to_canvas_space(screen, self.origin, self.zoom);
        }
        changed
    }
}

/// Active pan: pointer and scroll captured at pointer-down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanSession {
    pub pointer_start: Position,
    pub scroll_start: Position,
}

impl PanSession {
    pub fn start(screen: Position, viewport: &Viewport) -> Self {
        Self {
            pointer_start: screen,
            scroll_start: viewport.scroll,
        }
    }

    /// `scrollStart - (pointerCurrent - pointerStart) / zoom`
    pub fn scroll_for(&self, screen: Position, zoom: f64) -> Position {
        self.scroll_start - (screen - self.pointer_start).scale(1.0 / zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn screen_and_canvas_round_trip() {
        let limits = ZoomConfig::default();
        let mut vp = Viewport::new(&limits);
        vp.zoom = 2.0;
        vp.scroll = Position::new(100.0, -40.0);
        vp.origin = Position::new(10.0, 20.0);
        let canvas = vp.to_canvas(Position::new(210.0, 220.0));
        assert_eq!(canvas, Position::new(200.0, 60.0));
        assert_eq!(vp.to_screen(canvas), Position::new(210.0, 220.0));
    }

    #[test]
    fn zoom_steps_land_on_exact_values() {
        let limits = ZoomConfig::default();
        let mut vp = Viewport::new(&limits);
        for _ in 0..3 {
            vp.zoom_in(&limits);
        }
        assert_eq!(vp.zoom, 1.3);
        for _ in 0..30 {
            vp.zoom_out(&limits);
        }
        assert_eq!(vp.zoom, limits.min);
        assert!(!vp.zoom_out(&limits));
    }

    #[test]
    fn pan_divides_pointer_travel_by_zoom() {
        let limits = ZoomConfig::default();
        let mut vp = Viewport::new(&limits);
        vp.zoom = 2.0;
        vp.scroll = Position::new(50.0, 50.0);
        let pan = PanSession::start(Position::new(300.0, 300.0), &vp);
        assert_eq!(pan.scroll_for(Position::new(340.0, 280.0), vp.zoom), Position::new(30.0, 60.0));
    }

    #[test]
    fn wheel_zoom_keeps_pointer_anchor() {
        let limits = ZoomConfig::default();
        let mut vp = Viewport::new(&limits);
        vp.origin = Position::new(30.0, 30.0);
        let pointer = Position::new(430.0, 230.0);
        let before = vp.to_canvas(pointer);
        assert!(vp.zoom_about(true, pointer, &limits));
        let after = vp.to_canvas(pointer);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn zoom_stays_within_limits(steps in proptest::collection::vec(any::<bool>(), 0..64)) {
            let limits = ZoomConfig::default();
            let mut vp = Viewport::new(&limits);
            for step_in in steps {
                if step_in { vp.zoom_in(&limits); } else { vp.zoom_out(&limits); }
                prop_assert!(vp.zoom >= limits.min && vp.zoom <= limits.max);
            }
        }
    }
}
