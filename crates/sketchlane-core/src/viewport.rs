//! Viewport: pan offset and zoom.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::interaction::input::{WheelEvent, WheelSource};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

/// Zoom change per wheel notch on a mouse.
const MOUSE_ZOOM_STEP: f64 = 1.1;

/// Exponential zoom speed for trackpad pinch deltas.
const PINCH_ZOOM_SPEED: f64 = 0.01;

/// Maps between screen and world coordinates.
///
/// `screen = world * zoom + pan`. Zoom is always kept within
/// [`MIN_ZOOM`, `MAX_ZOOM`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan: Vec2,
    zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(pan: Vec2, zoom: f64) -> Self {
        Self {
            pan,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Set pan and zoom together (zoom clamped).
    pub fn set(&mut self, pan: Vec2, zoom: f64) {
        self.pan = pan;
        self.set_zoom(zoom);
    }

    /// World to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Screen to world.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan)
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.transform() * world
    }

    /// Pan by a delta in screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Zoom by `factor`, keeping the world point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let new_zoom = clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let world = self.screen_to_world(screen);
        self.zoom = new_zoom;
        let moved = self.world_to_screen(world);
        self.pan += screen - moved;
    }

    /// Apply a wheel gesture.
    ///
    /// Trackpads report pinch as a ctrl-wheel and pan with two fingers.
    /// Mice zoom with ctrl/cmd-wheel, scroll vertically, and scroll
    /// horizontally with shift held.
    pub fn apply_wheel(&mut self, event: &WheelEvent) {
        let zoom_gesture = event.modifiers.ctrl || event.modifiers.meta;
        match (event.source, zoom_gesture) {
            (WheelSource::Trackpad, true) => {
                let factor = (-event.delta.y * PINCH_ZOOM_SPEED).exp();
                self.zoom_at(event.position, factor);
            }
            (WheelSource::Trackpad, false) => self.pan_by(-event.delta),
            (WheelSource::Mouse, true) => {
                let factor = if event.delta.y < 0.0 {
                    MOUSE_ZOOM_STEP
                } else {
                    1.0 / MOUSE_ZOOM_STEP
                };
                self.zoom_at(event.position, factor);
            }
            (WheelSource::Mouse, false) if event.modifiers.shift => {
                self.pan_by(Vec2::new(-event.delta.y, 0.0));
            }
            (WheelSource::Mouse, false) => self.pan_by(Vec2::new(-event.delta.x, -event.delta.y)),
        }
    }

    /// Frame `bounds` in a viewport of `size` with `padding` pixels around it.
    pub fn fit_to_bounds(&mut self, bounds: Rect, size: Size, padding: f64) {
        let usable = Size::new(
            (size.width - padding * 2.0).max(1.0),
            (size.height - padding * 2.0).max(1.0),
        );
        let zoom = if bounds.width() <= f64::EPSILON || bounds.height() <= f64::EPSILON {
            self.zoom
        } else {
            (usable.width / bounds.width()).min(usable.height / bounds.height())
        };
        self.center_on(bounds.center(), size, zoom);
    }

    /// Center a world point in a viewport of `size` at `zoom` (clamped).
    pub fn center_on(&mut self, world: Point, size: Size, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
        self.pan = Vec2::new(
            size.width / 2.0 - world.x * self.zoom,
            size.height / 2.0 - world.y * self.zoom,
        );
    }

    /// The world rectangle visible in a viewport of `size`.
    pub fn visible_world_rect(&self, size: Size) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(size.width, size.height)),
        )
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}
