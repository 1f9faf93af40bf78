//! Keeps the spawner above the stack and zooms out as the stack grows.

use stack_engine::ViewTransform;

use crate::config::Layout;

/// Spawner height on an empty stack.
pub const INITIAL_SPAWN_Y: f32 = 100.0;
/// Clearance kept between the spawner and the top of the stack.
pub const MIN_GAP: f32 = 250.0;
/// Room shown above the spawner.
pub const TOP_PADDING: f32 = 60.0;
/// Room shown below the platform.
pub const BOTTOM_MARGIN: f32 = 20.0;
/// Fraction of the remaining distance covered each frame.
pub const SMOOTHING: f32 = 0.08;
pub const MIN_ZOOM: f32 = 0.3;
pub const MAX_ZOOM: f32 = 1.0;
/// Stacks shorter than this many box sizes never zoom out.
pub const SHORT_STACK_BOXES: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraController {
    spawner_y: f32,
    zoom: f32,
    offset_y: f32,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            spawner_y: INITIAL_SPAWN_Y,
            zoom: MAX_ZOOM,
            offset_y: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance one frame.
    ///
    /// `stack_top` is the smallest top-edge y among settled boxes, or `None`
    /// on an empty stack (the platform surface is used instead).
    pub fn update(&mut self, stack_top: Option<f32>, layout: &Layout) -> ViewTransform {
        let h = layout.height;
        let surface = layout.platform_surface();
        let top = stack_top.unwrap_or(surface).min(surface);

        let target_y = INITIAL_SPAWN_Y.min(top - MIN_GAP);
        self.spawner_y += (target_y - self.spawner_y) * SMOOTHING;

        let span_top = self.spawner_y - TOP_PADDING;
        let span_bottom = h - BOTTOM_MARGIN;
        let span = (span_bottom - span_top).max(1.0);

        let short_stack = surface - top < SHORT_STACK_BOXES * layout.box_size;
        let target_zoom = if short_stack {
            MAX_ZOOM
        } else {
            (h / span).clamp(MIN_ZOOM, MAX_ZOOM)
        };
        self.zoom = (self.zoom + (target_zoom - self.zoom) * SMOOTHING).clamp(MIN_ZOOM, MAX_ZOOM);

        let target_offset = if short_stack && self.zoom >= MAX_ZOOM - 1e-3 {
            0.0
        } else {
            h / 2.0 - self.zoom * (span_top + span_bottom) / 2.0
        };
        self.offset_y += (target_offset - self.offset_y) * SMOOTHING;

        self.view()
    }

    pub fn view(&self) -> ViewTransform {
        ViewTransform::new(self.zoom, self.offset_y)
    }

    pub fn spawner_y(&self) -> f32 {
        self.spawner_y
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}
