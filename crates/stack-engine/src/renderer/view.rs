use glam::Vec2;

/// Camera transform applied to the whole scene when drawing.
///
/// Maps world to screen as `screen_y = zoom * y + offset_y` and
/// `screen_x = zoom * (x - w/2) + w/2`, so zooming keeps the horizontal
/// center of the viewport fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub offset_y: f32,
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        offset_y: 0.0,
    };

    pub fn new(zoom: f32, offset_y: f32) -> Self {
        Self { zoom, offset_y }
    }

    /// Project a world point onto the screen of a viewport `viewport_width` wide.
    pub fn to_screen(&self, world: Vec2, viewport_width: f32) -> Vec2 {
        let cx = viewport_width * 0.5;
        Vec2::new(
            self.zoom * (world.x - cx) + cx,
            self.zoom * world.y + self.offset_y,
        )
    }

    /// Inverse of [`ViewTransform::to_screen`].
    pub fn to_world(&self, screen: Vec2, viewport_width: f32) -> Vec2 {
        let cx = viewport_width * 0.5;
        Vec2::new(
            (screen.x - cx) / self.zoom + cx,
            (screen.y - self.offset_y) / self.zoom,
        )
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_noop() {
        let p = Vec2::new(123.0, 456.0);
        assert_eq!(ViewTransform::IDENTITY.to_screen(p, 800.0), p);
    }

    #[test]
    fn zoom_keeps_horizontal_center() {
        let view = ViewTransform::new(0.5, 100.0);
        let center = view.to_screen(Vec2::new(400.0, 0.0), 800.0);
        assert_eq!(center, Vec2::new(400.0, 100.0));
        let right = view.to_screen(Vec2::new(800.0, 200.0), 800.0);
        assert_eq!(right, Vec2::new(600.0, 200.0));
    }

    #[test]
    fn to_world_inverts_to_screen() {
        let view = ViewTransform::new(0.4, -35.0);
        let world = Vec2::new(90.0, -640.0);
        let back = view.to_world(view.to_screen(world, 600.0), 600.0);
        assert!((back - world).length() < 1e-3);
    }
}
