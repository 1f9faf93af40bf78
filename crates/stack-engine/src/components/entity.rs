use glam::Vec2;
use crate::api::types::EntityId;
use crate::core::physics::PhysicsBody;

/// What an entity represents. Forwarded to the renderer so the host can
/// pick a look for each body without knowing game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    #[default]
    Box,
    Platform,
    Ground,
}

impl BodyKind {
    /// Wire value written into the render buffer.
    pub fn as_f32(self) -> f32 {
        match self {
            BodyKind::Box => 0.0,
            BodyKind::Platform => 1.0,
            BodyKind::Ground => 2.0,
        }
    }
}

/// Fat Entity: one struct per rectangular body, mirrored from the physics
/// world once per frame.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    pub kind: BodyKind,
    /// Center position in world space (pixels, Y down).
    pub pos: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Full width and height in world units.
    pub size: Vec2,
    /// Held/fixed bodies are static; falling and settled boxes are not.
    pub is_static: bool,
    pub body: Option<PhysicsBody>,
}

impl Entity {
    /// Create a new entity with the given ID at the origin.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            kind: BodyKind::Box,
            pos: Vec2::ZERO,
            rotation: 0.0,
            size: Vec2::ONE,
            is_static: false,
            body: None,
        }
    }

    // -- Builder pattern --

    pub fn with_kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_body(mut self, body: PhysicsBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }
}
