use bytemuck::{Pod, Zeroable};

use crate::api::types::EntityId;
use crate::components::entity::{BodyKind, Entity};
use crate::renderer::view::ViewTransform;

/// Everything the view needs to draw one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub width: f32,
    pub height: f32,
    pub kind: BodyKind,
    pub is_static: bool,
}

impl From<&Entity> for BodyView {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            x: entity.pos.x,
            y: entity.pos.y,
            angle: entity.rotation,
            width: entity.size.x,
            height: entity.size.y,
            kind: entity.kind,
            is_static: entity.is_static,
        }
    }
}

/// Destination for per-frame body transforms and the camera transform.
pub trait RenderSink {
    /// Drop everything published for the previous frame.
    fn begin_frame(&mut self);

    fn publish(&mut self, body: BodyView);

    fn apply_view(&mut self, view: ViewTransform);
}

/// Per-body render data laid out for the host renderer.
/// Must match the host protocol: 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BodyInstance {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub width: f32,
    pub height: f32,
    /// [`BodyKind::as_f32`].
    pub kind: f32,
    /// 1.0 while static, 0.0 once dynamic.
    pub is_static: f32,
    pub id: f32,
}

impl BodyInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

impl From<BodyView> for BodyInstance {
    fn from(view: BodyView) -> Self {
        Self {
            x: view.x,
            y: view.y,
            angle: view.angle,
            width: view.width,
            height: view.height,
            kind: view.kind.as_f32(),
            is_static: if view.is_static { 1.0 } else { 0.0 },
            id: view.id.0 as f32,
        }
    }
}

/// Flat render buffer read by the host through raw pointers.
/// Bodies past `capacity` are dropped with a warning rather than growing
/// past the shared region the host allocated.
pub struct RenderBuffer {
    pub instances: Vec<BodyInstance>,
    pub view: ViewTransform,
    capacity: usize,
}

impl RenderBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            view: ViewTransform::IDENTITY,
            capacity,
        }
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Raw pointer to instance data for SharedArrayBuffer reads.
    pub fn instances_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }

    /// Camera transform as `[zoom, offset_y]`.
    pub fn view_floats(&self) -> [f32; 2] {
        [self.view.zoom, self.view.offset_y]
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl RenderSink for RenderBuffer {
    fn begin_frame(&mut self) {
        self.instances.clear();
    }

    fn publish(&mut self, body: BodyView) {
        if self.instances.len() >= self.capacity {
            log::warn!("render buffer full ({}), dropping body {:?}", self.capacity, body.id);
            return;
        }
        self.instances.push(body.into());
    }

    fn apply_view(&mut self, view: ViewTransform) {
        self.view = view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn body_instance_is_8_floats() {
        assert_eq!(std::mem::size_of::<BodyInstance>(), BodyInstance::STRIDE_BYTES);
    }

    #[test]
    fn publish_packs_entity() {
        let mut buf = RenderBuffer::with_capacity(4);
        let entity = Entity::new(EntityId(5))
            .with_kind(BodyKind::Platform)
            .with_pos(Vec2::new(400.0, 750.0))
            .with_size(Vec2::new(384.0, 20.0))
            .with_static(true);

        buf.begin_frame();
        buf.publish(BodyView::from(&entity));
        buf.apply_view(ViewTransform::new(0.5, 40.0));

        assert_eq!(buf.instance_count(), 1);
        let inst = buf.instances[0];
        assert_eq!((inst.x, inst.y), (400.0, 750.0));
        assert_eq!((inst.width, inst.height), (384.0, 20.0));
        assert_eq!(inst.kind, 1.0);
        assert_eq!(inst.is_static, 1.0);
        assert_eq!(inst.id, 5.0);
        assert_eq!(buf.view_floats(), [0.5, 40.0]);
    }

    #[test]
    fn capacity_is_respected() {
        let mut buf = RenderBuffer::with_capacity(2);
        buf.begin_frame();
        for i in 0..5 {
            buf.publish(BodyView::from(&Entity::new(EntityId(i))));
        }
        assert_eq!(buf.instance_count(), 2);
        buf.begin_frame();
        assert_eq!(buf.instance_count(), 0);
    }
}
