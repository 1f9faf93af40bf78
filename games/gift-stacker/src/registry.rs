//! Bookkeeping for the bodies of one round: the platform, the ground
//! sensor, the held box and every box dropped so far.

use glam::Vec2;
use rand::Rng;
use stack_engine::*;

use crate::config::Layout;

const BOX_FRICTION: f32 = 0.8;
const BOX_DENSITY: f32 = 0.005;
/// Random sizes vary each side by up to this fraction.
const SIZE_JITTER: f32 = 0.15;

/// Size and bounce of the next box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSpec {
    pub size: Vec2,
    pub bounce: f32,
}

impl BoxSpec {
    pub fn fixed(box_size: f32, bounce: f32) -> Self {
        Self {
            size: Vec2::splat(box_size),
            bounce,
        }
    }

    /// Width and height vary independently by ±15%; bounce is drawn from
    /// `[0, bounce]`.
    pub fn random(box_size: f32, bounce: f32, rng: &mut impl Rng) -> Self {
        let lo = 1.0 - SIZE_JITTER;
        let hi = 1.0 + SIZE_JITTER;
        let w = box_size * rng.random_range(lo..=hi);
        let h = box_size * rng.random_range(lo..=hi);
        let bounce = if bounce > 0.0 {
            rng.random_range(0.0..=bounce)
        } else {
            0.0
        };
        Self {
            size: Vec2::new(w, h),
            bounce,
        }
    }
}

/// Game-side state of a box. Position and velocity live in the physics world.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxEntity {
    pub id: EntityId,
    pub half_extents: Vec2,
    pub bounce: f32,
    /// Landed on the platform or another box, and not lost since.
    pub has_scored: bool,
    /// Set once when the box leaves the screen; never cleared.
    pub lost_life: bool,
}

impl BoxEntity {
    fn new(id: EntityId, spec: &BoxSpec) -> Self {
        Self {
            id,
            half_extents: spec.size * 0.5,
            bounce: spec.bounce,
            has_scored: false,
            lost_life: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    platform: Option<EntityId>,
    ground: Option<EntityId>,
    /// Append-only within a round.
    dropped: Vec<BoxEntity>,
    pending: Option<BoxEntity>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the platform and the ground sensor for a new round.
    pub fn build_round(&mut self, ctx: &mut EngineContext, layout: &Layout) -> Result<(), EngineError> {
        let size = layout.platform_size();
        let id = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(id).with_kind(BodyKind::Platform).with_size(size),
            BodyDesc::fixed(size * 0.5).with_position(layout.platform_center()),
            ColliderMaterial {
                restitution: 0.0,
                friction: 1.0,
                density: 1.0,
            },
        )?;
        self.platform = Some(id);

        let size = layout.ground_size();
        let id = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(id).with_kind(BodyKind::Ground).with_size(size),
            BodyDesc::fixed(size * 0.5)
                .with_position(layout.ground_center())
                .with_sensor(true),
            ColliderMaterial::default(),
        )?;
        self.ground = Some(id);
        Ok(())
    }

    /// Create the held box, static at `pos`.
    pub fn spawn_pending(
        &mut self,
        ctx: &mut EngineContext,
        spec: &BoxSpec,
        pos: Vec2,
    ) -> Result<EntityId, EngineError> {
        let id = ctx.next_id();
        ctx.spawn_with_body(
            Entity::new(id).with_kind(BodyKind::Box).with_size(spec.size),
            BodyDesc::fixed(spec.size * 0.5)
                .with_position(pos)
                .with_ccd(true),
            ColliderMaterial {
                restitution: spec.bounce,
                friction: BOX_FRICTION,
                density: BOX_DENSITY,
            },
        )?;
        self.pending = Some(BoxEntity::new(id, spec));
        Ok(id)
    }

    /// Release the held box: it turns dynamic and joins the dropped list.
    /// Returns `None` when nothing is held.
    pub fn drop_pending(&mut self, ctx: &mut EngineContext) -> Result<Option<EntityId>, EngineError> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        let id = pending.id;
        if let Err(err) = ctx.set_static(id, false) {
            self.pending = Some(pending);
            return Err(err);
        }
        self.dropped.push(pending);
        Ok(Some(id))
    }

    /// Forget every body and clear the physics world.
    pub fn reset_round(&mut self, ctx: &mut EngineContext) {
        ctx.clear_world();
        self.platform = None;
        self.ground = None;
        self.dropped.clear();
        self.pending = None;
    }

    pub fn platform(&self) -> Option<EntityId> {
        self.platform
    }

    pub fn ground(&self) -> Option<EntityId> {
        self.ground
    }

    pub fn pending(&self) -> Option<&BoxEntity> {
        self.pending.as_ref()
    }

    pub fn dropped(&self) -> &[BoxEntity] {
        &self.dropped
    }

    pub fn dropped_mut(&mut self) -> &mut [BoxEntity] {
        &mut self.dropped
    }

    pub fn is_platform(&self, id: EntityId) -> bool {
        self.platform == Some(id)
    }

    /// Held or dropped box.
    pub fn is_box(&self, id: EntityId) -> bool {
        self.pending.as_ref().is_some_and(|b| b.id == id) || self.dropped.iter().any(|b| b.id == id)
    }

    /// A dropped (dynamic) box by id.
    pub fn dropped_box_mut(&mut self, id: EntityId) -> Option<&mut BoxEntity> {
        self.dropped.iter_mut().find(|b| b.id == id)
    }

    pub fn scored_count(&self) -> u32 {
        self.dropped.iter().filter(|b| b.has_scored).count() as u32
    }
}
