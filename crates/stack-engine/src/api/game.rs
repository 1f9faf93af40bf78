use glam::Vec2;

use crate::api::types::{EntityId, GameEvent, SoundEvent};
use crate::components::entity::Entity;
use crate::core::physics::{
    BodyDesc, BodyState, BodyType, ColliderMaterial, CollisionPair, PhysicsBody, PhysicsWorld,
};
use crate::core::scene::Scene;
use crate::core::time::FrameClock;
use crate::error::EngineError;
use crate::input::queue::InputQueue;
use crate::renderer::view::ViewTransform;
use crate::storage::{KeyValueStore, MemoryStore};

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Viewport width in pixels.
    pub world_width: f32,
    /// Viewport height in pixels.
    pub world_height: f32,
    /// Gravity vector for the physics simulation, px/s². Positive Y is down.
    pub gravity: Vec2,
    /// Maximum number of render instances (default: 256).
    pub max_instances: usize,
    /// Maximum number of sound events per frame (default: 32).
    pub max_sounds: usize,
    /// Maximum number of game events per frame (default: 32).
    pub max_events: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: 800.0,
            world_height: 600.0,
            gravity: Vec2::ZERO,
            max_instances: 256,
            max_sounds: 32,
            max_events: 32,
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Load persisted state and set up the initial screen.
    fn init(&mut self, ctx: &mut EngineContext);

    /// One display frame. `ctx.delta_ms()` holds the time since the last frame.
    ///
    /// An error aborts the rest of this frame only; the runner logs it and
    /// calls `update` again on the next tick.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) -> Result<(), EngineError>;

    /// Handle a text message from the host. Returns an optional reply.
    fn receive(&mut self, _ctx: &mut EngineContext, _channel: &str, _payload: &str) -> Option<String> {
        None
    }

    /// Camera transform for the frame just updated.
    fn view(&self) -> ViewTransform {
        ViewTransform::IDENTITY
    }
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub scene: Scene,
    pub physics: PhysicsWorld,
    pub sounds: Vec<SoundEvent>,
    pub events: Vec<GameEvent>,
    store: Box<dyn KeyValueStore>,
    clock: FrameClock,
    sound_enabled: bool,
    next_id: u32,
    collision_events: Vec<CollisionPair>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::with_gravity(Vec2::ZERO)
    }

    /// Create an EngineContext with a custom gravity vector.
    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            scene: Scene::new(),
            physics: PhysicsWorld::new(gravity),
            sounds: Vec::new(),
            events: Vec::new(),
            store: Box::new(MemoryStore::new()),
            clock: FrameClock::new(),
            sound_enabled: true,
            next_id: 1,
            collision_events: Vec::new(),
        }
    }

    /// Replace the persistence backend.
    pub fn with_store(mut self, store: Box<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Emit a sound cue to be forwarded to the host. Dropped while sound is off.
    pub fn emit_sound(&mut self, event: SoundEvent) {
        if self.sound_enabled {
            self.sounds.push(event);
        }
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Emit a game event to be forwarded to the host.
    pub fn emit_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Clear per-frame transient data (sounds, events, collision events).
    pub fn clear_frame_data(&mut self) {
        self.sounds.clear();
        self.events.clear();
        self.collision_events.clear();
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    // -- Frame clock --

    /// Record the host timestamp for this frame and return the delta in ms.
    pub fn advance_clock(&mut self, now_ms: f64) -> f32 {
        self.clock.advance(now_ms)
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn delta_ms(&self) -> f32 {
        self.clock.delta_ms()
    }

    // -- Physics convenience methods --

    /// Spawn an entity with a physics body. Position, rotation and the static
    /// flag are taken from the BodyDesc.
    pub fn spawn_with_body(
        &mut self,
        entity: Entity,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> Result<EntityId, EngineError> {
        let id = entity.id;
        let body = self.physics.create_body(id, &desc, material)?;
        let entity = entity
            .with_pos(desc.position)
            .with_rotation(desc.rotation)
            .with_static(desc.body_type == BodyType::Fixed)
            .with_body(body);
        self.scene.spawn(entity);
        Ok(id)
    }

    /// Remove every entity and every physics body.
    pub fn clear_world(&mut self) {
        self.scene.clear();
        self.physics.remove_all();
        self.collision_events.clear();
    }

    /// Switch an entity's body between fixed and dynamic.
    pub fn set_static(&mut self, id: EntityId, is_static: bool) -> Result<(), EngineError> {
        let body = self.body_of(id)?;
        self.physics.set_static(&body, is_static)?;
        if let Some(entity) = self.scene.get_mut(id) {
            entity.is_static = is_static;
        }
        Ok(())
    }

    /// Teleport an entity's body.
    pub fn set_position(&mut self, id: EntityId, pos: Vec2) -> Result<(), EngineError> {
        let body = self.body_of(id)?;
        self.physics.set_position(&body, pos)?;
        if let Some(entity) = self.scene.get_mut(id) {
            entity.pos = pos;
        }
        Ok(())
    }

    /// Set the linear velocity of an entity's physics body.
    pub fn set_velocity(&mut self, id: EntityId, vel: Vec2) -> Result<(), EngineError> {
        let body = self.body_of(id)?;
        self.physics.set_velocity(&body, vel)?;
        Ok(())
    }

    /// Latest simulated state of an entity's body.
    pub fn body_state(&self, id: EntityId) -> Option<BodyState> {
        let body = self.scene.get(id)?.body?;
        self.physics.body_state(&body)
    }

    /// Collision events from the most recent physics step.
    pub fn collisions(&self) -> &[CollisionPair] {
        &self.collision_events
    }

    /// Step the simulation by `delta_ms` (clamped by the physics world).
    pub fn step_physics(&mut self, delta_ms: f32) -> Result<(), EngineError> {
        self.collision_events.clear();
        self.physics.step(delta_ms, &mut self.collision_events)?;
        Ok(())
    }

    /// Copy position, angle and static flag of every body into its entity.
    /// Called by the runner once per frame, paused or not.
    pub fn sync_bodies(&mut self) {
        for entity in self.scene.iter_mut() {
            let Some(body) = &entity.body else { continue };
            if let Some(state) = self.physics.body_state(body) {
                entity.pos = state.position;
                entity.rotation = state.angle;
                entity.is_static = state.is_static;
            }
        }
    }

    fn body_of(&self, id: EntityId) -> Result<PhysicsBody, EngineError> {
        self.scene
            .get(id)
            .and_then(|e| e.body)
            .ok_or(EngineError::MissingEntity(id))
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhysicsError;

    fn spawn_box(ctx: &mut EngineContext, pos: Vec2, fixed: bool) -> EntityId {
        let id = ctx.next_id();
        let half = Vec2::splat(10.0);
        let desc = if fixed { BodyDesc::fixed(half) } else { BodyDesc::dynamic(half) };
        ctx.spawn_with_body(
            Entity::new(id).with_size(half * 2.0),
            desc.with_position(pos),
            ColliderMaterial::default(),
        )
        .unwrap()
    }

    #[test]
    fn spawn_with_body_creates_entity_and_physics() {
        let mut ctx = EngineContext::new();
        let id = spawn_box(&mut ctx, Vec2::new(100.0, 200.0), true);

        assert_eq!(ctx.scene.len(), 1);
        assert_eq!(ctx.physics.body_count(), 1);
        let entity = ctx.scene.get(id).unwrap();
        assert!(entity.body.is_some());
        assert!(entity.is_static);
        assert_eq!(entity.pos, Vec2::new(100.0, 200.0));
    }

    #[test]
    fn clear_world_removes_everything() {
        let mut ctx = EngineContext::new();
        spawn_box(&mut ctx, Vec2::ZERO, false);
        spawn_box(&mut ctx, Vec2::ONE, true);
        ctx.clear_world();
        assert!(ctx.scene.is_empty());
        assert_eq!(ctx.physics.body_count(), 0);
    }

    #[test]
    fn step_then_sync_moves_entities() {
        let mut ctx = EngineContext::with_gravity(Vec2::new(0.0, 1000.0));
        let id = spawn_box(&mut ctx, Vec2::new(100.0, 0.0), false);

        for _ in 0..10 {
            ctx.step_physics(16.0).unwrap();
        }
        ctx.sync_bodies();

        let entity = ctx.scene.get(id).unwrap();
        assert!(entity.pos.y > 0.0, "Entity should have moved down: y={}", entity.pos.y);
    }

    #[test]
    fn set_static_updates_entity_flag() {
        let mut ctx = EngineContext::with_gravity(Vec2::new(0.0, 1000.0));
        let id = spawn_box(&mut ctx, Vec2::ZERO, true);
        ctx.set_static(id, false).unwrap();
        assert!(!ctx.scene.get(id).unwrap().is_static);
        assert!(!ctx.body_state(id).unwrap().is_static);
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let mut ctx = EngineContext::new();
        assert_eq!(
            ctx.set_position(EntityId(42), Vec2::ZERO),
            Err(EngineError::MissingEntity(EntityId(42)))
        );
    }

    #[test]
    fn bad_step_surfaces_physics_error() {
        let mut ctx = EngineContext::new();
        assert!(matches!(
            ctx.step_physics(f32::INFINITY),
            Err(EngineError::Physics(PhysicsError::InvalidStep(_)))
        ));
    }

    #[test]
    fn sound_toggle_suppresses_cues() {
        let mut ctx = EngineContext::new();
        ctx.emit_sound(SoundEvent(1));
        ctx.set_sound_enabled(false);
        ctx.emit_sound(SoundEvent(2));
        assert_eq!(ctx.sounds, vec![SoundEvent(1)]);
        ctx.clear_frame_data();
        assert!(ctx.sounds.is_empty());
    }

    #[test]
    fn clock_reports_delta() {
        let mut ctx = EngineContext::new();
        assert_eq!(ctx.advance_clock(1000.0), 0.0);
        assert_eq!(ctx.advance_clock(1020.0), 20.0);
        assert_eq!(ctx.delta_ms(), 20.0);
        assert_eq!(ctx.now_ms(), 1020.0);
    }
}
