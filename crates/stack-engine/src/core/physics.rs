use glam::Vec2;
use rapier2d::prelude::*;
use std::sync::Mutex;

use crate::api::types::EntityId;
use crate::error::PhysicsError;

/// Largest simulated slice per step. Longer frames (tab switches, GC hitches)
/// are truncated rather than integrated in one go.
pub const MAX_STEP_MS: f32 = 50.0;

// ---------------------------------------------------------------------------
// Conversion helpers between glam and rapier math
// ---------------------------------------------------------------------------

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn iso_to_pos_rot(iso: &Isometry<Real>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    (pos, iso.rotation.angle())
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// Builder for describing a rectangular rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub half_extents: Vec2,
    pub gravity_scale: f32,
    /// Sensors report overlaps but never push other bodies.
    pub sensor: bool,
    pub ccd: bool,
}

impl BodyDesc {
    /// Dynamic box with the given half extents.
    pub fn dynamic(half_extents: Vec2) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            rotation: 0.0,
            half_extents,
            gravity_scale: 1.0,
            sensor: false,
            ccd: false,
        }
    }

    /// Fixed (static) box with the given half extents.
    ///
    /// Gravity scale stays at 1.0 so a fixed body later released with
    /// [`PhysicsWorld::set_static`] falls like any other dynamic body.
    pub fn fixed(half_extents: Vec2) -> Self {
        Self {
            body_type: BodyType::Fixed,
            ..Self::dynamic(half_extents)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }
}

/// Handle pair stored on an Entity, referencing Rapier internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// A collision event between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    /// `true` when the collision just started, `false` when it ended.
    pub started: bool,
    /// `true` when either collider is a sensor.
    pub sensor: bool,
}

impl CollisionPair {
    /// The pair in both orders, for rules written from one body's point of view.
    pub fn both_ways(&self) -> [(EntityId, EntityId); 2] {
        [(self.entity_a, self.entity_b), (self.entity_b, self.entity_a)]
    }
}

/// Read-only view of a body after the latest step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub entity: EntityId,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub is_static: bool,
}

// ---------------------------------------------------------------------------
// WASM-safe event collector (no crossbeam)
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        match self.collisions.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.collisions.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single struct.
/// Units are pixels and milliseconds at the API surface; Y points down.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// Positive Y is downward (e.g. `Vec2::new(0.0, 1400.0)` px/s²).
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = to_vector(gravity);
    }

    pub fn gravity(&self) -> Vec2 {
        from_vector(&self.gravity)
    }

    /// Create a rigid body + collider and return handles.
    /// The EntityId is stored in the body's `user_data` for collision lookups.
    pub fn create_body(
        &mut self,
        entity_id: EntityId,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> Result<PhysicsBody, PhysicsError> {
        if !desc.position.is_finite() || !desc.half_extents.is_finite() {
            return Err(PhysicsError::InvalidBody(entity_id));
        }
        if desc.half_extents.x <= 0.0 || desc.half_extents.y <= 0.0 {
            return Err(PhysicsError::InvalidBody(entity_id));
        }

        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(to_vector(desc.position))
            .rotation(desc.rotation)
            .gravity_scale(desc.gravity_scale)
            .ccd_enabled(desc.ccd)
            .user_data(entity_id.0 as u128)
            .build();

        let body_handle = self.bodies.insert(rb);

        let collider = ColliderBuilder::cuboid(desc.half_extents.x, desc.half_extents.y)
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .sensor(desc.sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        Ok(PhysicsBody {
            body_handle,
            collider_handle,
        })
    }

    /// Remove a body and all its colliders from the simulation.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Remove every body. Pending collision events are discarded too.
    pub fn remove_all(&mut self) {
        let handles: Vec<RigidBodyHandle> = self.bodies.iter().map(|(h, _)| h).collect();
        for handle in handles {
            self.bodies.remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
        self.event_collector.drain_collisions();
    }

    /// Advance the simulation by `delta_ms` (clamped to [`MAX_STEP_MS`]) and
    /// collect collision events into the provided Vec.
    pub fn step(
        &mut self,
        delta_ms: f32,
        collision_events: &mut Vec<CollisionPair>,
    ) -> Result<(), PhysicsError> {
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            return Err(PhysicsError::InvalidStep(delta_ms));
        }
        let clamped = delta_ms.min(MAX_STEP_MS);
        if clamped == 0.0 {
            return Ok(());
        }
        self.integration_parameters.dt = clamped / 1000.0;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        // Drain collision events and resolve entity IDs from user_data
        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };
            let sensor = event.sensor();

            let entity_a = self.collider_to_entity(h1);
            let entity_b = self.collider_to_entity(h2);

            if let (Some(a), Some(b)) = (entity_a, entity_b) {
                collision_events.push(CollisionPair {
                    entity_a: a,
                    entity_b: b,
                    started,
                    sensor,
                });
            }
        }
        Ok(())
    }

    /// Switch a body between fixed and dynamic.
    pub fn set_static(&mut self, body: &PhysicsBody, is_static: bool) -> Result<(), PhysicsError> {
        let rb = self.body_mut(body)?;
        let body_type = if is_static { BodyType::Fixed } else { BodyType::Dynamic };
        rb.set_body_type(body_type.to_rapier(), true);
        Ok(())
    }

    /// Teleport a body. Used every frame on the held box while it slides.
    pub fn set_position(&mut self, body: &PhysicsBody, pos: Vec2) -> Result<(), PhysicsError> {
        let rb = self.body_mut(body)?;
        rb.set_translation(to_vector(pos), true);
        Ok(())
    }

    /// Set the linear velocity of a body directly. Angular velocity is zeroed.
    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) -> Result<(), PhysicsError> {
        let rb = self.body_mut(body)?;
        rb.set_linvel(to_vector(vel), true);
        rb.set_angvel(0.0, true);
        Ok(())
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| from_vector(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Get the current position and rotation of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> (Vec2, f32) {
        self.bodies
            .get(body.body_handle)
            .map(|rb| iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    pub fn is_static(&self, body: &PhysicsBody) -> bool {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.is_fixed())
            .unwrap_or(true)
    }

    /// Snapshot of a single body.
    pub fn body_state(&self, body: &PhysicsBody) -> Option<BodyState> {
        let rb = self.bodies.get(body.body_handle)?;
        Some(Self::state_of(rb))
    }

    /// Snapshots of every body in the simulation.
    pub fn all_bodies(&self) -> impl Iterator<Item = BodyState> + '_ {
        self.bodies.iter().map(|(_, rb)| Self::state_of(rb))
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // -- private helpers --

    fn state_of(rb: &RigidBody) -> BodyState {
        let (position, angle) = iso_to_pos_rot(rb.position());
        BodyState {
            entity: EntityId(rb.user_data as u32),
            position,
            angle,
            velocity: from_vector(rb.linvel()),
            is_static: rb.is_fixed(),
        }
    }

    fn body_mut(&mut self, body: &PhysicsBody) -> Result<&mut RigidBody, PhysicsError> {
        self.bodies
            .get_mut(body.body_handle)
            .ok_or(PhysicsError::UnknownBody)
    }

    fn collider_to_entity(&self, collider_handle: ColliderHandle) -> Option<EntityId> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        Some(EntityId(body.user_data as u32))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const GRAVITY: Vec2 = Vec2::new(0.0, 1400.0);

    fn cube(half: f32) -> Vec2 {
        Vec2::splat(half)
    }

    #[test]
    fn create_and_remove_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world
            .create_body(EntityId(1), &BodyDesc::dynamic(cube(10.0)), ColliderMaterial::default())
            .unwrap();
        assert_eq!(world.body_count(), 1);
        world.remove_body(&body);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn degenerate_extents_are_rejected() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let result = world.create_body(
            EntityId(3),
            &BodyDesc::dynamic(Vec2::new(0.0, 10.0)),
            ColliderMaterial::default(),
        );
        assert_eq!(result, Err(PhysicsError::InvalidBody(EntityId(3))));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn remove_all_empties_world() {
        let mut world = PhysicsWorld::new(GRAVITY);
        for i in 0..5 {
            world
                .create_body(EntityId(i), &BodyDesc::dynamic(cube(5.0)), ColliderMaterial::default())
                .unwrap();
        }
        world.remove_all();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.all_bodies().count(), 0);
    }

    #[test]
    fn gravity_affects_dynamic_body() {
        let mut world = PhysicsWorld::new(GRAVITY);
        let body = world
            .create_body(EntityId(1), &BodyDesc::dynamic(cube(5.0)), ColliderMaterial::default())
            .unwrap();

        let (initial_pos, _) = world.body_position(&body);
        let mut events = Vec::new();
        for _ in 0..10 {
            world.step(16.0, &mut events).unwrap();
        }
        let (new_pos, _) = world.body_position(&body);

        // Positive Y = down
        assert!(
            new_pos.y > initial_pos.y,
            "Body should fall: start={}, end={}",
            initial_pos.y,
            new_pos.y
        );
    }

    #[test]
    fn fixed_body_does_not_move() {
        let mut world = PhysicsWorld::new(GRAVITY);
        let body = world
            .create_body(
                EntityId(1),
                &BodyDesc::fixed(Vec2::new(100.0, 10.0)).with_position(Vec2::new(0.0, 500.0)),
                ColliderMaterial::default(),
            )
            .unwrap();

        let mut events = Vec::new();
        for _ in 0..10 {
            world.step(16.0, &mut events).unwrap();
        }

        let (pos, _) = world.body_position(&body);
        assert!((pos.y - 500.0).abs() < 0.001, "Fixed body should not move: y={}", pos.y);
        assert!(world.is_static(&body));
    }

    #[test]
    fn released_fixed_body_starts_falling() {
        let mut world = PhysicsWorld::new(GRAVITY);
        let body = world
            .create_body(
                EntityId(1),
                &BodyDesc::fixed(cube(30.0)).with_position(Vec2::new(200.0, 100.0)),
                ColliderMaterial::default(),
            )
            .unwrap();

        world.set_static(&body, false).unwrap();
        assert!(!world.is_static(&body));

        let mut events = Vec::new();
        for _ in 0..10 {
            world.step(16.0, &mut events).unwrap();
        }
        let (pos, _) = world.body_position(&body);
        assert!(pos.y > 100.0, "released body should fall: y={}", pos.y);
    }

    #[test]
    fn set_position_moves_fixed_body() {
        let mut world = PhysicsWorld::new(GRAVITY);
        let body = world
            .create_body(EntityId(1), &BodyDesc::fixed(cube(30.0)), ColliderMaterial::default())
            .unwrap();

        world.set_position(&body, Vec2::new(320.0, 100.0)).unwrap();
        world.set_velocity(&body, Vec2::ZERO).unwrap();
        let (pos, _) = world.body_position(&body);
        assert!((pos.x - 320.0).abs() < 0.001);
        assert!((pos.y - 100.0).abs() < 0.001);
    }

    #[test]
    fn stale_handle_is_an_error() {
        let mut world = PhysicsWorld::new(GRAVITY);
        let body = world
            .create_body(EntityId(1), &BodyDesc::fixed(cube(30.0)), ColliderMaterial::default())
            .unwrap();
        world.remove_all();

        assert_eq!(world.set_static(&body, false), Err(PhysicsError::UnknownBody));
        assert_eq!(world.set_position(&body, Vec2::ONE), Err(PhysicsError::UnknownBody));
    }

    #[test]
    fn step_rejects_non_finite_delta() {
        let mut world = PhysicsWorld::new(GRAVITY);
        let mut events = Vec::new();
        assert!(matches!(
            world.step(f32::NAN, &mut events),
            Err(PhysicsError::InvalidStep(_))
        ));
        assert!(world.step(-1.0, &mut events).is_err());
        assert!(world.step(0.0, &mut events).is_ok());
    }

    #[test]
    fn long_frames_are_clamped() {
        // One 1000 ms frame must integrate exactly like one 50 ms frame.
        let mut clamped = PhysicsWorld::new(GRAVITY);
        let mut reference = PhysicsWorld::new(GRAVITY);
        let a = clamped
            .create_body(EntityId(1), &BodyDesc::dynamic(cube(5.0)), ColliderMaterial::default())
            .unwrap();
        let b = reference
            .create_body(EntityId(1), &BodyDesc::dynamic(cube(5.0)), ColliderMaterial::default())
            .unwrap();

        let mut events = Vec::new();
        clamped.step(1000.0, &mut events).unwrap();
        reference.step(MAX_STEP_MS, &mut events).unwrap();

        let (pa, _) = clamped.body_position(&a);
        let (pb, _) = reference.body_position(&b);
        assert!((pa.y - pb.y).abs() < 1e-4, "clamped={} reference={}", pa.y, pb.y);
    }

    #[test]
    fn falling_box_reports_collision_with_floor() {
        let mut world = PhysicsWorld::new(GRAVITY);
        world
            .create_body(
                EntityId(1),
                &BodyDesc::fixed(Vec2::new(200.0, 10.0)).with_position(Vec2::new(0.0, 300.0)),
                ColliderMaterial::default(),
            )
            .unwrap();
        world
            .create_body(
                EntityId(2),
                &BodyDesc::dynamic(cube(20.0)).with_position(Vec2::new(0.0, 200.0)),
                ColliderMaterial::default(),
            )
            .unwrap();

        let mut all_events = Vec::new();
        for _ in 0..120 {
            world.step(16.0, &mut all_events).unwrap();
        }

        let first = all_events
            .iter()
            .find(|e| e.started)
            .expect("Should have at least one collision start event");
        assert!(!first.sensor);
        let ids = [first.entity_a, first.entity_b];
        assert!(ids.contains(&EntityId(1)));
        assert!(ids.contains(&EntityId(2)));
    }

    #[test]
    fn sensor_overlap_is_flagged() {
        let mut world = PhysicsWorld::new(GRAVITY);
        world
            .create_body(
                EntityId(1),
                &BodyDesc::fixed(Vec2::new(200.0, 25.0))
                    .with_position(Vec2::new(0.0, 300.0))
                    .with_sensor(true),
                ColliderMaterial::default(),
            )
            .unwrap();
        let body = world
            .create_body(
                EntityId(2),
                &BodyDesc::dynamic(cube(20.0)).with_position(Vec2::new(0.0, 200.0)),
                ColliderMaterial::default(),
            )
            .unwrap();

        let mut events = Vec::new();
        for _ in 0..120 {
            world.step(16.0, &mut events).unwrap();
        }

        assert!(events.iter().all(|e| e.sensor));
        // Sensors never stop a body.
        let (pos, _) = world.body_position(&body);
        assert!(pos.y > 400.0, "box should pass through the sensor: y={}", pos.y);
    }

    #[test]
    fn all_bodies_reports_entity_and_static_flag() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world
            .create_body(
                EntityId(7),
                &BodyDesc::fixed(cube(5.0)).with_position(Vec2::new(10.0, 20.0)),
                ColliderMaterial::default(),
            )
            .unwrap();
        world
            .create_body(
                EntityId(8),
                &BodyDesc::dynamic(cube(5.0)).with_position(Vec2::new(30.0, 40.0)),
                ColliderMaterial::default(),
            )
            .unwrap();

        let mut states: Vec<BodyState> = world.all_bodies().collect();
        states.sort_by_key(|s| s.entity.0);
        assert_eq!(states[0].entity, EntityId(7));
        assert!(states[0].is_static);
        assert_eq!(states[0].position, Vec2::new(10.0, 20.0));
        assert_eq!(states[1].entity, EntityId(8));
        assert!(!states[1].is_static);
    }

    #[test]
    fn builder_pattern() {
        let desc = BodyDesc::fixed(cube(5.0))
            .with_position(Vec2::new(10.0, 20.0))
            .with_rotation(0.5)
            .with_gravity_scale(0.5)
            .with_sensor(true)
            .with_ccd(true);

        assert_eq!(desc.body_type, BodyType::Fixed);
        assert_eq!(desc.position, Vec2::new(10.0, 20.0));
        assert!((desc.gravity_scale - 0.5).abs() < 0.001);
        assert!(desc.sensor);
        assert!(desc.ccd);
    }

    #[test]
    fn both_ways_swaps_pair() {
        let pair = CollisionPair {
            entity_a: EntityId(1),
            entity_b: EntityId(2),
            started: true,
            sensor: false,
        };
        assert_eq!(
            pair.both_ways(),
            [(EntityId(1), EntityId(2)), (EntityId(2), EntityId(1))]
        );
    }
}
