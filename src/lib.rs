//! Kinetic2D – a 2D rigid-body physics engine for Rust.
//!
//! This crate exposes a modular engine built around a broad-phase dynamic
//! AABB tree, GJK narrow-phase collision with continuous time-of-impact
//! support, an island-based Sequential Impulses constraint solver with
//! warm starting, and ten joint types.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod utils;
pub mod world;

pub use glam::{Mat2, Vec2};

pub use collision::{
    broadphase::{BroadPhase, DynamicTree},
    contact::{Contact, ContactFilter, ContactImpulse, ContactListener, DestructionListener},
    queries::{Aabb, RayCastInput, RayCastOutput, RaycastHit, RaycastQuery},
    shapes::{Chain, Circle, Edge, Polygon, Shape},
    Manifold, ManifoldKind, WorldManifold,
};
pub use config::{Version, VERSION};
pub use crate::core::{
    body::{BodyBuilder, BodyDef, BodyType, RigidBody},
    fixture::{CollisionFilter, Fixture, FixtureDef},
    types::{MassData, Rot, Sweep, Transform, Velocity},
};
pub use dynamics::{
    joints::{
        DistanceJointDef, FrictionJointDef, GearJointDef, Joint, JointDef, MotorJointDef,
        MouseJointDef, PrismaticJointDef, PulleyJointDef, RevoluteJointDef, WeldJointDef,
        WheelJointDef,
    },
    TimeStep,
};
pub use utils::allocator::{Arena, EntityId};
pub use world::PhysicsWorld;

use config::{DEFAULT_POSITION_ITERATIONS, DEFAULT_VELOCITY_ITERATIONS};

/// High-level convenience wrapper that owns a [`PhysicsWorld`] and steps
/// it with the default iteration counts.
pub struct PhysicsEngine {
    world: PhysicsWorld,
}

impl PhysicsEngine {
    /// Creates a new engine with the provided gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            world: PhysicsWorld::new(gravity),
        }
    }

    /// Adds a rigid body to the world and returns its [`EntityId`].
    pub fn add_body(&mut self, def: &BodyDef) -> EntityId {
        self.world.create_body(def)
    }

    /// Attaches a fixture to a body and returns its [`EntityId`].
    pub fn add_fixture(&mut self, body: EntityId, def: &FixtureDef) -> EntityId {
        self.world.create_fixture(body, def)
    }

    /// Advances the simulation by the provided delta time.
    pub fn step(&mut self, dt: f32) {
        self.world
            .step(dt, DEFAULT_VELOCITY_ITERATIONS, DEFAULT_POSITION_ITERATIONS);
    }

    /// Immutable access to a rigid body by id.
    pub fn get_body(&self, id: EntityId) -> Option<&RigidBody> {
        self.world.body(id)
    }

    /// Mutable access to a rigid body by id.
    pub fn get_body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        self.world.body_mut(id)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }
}
