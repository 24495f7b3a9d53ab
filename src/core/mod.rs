//! Core types describing physics entities, components, and shared math.

pub mod body;
pub mod fixture;
pub mod types;

pub use body::{BodyBuilder, BodyDef, BodyType, ContactEdge, JointEdge, RigidBody};
pub use fixture::{CollisionFilter, Fixture, FixtureDef, FixtureProxy, ProxyKey};
pub use types::{MassData, Position, Rot, Sweep, Transform, Velocity};
