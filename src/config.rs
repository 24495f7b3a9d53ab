//! Global tuning constants for the Kinetic2D engine.
//!
//! All lengths are expressed in meters ([`LENGTH_UNITS_PER_METER`] = 1.0);
//! scale the length-bearing constants if your game world uses a different
//! unit.

use std::f32::consts::PI;

/// Conversion factor between world length units and meters.
pub const LENGTH_UNITS_PER_METER: f32 = 1.0;

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -9.81];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Default number of velocity iterations performed per step.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 8;

/// Default number of position iterations performed per step.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 3;

/// Maximum number of contact points in a manifold.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum number of vertices on a convex polygon shape.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Amount a broad-phase AABB is fattened on each side.
pub const AABB_EXTENSION: f32 = 0.1 * LENGTH_UNITS_PER_METER;

/// Multiplier applied to a proxy displacement when predicting its fat AABB.
pub const AABB_MULTIPLIER: f32 = 4.0;

/// Collision/constraint tolerance; chosen to be numerically significant
/// but visually insignificant.
pub const LINEAR_SLOP: f32 = 0.005 * LENGTH_UNITS_PER_METER;

/// Angular analogue of [`LINEAR_SLOP`].
pub const ANGULAR_SLOP: f32 = 2.0 / 180.0 * PI;

/// Skin radius carried by every polygon shape. Keeps polygons from sitting
/// exactly on top of each other so warm starting stays effective.
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

/// Maximum number of continuous sub-steps per full step.
pub const MAX_SUB_STEPS: usize = 8;

/// Maximum number of contacts handled in a single TOI mini-island.
pub const MAX_TOI_CONTACTS: usize = 32;

/// Maximum linear position correction applied in one solver pass.
pub const MAX_LINEAR_CORRECTION: f32 = 0.2 * LENGTH_UNITS_PER_METER;

/// Maximum angular position correction applied in one solver pass.
pub const MAX_ANGULAR_CORRECTION: f32 = 8.0 / 180.0 * PI;

/// Maximum translation of a body during one step.
pub const MAX_TRANSLATION: f32 = 2.0 * LENGTH_UNITS_PER_METER;
pub const MAX_TRANSLATION_SQUARED: f32 = MAX_TRANSLATION * MAX_TRANSLATION;

/// Maximum rotation of a body during one step.
pub const MAX_ROTATION: f32 = 0.5 * PI;
pub const MAX_ROTATION_SQUARED: f32 = MAX_ROTATION * MAX_ROTATION;

/// Fraction of positional error resolved per discrete position iteration.
pub const BAUMGARTE: f32 = 0.2;

/// Fraction of positional error resolved per TOI position iteration.
pub const TOI_BAUMGARTE: f32 = 0.75;

/// Default relative-velocity threshold (m/s) below which restitution is
/// ignored for a contact.
pub const DEFAULT_RESTITUTION_THRESHOLD: f32 = 1.0 * LENGTH_UNITS_PER_METER;

/// Time (seconds) a body must be still before it is put to sleep.
pub const TIME_TO_SLEEP: f32 = 0.5;

/// A body cannot sleep while its linear speed exceeds this.
pub const LINEAR_SLEEP_TOLERANCE: f32 = 0.01 * LENGTH_UNITS_PER_METER;

/// A body cannot sleep while its angular speed exceeds this.
pub const ANGULAR_SLEEP_TOLERANCE: f32 = 2.0 / 180.0 * PI;

/// Structural identity of the engine; not a wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

/// Engine version reported by [`crate::PhysicsWorld::version`].
pub const VERSION: Version = Version {
    major: 2,
    minor: 4,
    revision: 0,
};
