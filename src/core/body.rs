use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::types::{Rot, Sweep, Transform},
    utils::allocator::EntityId,
};

/// Simulation role of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves, infinite mass, collides with dynamic bodies only.
    #[default]
    Static,
    /// Moves under user-set velocity, infinite mass, ignores forces.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Immutable construction parameters for a rigid body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub allow_sleep: bool,
    pub awake: bool,
    pub fixed_rotation: bool,
    pub bullet: bool,
    pub enabled: bool,
    pub gravity_scale: f32,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            body_type: BodyType::Static,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            allow_sleep: true,
            awake: true,
            fixed_rotation: false,
            bullet: false,
            enabled: true,
            gravity_scale: 1.0,
        }
    }
}

impl BodyDef {
    pub fn builder() -> BodyBuilder {
        BodyBuilder::default()
    }
}

/// Fluent builder over [`BodyDef`].
#[derive(Debug, Default, Clone)]
pub struct BodyBuilder {
    def: BodyDef,
}

impl BodyBuilder {
    pub fn body_type(mut self, body_type: BodyType) -> Self {
        self.def.body_type = body_type;
        self
    }

    pub fn position(mut self, position: Vec2) -> Self {
        self.def.position = position;
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.def.angle = angle;
        self
    }

    pub fn linear_velocity(mut self, velocity: Vec2) -> Self {
        self.def.linear_velocity = velocity;
        self
    }

    pub fn angular_velocity(mut self, velocity: f32) -> Self {
        self.def.angular_velocity = velocity;
        self
    }

    pub fn damping(mut self, linear: f32, angular: f32) -> Self {
        self.def.linear_damping = linear;
        self.def.angular_damping = angular;
        self
    }

    pub fn fixed_rotation(mut self, fixed: bool) -> Self {
        self.def.fixed_rotation = fixed;
        self
    }

    pub fn bullet(mut self, bullet: bool) -> Self {
        self.def.bullet = bullet;
        self
    }

    pub fn allow_sleep(mut self, allow: bool) -> Self {
        self.def.allow_sleep = allow;
        self
    }

    pub fn gravity_scale(mut self, scale: f32) -> Self {
        self.def.gravity_scale = scale;
        self
    }

    pub fn build(self) -> BodyDef {
        self.def
    }
}

/// Relation record linking a body to one of its contacts. The body owns
/// the record, never the contact.
#[derive(Debug, Clone, Copy)]
pub struct ContactEdge {
    pub contact: EntityId,
    pub other: EntityId,
}

/// Relation record linking a body to one of its joints.
#[derive(Debug, Clone, Copy)]
pub struct JointEdge {
    pub joint: EntityId,
    pub other: EntityId,
}

/// Rigid body state. Owned by the world's body arena; fixtures, contact
/// edges, and joint edges are kept as stable arena ids.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub transform: Transform,
    pub sweep: Sweep,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub force: Vec2,
    pub torque: f32,

    pub mass: f32,
    pub inv_mass: f32,
    /// Rotational inertia about the center of mass.
    pub inertia: f32,
    pub inv_inertia: f32,

    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub sleep_time: f32,

    pub(crate) island_flag: bool,
    awake: bool,
    pub auto_sleep: bool,
    pub bullet: bool,
    pub fixed_rotation: bool,
    pub enabled: bool,
    pub(crate) toi_flag: bool,
    pub(crate) island_index: usize,

    pub(crate) fixtures: Vec<EntityId>,
    pub(crate) contact_edges: Vec<ContactEdge>,
    pub(crate) joint_edges: Vec<JointEdge>,
}

impl RigidBody {
    pub fn from_def(def: &BodyDef) -> Self {
        debug_assert!(def.position.is_finite());
        debug_assert!(def.angle.is_finite());
        debug_assert!(def.linear_velocity.is_finite());

        let transform = Transform::new(def.position, def.angle);
        let sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: transform.p,
            c: transform.p,
            a0: def.angle,
            a: def.angle,
            alpha0: 0.0,
        };

        let (mass, inv_mass) = match def.body_type {
            BodyType::Dynamic => (1.0, 1.0),
            _ => (0.0, 0.0),
        };

        Self {
            body_type: def.body_type,
            transform,
            sweep,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            force: Vec2::ZERO,
            torque: 0.0,
            mass,
            inv_mass,
            inertia: 0.0,
            inv_inertia: 0.0,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            gravity_scale: def.gravity_scale,
            sleep_time: 0.0,
            island_flag: false,
            awake: def.awake && def.body_type != BodyType::Static,
            auto_sleep: def.allow_sleep,
            bullet: def.bullet,
            fixed_rotation: def.fixed_rotation,
            enabled: def.enabled,
            toi_flag: false,
            island_index: 0,
            fixtures: Vec::new(),
            contact_edges: Vec::new(),
            joint_edges: Vec::new(),
        }
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    /// Wakes or sleeps the body. Static bodies are never awake; sleeping
    /// zeroes velocities and accumulated forces.
    pub fn set_awake(&mut self, awake: bool) {
        if self.body_type == BodyType::Static {
            return;
        }
        if awake {
            self.awake = true;
            self.sleep_time = 0.0;
        } else {
            self.awake = false;
            self.sleep_time = 0.0;
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.force = Vec2::ZERO;
            self.torque = 0.0;
        }
    }

    /// Raises the awake flag without resetting the sleep timer; used by
    /// the island flood fill so resting stacks can still fall asleep.
    pub(crate) fn set_awake_flag(&mut self) {
        if self.body_type != BodyType::Static {
            self.awake = true;
        }
    }

    pub fn world_center(&self) -> Vec2 {
        self.sweep.c
    }

    pub fn local_center(&self) -> Vec2 {
        self.sweep.local_center
    }

    pub fn world_point(&self, local_point: Vec2) -> Vec2 {
        self.transform.apply(local_point)
    }

    pub fn local_point(&self, world_point: Vec2) -> Vec2 {
        self.transform.apply_inv(world_point)
    }

    pub fn world_vector(&self, local_vector: Vec2) -> Vec2 {
        self.transform.q.apply(local_vector)
    }

    pub fn local_vector(&self, world_vector: Vec2) -> Vec2 {
        self.transform.q.apply_inv(world_vector)
    }

    /// Velocity of a world-space point attached to the body.
    pub fn linear_velocity_at(&self, world_point: Vec2) -> Vec2 {
        let r = world_point - self.sweep.c;
        self.linear_velocity + self.angular_velocity * Vec2::new(-r.y, r.x)
    }

    pub fn apply_force(&mut self, force: Vec2, point: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        // Forces applied to sleeping bodies evaporate.
        if self.awake {
            self.force += force;
            let r = point - self.sweep.c;
            self.torque += r.x * force.y - r.y * force.x;
        }
    }

    pub fn apply_force_to_center(&mut self, force: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.force += force;
        }
    }

    pub fn apply_torque(&mut self, torque: f32, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.torque += torque;
        }
    }

    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.linear_velocity += self.inv_mass * impulse;
            let r = point - self.sweep.c;
            self.angular_velocity += self.inv_inertia * (r.x * impulse.y - r.y * impulse.x);
        }
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.angular_velocity += self.inv_inertia * impulse;
        }
    }

    /// Writes mass properties computed from the fixtures. The world calls
    /// this after fixture changes; dynamic bodies get a fallback mass of
    /// one so they never become unmovable by accident.
    pub(crate) fn set_mass_properties(&mut self, mass: f32, center: Vec2, inertia: f32) {
        match self.body_type {
            BodyType::Static | BodyType::Kinematic => {
                self.mass = 0.0;
                self.inv_mass = 0.0;
                self.inertia = 0.0;
                self.inv_inertia = 0.0;
                self.sweep.local_center = Vec2::ZERO;
                self.sweep.c0 = self.transform.p;
                self.sweep.c = self.transform.p;
                self.sweep.a0 = self.sweep.a;
                return;
            }
            BodyType::Dynamic => {}
        }

        self.mass = mass;
        if self.mass <= 0.0 {
            self.mass = 1.0;
        }
        self.inv_mass = 1.0 / self.mass;

        if inertia > 0.0 && !self.fixed_rotation {
            // Shift inertia from the local origin to the center of mass.
            self.inertia = inertia - self.mass * center.length_squared();
            debug_assert!(self.inertia > 0.0);
            self.inv_inertia = 1.0 / self.inertia;
        } else {
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
        }

        // Preserve the velocity of the center of mass across the shift.
        let old_center = self.sweep.c;
        self.sweep.local_center = center;
        self.sweep.c = self.transform.apply(center);
        self.sweep.c0 = self.sweep.c;

        let d = self.sweep.c - old_center;
        self.linear_velocity += self.angular_velocity * Vec2::new(-d.y, d.x);
    }

    /// Rebuilds the transform from the end-of-sweep state.
    pub(crate) fn synchronize_transform(&mut self) {
        self.transform.q = Rot::new(self.sweep.a);
        self.transform.p = self.sweep.c - self.transform.q.apply(self.sweep.local_center);
    }

    /// Advances the body sweep to `alpha` and syncs the transform; used by
    /// the TOI stepper.
    pub(crate) fn advance(&mut self, alpha: f32) {
        self.sweep.advance(alpha);
        self.sweep.c = self.sweep.c0;
        self.sweep.a = self.sweep.a0;
        self.synchronize_transform();
    }

    /// Sets position and angle directly (outside the solver), refreshing
    /// the sweep to a resting state at the new pose.
    pub(crate) fn set_pose(&mut self, position: Vec2, angle: f32) {
        self.transform = Transform::new(position, angle);
        self.sweep.c = self.transform.apply(self.sweep.local_center);
        self.sweep.a = angle;
        self.sweep.c0 = self.sweep.c;
        self.sweep.a0 = angle;
    }

    pub fn fixture_ids(&self) -> &[EntityId] {
        &self.fixtures
    }

    pub fn contact_edges(&self) -> &[ContactEdge] {
        &self.contact_edges
    }

    pub fn joint_edges(&self) -> &[JointEdge] {
        &self.joint_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dynamic_body() -> RigidBody {
        RigidBody::from_def(
            &BodyDef::builder()
                .body_type(BodyType::Dynamic)
                .position(Vec2::new(1.0, 2.0))
                .build(),
        )
    }

    #[test]
    fn static_bodies_ignore_forces_and_impulses() {
        let mut body = RigidBody::from_def(&BodyDef::default());
        body.apply_force_to_center(Vec2::new(10.0, 0.0), true);
        body.apply_linear_impulse(Vec2::new(10.0, 0.0), Vec2::ZERO, true);
        assert_eq!(body.force, Vec2::ZERO);
        assert_eq!(body.linear_velocity, Vec2::ZERO);
        assert!(!body.is_awake());
    }

    #[test]
    fn sleep_clears_velocities() {
        let mut body = dynamic_body();
        body.linear_velocity = Vec2::new(1.0, 0.0);
        body.angular_velocity = 2.0;
        body.set_awake(false);
        assert_eq!(body.linear_velocity, Vec2::ZERO);
        assert_eq!(body.angular_velocity, 0.0);
    }

    #[test]
    fn offset_center_shifts_inertia_to_com() {
        let mut body = dynamic_body();
        // Unit mass at an offset of (1, 0), inertia about origin = 1.5.
        body.set_mass_properties(1.0, Vec2::new(1.0, 0.0), 1.5);
        assert_relative_eq!(body.inertia, 0.5, epsilon = 1e-6);
        assert_relative_eq!(body.sweep.local_center.x, 1.0, epsilon = 1e-6);
        // World center reflects the body transform.
        assert_relative_eq!(body.sweep.c.x, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn point_velocity_includes_rotation() {
        let mut body = dynamic_body();
        body.set_mass_properties(1.0, Vec2::ZERO, 1.0);
        body.angular_velocity = 2.0;
        let v = body.linear_velocity_at(body.world_center() + Vec2::new(1.0, 0.0));
        assert_relative_eq!(v.y, 2.0, epsilon = 1e-6);
    }
}
