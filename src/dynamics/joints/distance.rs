//! Point-to-point distance constraint with optional softness and length
//! limits. With zero stiffness and equal limits it behaves as a rigid rod;
//! with stiffness/damping it is a damped spring inside the limit range.

use glam::Vec2;

use crate::{
    config::LINEAR_SLOP,
    core::{
        body::RigidBody,
        types::{cross_sv, cross_vv, Rot},
    },
    dynamics::SolverData,
    utils::allocator::{Arena, EntityId},
};

#[derive(Debug, Clone)]
pub struct DistanceJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    pub min_length: f32,
    pub max_length: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub collide_connected: bool,
}

impl DistanceJointDef {
    /// Rigid rod between two world anchor points.
    pub fn new(
        body_a: EntityId,
        body_b: EntityId,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        length: f32,
    ) -> Self {
        let length = length.max(LINEAR_SLOP);
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            length,
            min_length: length,
            max_length: length,
            stiffness: 0.0,
            damping: 0.0,
            collide_connected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DistanceJoint {
    pub(crate) body_a: EntityId,
    pub(crate) body_b: EntityId,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,

    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    pub min_length: f32,
    pub max_length: f32,
    pub stiffness: f32,
    pub damping: f32,

    // Solver state.
    impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,
    gamma: f32,
    bias: f32,
    index_a: usize,
    index_b: usize,
    u: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    local_center_a: Vec2,
    local_center_b: Vec2,
    current_length: f32,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    soft_mass: f32,
    mass: f32,
}

impl DistanceJoint {
    pub fn new(def: &DistanceJointDef) -> Self {
        debug_assert!(def.min_length <= def.max_length);
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            island_flag: false,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            length: def.length.max(LINEAR_SLOP),
            min_length: def.min_length.max(LINEAR_SLOP),
            max_length: def.max_length.max(def.min_length),
            stiffness: def.stiffness,
            damping: def.damping,
            impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
            gamma: 0.0,
            bias: 0.0,
            index_a: 0,
            index_b: 0,
            u: Vec2::ZERO,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            local_center_a: Vec2::ZERO,
            local_center_b: Vec2::ZERO,
            current_length: 0.0,
            inv_mass_a: 0.0,
            inv_mass_b: 0.0,
            inv_i_a: 0.0,
            inv_i_b: 0.0,
            soft_mass: 0.0,
            mass: 0.0,
        }
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * (self.impulse + self.lower_impulse - self.upper_impulse) * self.u
    }

    pub fn reaction_torque(&self, _inv_dt: f32) -> f32 {
        0.0
    }

    pub fn init_velocity_constraints(&mut self, bodies: &Arena<RigidBody>, data: &mut SolverData) {
        let body_a = bodies.get(self.body_a).expect("joint body missing");
        let body_b = bodies.get(self.body_b).expect("joint body missing");

        self.index_a = body_a.island_index;
        self.index_b = body_b.island_index;
        self.local_center_a = body_a.local_center();
        self.local_center_b = body_b.local_center();
        self.inv_mass_a = body_a.inv_mass;
        self.inv_mass_b = body_b.inv_mass;
        self.inv_i_a = body_a.inv_inertia;
        self.inv_i_b = body_b.inv_inertia;

        let c_a = data.positions[self.index_a].c;
        let a_a = data.positions[self.index_a].a;
        let mut v_a = data.velocities[self.index_a].linear;
        let mut w_a = data.velocities[self.index_a].angular;

        let c_b = data.positions[self.index_b].c;
        let a_b = data.positions[self.index_b].a;
        let mut v_b = data.velocities[self.index_b].linear;
        let mut w_b = data.velocities[self.index_b].angular;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);

        self.r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        self.r_b = q_b.apply(self.local_anchor_b - self.local_center_b);
        self.u = c_b + self.r_b - c_a - self.r_a;

        self.current_length = self.u.length();
        if self.current_length > LINEAR_SLOP {
            self.u *= 1.0 / self.current_length;
        } else {
            self.u = Vec2::ZERO;
            self.mass = 0.0;
            self.impulse = 0.0;
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }

        let cr_a = cross_vv(self.r_a, self.u);
        let cr_b = cross_vv(self.r_b, self.u);
        let mut inv_mass = self.inv_mass_a
            + self.inv_i_a * cr_a * cr_a
            + self.inv_mass_b
            + self.inv_i_b * cr_b * cr_b;
        self.mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };

        if self.stiffness > 0.0 && self.min_length < self.max_length {
            // Soft spring between the limits.
            let c = self.current_length - self.length;
            let d = self.damping;
            let k = self.stiffness;
            let h = data.step.dt;

            self.gamma = h * (d + h * k);
            self.gamma = if self.gamma != 0.0 { 1.0 / self.gamma } else { 0.0 };
            self.bias = c * h * k * self.gamma;

            inv_mass += self.gamma;
            self.soft_mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };
        } else {
            self.gamma = 0.0;
            self.bias = 0.0;
            self.soft_mass = self.mass;
        }

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;
            self.lower_impulse *= data.step.dt_ratio;
            self.upper_impulse *= data.step.dt_ratio;

            let p = (self.impulse + self.lower_impulse - self.upper_impulse) * self.u;
            v_a -= self.inv_mass_a * p;
            w_a -= self.inv_i_a * cross_vv(self.r_a, p);
            v_b += self.inv_mass_b * p;
            w_b += self.inv_i_b * cross_vv(self.r_b, p);
        } else {
            self.impulse = 0.0;
        }

        data.velocities[self.index_a].linear = v_a;
        data.velocities[self.index_a].angular = w_a;
        data.velocities[self.index_b].linear = v_b;
        data.velocities[self.index_b].angular = w_b;
    }

    pub fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let mut v_a = data.velocities[self.index_a].linear;
        let mut w_a = data.velocities[self.index_a].angular;
        let mut v_b = data.velocities[self.index_b].linear;
        let mut w_b = data.velocities[self.index_b].angular;

        if self.min_length < self.max_length {
            if self.stiffness > 0.0 {
                let vp_a = v_a + cross_sv(w_a, self.r_a);
                let vp_b = v_b + cross_sv(w_b, self.r_b);
                let c_dot = self.u.dot(vp_b - vp_a);

                let impulse = -self.soft_mass * (c_dot + self.bias + self.gamma * self.impulse);
                self.impulse += impulse;

                let p = impulse * self.u;
                v_a -= self.inv_mass_a * p;
                w_a -= self.inv_i_a * cross_vv(self.r_a, p);
                v_b += self.inv_mass_b * p;
                w_b += self.inv_i_b * cross_vv(self.r_b, p);
            }

            // Lower limit.
            {
                let c = self.current_length - self.min_length;
                let bias = c.max(0.0) * data.step.inv_dt;

                let vp_a = v_a + cross_sv(w_a, self.r_a);
                let vp_b = v_b + cross_sv(w_b, self.r_b);
                let c_dot = self.u.dot(vp_b - vp_a);

                let mut impulse = -self.mass * (c_dot + bias);
                let old_impulse = self.lower_impulse;
                self.lower_impulse = (self.lower_impulse + impulse).max(0.0);
                impulse = self.lower_impulse - old_impulse;
                let p = impulse * self.u;

                v_a -= self.inv_mass_a * p;
                w_a -= self.inv_i_a * cross_vv(self.r_a, p);
                v_b += self.inv_mass_b * p;
                w_b += self.inv_i_b * cross_vv(self.r_b, p);
            }

            // Upper limit.
            {
                let c = self.max_length - self.current_length;
                let bias = c.max(0.0) * data.step.inv_dt;

                let vp_a = v_a + cross_sv(w_a, self.r_a);
                let vp_b = v_b + cross_sv(w_b, self.r_b);
                let c_dot = self.u.dot(vp_a - vp_b);

                let mut impulse = -self.mass * (c_dot + bias);
                let old_impulse = self.upper_impulse;
                self.upper_impulse = (self.upper_impulse + impulse).max(0.0);
                impulse = self.upper_impulse - old_impulse;
                let p = -impulse * self.u;

                v_a -= self.inv_mass_a * p;
                w_a -= self.inv_i_a * cross_vv(self.r_a, p);
                v_b += self.inv_mass_b * p;
                w_b += self.inv_i_b * cross_vv(self.r_b, p);
            }
        } else {
            // Rigid rod.
            let vp_a = v_a + cross_sv(w_a, self.r_a);
            let vp_b = v_b + cross_sv(w_b, self.r_b);
            let c_dot = self.u.dot(vp_b - vp_a);

            let impulse = -self.mass * c_dot;
            self.impulse += impulse;

            let p = impulse * self.u;
            v_a -= self.inv_mass_a * p;
            w_a -= self.inv_i_a * cross_vv(self.r_a, p);
            v_b += self.inv_mass_b * p;
            w_b += self.inv_i_b * cross_vv(self.r_b, p);
        }

        data.velocities[self.index_a].linear = v_a;
        data.velocities[self.index_a].angular = w_a;
        data.velocities[self.index_b].linear = v_b;
        data.velocities[self.index_b].angular = w_b;
    }

    pub fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        let mut c_a = data.positions[self.index_a].c;
        let mut a_a = data.positions[self.index_a].a;
        let mut c_b = data.positions[self.index_b].c;
        let mut a_b = data.positions[self.index_b].a;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);

        let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);
        let mut u = c_b + r_b - c_a - r_a;

        let length = u.length();
        u = u.normalize_or_zero();
        let c = if self.min_length == self.max_length {
            length - self.min_length
        } else if length < self.min_length {
            length - self.min_length
        } else if self.max_length < length {
            length - self.max_length
        } else {
            return true;
        };

        let impulse = -self.mass * c;
        let p = impulse * u;

        c_a -= self.inv_mass_a * p;
        a_a -= self.inv_i_a * cross_vv(r_a, p);
        c_b += self.inv_mass_b * p;
        a_b += self.inv_i_b * cross_vv(r_b, p);

        data.positions[self.index_a].c = c_a;
        data.positions[self.index_a].a = a_a;
        data.positions[self.index_b].c = c_b;
        data.positions[self.index_b].a = a_b;

        c.abs() < LINEAR_SLOP
    }
}
