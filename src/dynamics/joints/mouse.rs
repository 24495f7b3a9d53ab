//! Soft drag constraint pulling an anchor on body B toward a moving world
//! target; body A is a ground reference.

use glam::{Mat2, Vec2};

use crate::{
    core::{
        body::RigidBody,
        types::{cross_sv, cross_vv, Rot},
    },
    dynamics::SolverData,
    utils::allocator::{Arena, EntityId},
};

#[derive(Debug, Clone)]
pub struct MouseJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    /// World target the anchor is dragged toward.
    pub target: Vec2,
    /// Anchor on body B, in body-local coordinates.
    pub local_anchor_b: Vec2,
    pub max_force: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub collide_connected: bool,
}

#[derive(Debug, Clone)]
pub struct MouseJoint {
    pub(crate) body_a: EntityId,
    pub(crate) body_b: EntityId,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,

    pub target: Vec2,
    pub local_anchor_b: Vec2,
    pub max_force: f32,
    pub stiffness: f32,
    pub damping: f32,

    // Solver state.
    impulse: Vec2,
    beta: f32,
    gamma: f32,
    index_b: usize,
    r_b: Vec2,
    local_center_b: Vec2,
    inv_mass_b: f32,
    inv_i_b: f32,
    mass: Mat2,
    c: Vec2,
}

impl MouseJoint {
    pub fn new(def: &MouseJointDef) -> Self {
        debug_assert!(def.target.is_finite());
        debug_assert!(def.max_force >= 0.0);
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            island_flag: false,
            target: def.target,
            local_anchor_b: def.local_anchor_b,
            max_force: def.max_force,
            stiffness: def.stiffness,
            damping: def.damping,
            impulse: Vec2::ZERO,
            beta: 0.0,
            gamma: 0.0,
            index_b: 0,
            r_b: Vec2::ZERO,
            local_center_b: Vec2::ZERO,
            inv_mass_b: 0.0,
            inv_i_b: 0.0,
            mass: Mat2::ZERO,
            c: Vec2::ZERO,
        }
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * self.impulse
    }

    pub fn reaction_torque(&self, _inv_dt: f32) -> f32 {
        0.0
    }

    pub fn init_velocity_constraints(&mut self, bodies: &Arena<RigidBody>, data: &mut SolverData) {
        let body_b = bodies.get(self.body_b).expect("joint body missing");

        self.index_b = body_b.island_index;
        self.local_center_b = body_b.local_center();
        self.inv_mass_b = body_b.inv_mass;
        self.inv_i_b = body_b.inv_inertia;

        let c_b = data.positions[self.index_b].c;
        let a_b = data.positions[self.index_b].a;
        let mut v_b = data.velocities[self.index_b].linear;
        let mut w_b = data.velocities[self.index_b].angular;

        let q_b = Rot::new(a_b);

        let d = self.damping;
        let k = self.stiffness;
        let h = data.step.dt;

        self.gamma = h * (d + h * k);
        if self.gamma != 0.0 {
            self.gamma = 1.0 / self.gamma;
        }
        self.beta = h * k * self.gamma;

        self.r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

        // K = invMass·I + invI·[rB×]ᵀ[rB×] + gamma·I
        let m_b = self.inv_mass_b;
        let i_b = self.inv_i_b;
        let k11 = m_b + i_b * self.r_b.y * self.r_b.y + self.gamma;
        let k12 = -i_b * self.r_b.x * self.r_b.y;
        let k22 = m_b + i_b * self.r_b.x * self.r_b.x + self.gamma;
        self.mass = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22)).inverse();

        self.c = (c_b + self.r_b - self.target) * self.beta;

        // Extra damping keeps the dragged body from orbiting the target.
        w_b *= 0.98;

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;
            v_b += m_b * self.impulse;
            w_b += i_b * cross_vv(self.r_b, self.impulse);
        } else {
            self.impulse = Vec2::ZERO;
        }

        data.velocities[self.index_b].linear = v_b;
        data.velocities[self.index_b].angular = w_b;
    }

    pub fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let mut v_b = data.velocities[self.index_b].linear;
        let mut w_b = data.velocities[self.index_b].angular;

        let c_dot = v_b + cross_sv(w_b, self.r_b);
        let mut impulse = self.mass * (-(c_dot + self.c + self.gamma * self.impulse));

        let old_impulse = self.impulse;
        self.impulse += impulse;
        let max_impulse = data.step.dt * self.max_force;
        if self.impulse.length_squared() > max_impulse * max_impulse {
            self.impulse *= max_impulse / self.impulse.length();
        }
        impulse = self.impulse - old_impulse;

        v_b += self.inv_mass_b * impulse;
        w_b += self.inv_i_b * cross_vv(self.r_b, impulse);

        data.velocities[self.index_b].linear = v_b;
        data.velocities[self.index_b].angular = w_b;
    }

    pub fn solve_position_constraints(&mut self, _data: &mut SolverData) -> bool {
        true
    }
}
