//! Position-driven motor: steers body B toward a linear/angular offset
//! from body A using bounded forces, without hard constraints.

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
pub struct MotorJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    /// Target position of B relative to A, in A's frame.
    pub linear_offset: Vec2,
    /// Target angle of B relative to A.
    pub angular_offset: f32,
    pub max_force: f32,
    pub max_torque: f32,
    /// Position correction gain in `[0, 1]`.
    pub correction_factor: f32,
    pub collide_connected: bool,
}

impl MotorJointDef {
    pub fn new(body_a: EntityId, body_b: EntityId) -> Self {
        Self {
            body_a,
            body_b,
            linear_offset: Vec2::ZERO,
            angular_offset: 0.0,
            max_force: 1.0,
            max_torque: 1.0,
            correction_factor: 0.3,
            collide_connected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MotorJoint {
    pub(crate) body_a: EntityId,
    pub(crate) body_b: EntityId,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,

    pub linear_offset: Vec2,
    pub angular_offset: f32,
    pub max_force: f32,
    pub max_torque: f32,
    pub correction_factor: f32,

    // Solver state.
    linear_impulse: Vec2,
    angular_impulse: f32,
    index_a: usize,
    index_b: usize,
    r_a: Vec2,
    r_b: Vec2,
    local_center_a: Vec2,
    local_center_b: Vec2,
    linear_error: Vec2,
    angular_error: f32,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    linear_mass: Mat2,
    angular_mass: f32,
}

impl MotorJoint {
    pub fn new(def: &MotorJointDef) -> Self {
        debug_assert!((0.0..=1.0).contains(&def.correction_factor));
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            island_flag: false,
            linear_offset: def.linear_offset,
            angular_offset: def.angular_offset,
            max_force: def.max_force,
            max_torque: def.max_torque,
            correction_factor: def.correction_factor,
            linear_impulse: Vec2::ZERO,
            angular_impulse: 0.0,
            index_a: 0,
            index_b: 0,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            local_center_a: Vec2::ZERO,
            local_center_b: Vec2::ZERO,
            linear_error: Vec2::ZERO,
            angular_error: 0.0,
            inv_mass_a: 0.0,
            inv_mass_b: 0.0,
            inv_i_a: 0.0,
            inv_i_b: 0.0,
            linear_mass: Mat2::ZERO,
            angular_mass: 0.0,
        }
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * self.linear_impulse
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.angular_impulse
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

        self.r_a = q_a.apply(self.linear_offset - self.local_center_a);
        self.r_b = q_b.apply(-self.local_center_b);

        let m_a = self.inv_mass_a;
        let m_b = self.inv_mass_b;
        let i_a = self.inv_i_a;
        let i_b = self.inv_i_b;

        let k11 = m_a + m_b + i_a * self.r_a.y * self.r_a.y + i_b * self.r_b.y * self.r_b.y;
        let k12 = -i_a * self.r_a.x * self.r_a.y - i_b * self.r_b.x * self.r_b.y;
        let k22 = m_a + m_b + i_a * self.r_a.x * self.r_a.x + i_b * self.r_b.x * self.r_b.x;

        let k = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22));
        self.linear_mass = k.inverse();

        self.angular_mass = i_a + i_b;
        if self.angular_mass > 0.0 {
            self.angular_mass = 1.0 / self.angular_mass;
        }

        self.linear_error = c_b + self.r_b - c_a - self.r_a;
        self.angular_error = a_b - a_a - self.angular_offset;

        if data.step.warm_starting {
            self.linear_impulse *= data.step.dt_ratio;
            self.angular_impulse *= data.step.dt_ratio;

            let p = self.linear_impulse;
            v_a -= m_a * p;
            w_a -= i_a * (cross_vv(self.r_a, p) + self.angular_impulse);
            v_b += m_b * p;
            w_b += i_b * (cross_vv(self.r_b, p) + self.angular_impulse);
        } else {
            self.linear_impulse = Vec2::ZERO;
            self.angular_impulse = 0.0;
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

        let m_a = self.inv_mass_a;
        let m_b = self.inv_mass_b;
        let i_a = self.inv_i_a;
        let i_b = self.inv_i_b;

        let h = data.step.dt;
        let inv_h = data.step.inv_dt;

        // Angular channel.
        {
            let c_dot = w_b - w_a + inv_h * self.correction_factor * self.angular_error;
            let mut impulse = -self.angular_mass * c_dot;

            let old_impulse = self.angular_impulse;
            let max_impulse = h * self.max_torque;
            self.angular_impulse = (self.angular_impulse + impulse).clamp(-max_impulse, max_impulse);
            impulse = self.angular_impulse - old_impulse;

            w_a -= i_a * impulse;
            w_b += i_b * impulse;
        }

        // Linear channel.
        {
            let c_dot = v_b + cross_sv(w_b, self.r_b) - v_a - cross_sv(w_a, self.r_a)
                + inv_h * self.correction_factor * self.linear_error;

            let mut impulse = -(self.linear_mass * c_dot);
            let old_impulse = self.linear_impulse;
            self.linear_impulse += impulse;

            let max_impulse = h * self.max_force;
            if self.linear_impulse.length_squared() > max_impulse * max_impulse {
                self.linear_impulse = self.linear_impulse.normalize() * max_impulse;
            }

            impulse = self.linear_impulse - old_impulse;

            v_a -= m_a * impulse;
            w_a -= i_a * cross_vv(self.r_a, impulse);
            v_b += m_b * impulse;
            w_b += i_b * cross_vv(self.r_b, impulse);
        }

        data.velocities[self.index_a].linear = v_a;
        data.velocities[self.index_a].angular = w_a;
        data.velocities[self.index_b].linear = v_b;
        data.velocities[self.index_b].angular = w_b;
    }

    pub fn solve_position_constraints(&mut self, _data: &mut SolverData) -> bool {
        true
    }
}
