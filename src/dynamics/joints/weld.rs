//! Rigid (or angularly soft) lock of two bodies: the anchor points and
//! relative angle are held fixed.

use glam::{Mat3, Vec2, Vec3};

use crate::{
    config::{ANGULAR_SLOP, LINEAR_SLOP},
    core::{
        body::RigidBody,
        types::{cross_sv, cross_vv, inverse22, solve22, solve33, solve33_as22, sym_inverse33, Rot},
    },
    dynamics::SolverData,
    utils::allocator::{Arena, EntityId},
};

#[derive(Debug, Clone)]
pub struct WeldJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    /// Angular softness; zero means a fully rigid weld.
    pub stiffness: f32,
    pub damping: f32,
    pub collide_connected: bool,
}

impl WeldJointDef {
    pub fn new(body_a: EntityId, body_b: EntityId, local_anchor_a: Vec2, local_anchor_b: Vec2) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            reference_angle: 0.0,
            stiffness: 0.0,
            damping: 0.0,
            collide_connected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeldJoint {
    pub(crate) body_a: EntityId,
    pub(crate) body_b: EntityId,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,

    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub stiffness: f32,
    pub damping: f32,

    // Solver state.
    impulse: Vec3,
    bias: f32,
    gamma: f32,
    index_a: usize,
    index_b: usize,
    r_a: Vec2,
    r_b: Vec2,
    local_center_a: Vec2,
    local_center_b: Vec2,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    mass: Mat3,
}

impl WeldJoint {
    pub fn new(def: &WeldJointDef) -> Self {
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            island_flag: false,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            reference_angle: def.reference_angle,
            stiffness: def.stiffness,
            damping: def.damping,
            impulse: Vec3::ZERO,
            bias: 0.0,
            gamma: 0.0,
            index_a: 0,
            index_b: 0,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            local_center_a: Vec2::ZERO,
            local_center_b: Vec2::ZERO,
            inv_mass_a: 0.0,
            inv_mass_b: 0.0,
            inv_i_a: 0.0,
            inv_i_b: 0.0,
            mass: Mat3::ZERO,
        }
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * Vec2::new(self.impulse.x, self.impulse.y)
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.impulse.z
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

        let a_a = data.positions[self.index_a].a;
        let mut v_a = data.velocities[self.index_a].linear;
        let mut w_a = data.velocities[self.index_a].angular;

        let a_b = data.positions[self.index_b].a;
        let mut v_b = data.velocities[self.index_b].linear;
        let mut w_b = data.velocities[self.index_b].angular;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);

        self.r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        self.r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

        let m_a = self.inv_mass_a;
        let m_b = self.inv_mass_b;
        let i_a = self.inv_i_a;
        let i_b = self.inv_i_b;

        let k11 = m_a + m_b + self.r_a.y * self.r_a.y * i_a + self.r_b.y * self.r_b.y * i_b;
        let k12 = -self.r_a.y * self.r_a.x * i_a - self.r_b.y * self.r_b.x * i_b;
        let k13 = -self.r_a.y * i_a - self.r_b.y * i_b;
        let k22 = m_a + m_b + self.r_a.x * self.r_a.x * i_a + self.r_b.x * self.r_b.x * i_b;
        let k23 = self.r_a.x * i_a + self.r_b.x * i_b;
        let k33 = i_a + i_b;

        let k = Mat3::from_cols(
            Vec3::new(k11, k12, k13),
            Vec3::new(k12, k22, k23),
            Vec3::new(k13, k23, k33),
        );

        if self.stiffness > 0.0 {
            self.mass = inverse22(k);

            let mut inv_m = i_a + i_b;
            let c = a_b - a_a - self.reference_angle;

            let d = self.damping;
            let s = self.stiffness;
            let h = data.step.dt;

            self.gamma = h * (d + h * s);
            self.gamma = if self.gamma != 0.0 { 1.0 / self.gamma } else { 0.0 };
            self.bias = c * h * s * self.gamma;

            inv_m += self.gamma;
            self.mass.z_axis.z = if inv_m != 0.0 { 1.0 / inv_m } else { 0.0 };
        } else if k33 == 0.0 {
            self.mass = inverse22(k);
            self.gamma = 0.0;
            self.bias = 0.0;
        } else {
            self.mass = sym_inverse33(k);
            self.gamma = 0.0;
            self.bias = 0.0;
        }

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;

            let p = Vec2::new(self.impulse.x, self.impulse.y);

            v_a -= m_a * p;
            w_a -= i_a * (cross_vv(self.r_a, p) + self.impulse.z);
            v_b += m_b * p;
            w_b += i_b * (cross_vv(self.r_b, p) + self.impulse.z);
        } else {
            self.impulse = Vec3::ZERO;
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

        if self.stiffness > 0.0 {
            // Soft angular channel first.
            let c_dot2 = w_b - w_a;
            let impulse2 =
                -self.mass.z_axis.z * (c_dot2 + self.bias + self.gamma * self.impulse.z);
            self.impulse.z += impulse2;

            w_a -= i_a * impulse2;
            w_b += i_b * impulse2;

            let c_dot1 = v_b + cross_sv(w_b, self.r_b) - v_a - cross_sv(w_a, self.r_a);
            let impulse1 = -(Vec2::new(
                self.mass.x_axis.x * c_dot1.x + self.mass.y_axis.x * c_dot1.y,
                self.mass.x_axis.y * c_dot1.x + self.mass.y_axis.y * c_dot1.y,
            ));
            self.impulse.x += impulse1.x;
            self.impulse.y += impulse1.y;

            let p = impulse1;
            v_a -= m_a * p;
            w_a -= i_a * cross_vv(self.r_a, p);
            v_b += m_b * p;
            w_b += i_b * cross_vv(self.r_b, p);
        } else {
            let c_dot1 = v_b + cross_sv(w_b, self.r_b) - v_a - cross_sv(w_a, self.r_a);
            let c_dot2 = w_b - w_a;
            let c_dot = Vec3::new(c_dot1.x, c_dot1.y, c_dot2);

            let impulse = -(self.mass * c_dot);
            self.impulse += impulse;

            let p = Vec2::new(impulse.x, impulse.y);
            v_a -= m_a * p;
            w_a -= i_a * (cross_vv(self.r_a, p) + impulse.z);
            v_b += m_b * p;
            w_b += i_b * (cross_vv(self.r_b, p) + impulse.z);
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

        let m_a = self.inv_mass_a;
        let m_b = self.inv_mass_b;
        let i_a = self.inv_i_a;
        let i_b = self.inv_i_b;

        let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

        let position_error;
        let angular_error;

        let k11 = m_a + m_b + r_a.y * r_a.y * i_a + r_b.y * r_b.y * i_b;
        let k12 = -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b;
        let k13 = -r_a.y * i_a - r_b.y * i_b;
        let k22 = m_a + m_b + r_a.x * r_a.x * i_a + r_b.x * r_b.x * i_b;
        let k23 = r_a.x * i_a + r_b.x * i_b;
        let k33 = i_a + i_b;

        let k = Mat3::from_cols(
            Vec3::new(k11, k12, k13),
            Vec3::new(k12, k22, k23),
            Vec3::new(k13, k23, k33),
        );

        if self.stiffness > 0.0 {
            let c1 = c_b + r_b - c_a - r_a;

            position_error = c1.length();
            angular_error = 0.0;

            let p = -solve33_as22(k, c1);

            c_a -= m_a * p;
            a_a -= i_a * cross_vv(r_a, p);
            c_b += m_b * p;
            a_b += i_b * cross_vv(r_b, p);
        } else {
            let c1 = c_b + r_b - c_a - r_a;
            let c2 = a_b - a_a - self.reference_angle;

            position_error = c1.length();
            angular_error = c2.abs();

            let c = Vec3::new(c1.x, c1.y, c2);

            let impulse = if k33 > 0.0 {
                -solve33(k, c)
            } else {
                let impulse2 = -solve22(
                    glam::Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22)),
                    c1,
                );
                Vec3::new(impulse2.x, impulse2.y, 0.0)
            };

            let p = Vec2::new(impulse.x, impulse.y);

            c_a -= m_a * p;
            a_a -= i_a * (cross_vv(r_a, p) + impulse.z);
            c_b += m_b * p;
            a_b += i_b * (cross_vv(r_b, p) + impulse.z);
        }

        data.positions[self.index_a].c = c_a;
        data.positions[self.index_a].a = a_a;
        data.positions[self.index_b].c = c_b;
        data.positions[self.index_b].a = a_b;

        position_error <= LINEAR_SLOP && angular_error <= ANGULAR_SLOP
    }
}
