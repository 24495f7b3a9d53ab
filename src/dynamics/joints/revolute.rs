//! Hinge constraint: pins two anchor points together and leaves relative
//! rotation free, optionally driven by a motor and bracketed by angle
//! limits.

use glam::{Mat2, Vec2};

use crate::{
    config::{ANGULAR_SLOP, LINEAR_SLOP, MAX_ANGULAR_CORRECTION},
    core::{
        body::RigidBody,
        types::{cross_sv, cross_vv, solve22, Rot},
    },
    dynamics::SolverData,
    utils::allocator::{Arena, EntityId},
};

#[derive(Debug, Clone)]
pub struct RevoluteJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// `angle_b − angle_a` at rest.
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_angle: f32,
    pub upper_angle: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
    pub collide_connected: bool,
}

impl RevoluteJointDef {
    pub fn new(body_a: EntityId, body_b: EntityId, local_anchor_a: Vec2, local_anchor_b: Vec2) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            reference_angle: 0.0,
            enable_limit: false,
            lower_angle: 0.0,
            upper_angle: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            collide_connected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevoluteJoint {
    pub(crate) body_a: EntityId,
    pub(crate) body_b: EntityId,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,

    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_angle: f32,
    pub upper_angle: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,

    // Solver state.
    impulse: Vec2,
    motor_impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,
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
    k: Mat2,
    angle: f32,
    axial_mass: f32,
}

impl RevoluteJoint {
    pub fn new(def: &RevoluteJointDef) -> Self {
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            island_flag: false,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            reference_angle: def.reference_angle,
            enable_limit: def.enable_limit,
            lower_angle: def.lower_angle,
            upper_angle: def.upper_angle,
            enable_motor: def.enable_motor,
            motor_speed: def.motor_speed,
            max_motor_torque: def.max_motor_torque,
            impulse: Vec2::ZERO,
            motor_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
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
            k: Mat2::ZERO,
            angle: 0.0,
            axial_mass: 0.0,
        }
    }

    /// Current joint angle `angle_b − angle_a − reference`.
    pub fn joint_angle(&self) -> f32 {
        self.angle
    }

    pub fn motor_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.motor_impulse
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * self.impulse
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * (self.motor_impulse + self.lower_impulse - self.upper_impulse)
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
        let k22 = m_a + m_b + self.r_a.x * self.r_a.x * i_a + self.r_b.x * self.r_b.x * i_b;
        self.k = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22));

        self.axial_mass = i_a + i_b;
        let fixed_rotation;
        if self.axial_mass > 0.0 {
            self.axial_mass = 1.0 / self.axial_mass;
            fixed_rotation = false;
        } else {
            fixed_rotation = true;
        }

        self.angle = a_b - a_a - self.reference_angle;
        if !self.enable_limit || fixed_rotation {
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }
        if !self.enable_motor || fixed_rotation {
            self.motor_impulse = 0.0;
        }

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;
            self.motor_impulse *= data.step.dt_ratio;
            self.lower_impulse *= data.step.dt_ratio;
            self.upper_impulse *= data.step.dt_ratio;

            let axial_impulse = self.motor_impulse + self.lower_impulse - self.upper_impulse;
            let p = Vec2::new(self.impulse.x, self.impulse.y);

            v_a -= m_a * p;
            w_a -= i_a * (cross_vv(self.r_a, p) + axial_impulse);
            v_b += m_b * p;
            w_b += i_b * (cross_vv(self.r_b, p) + axial_impulse);
        } else {
            self.impulse = Vec2::ZERO;
            self.motor_impulse = 0.0;
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
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

        let fixed_rotation = i_a + i_b == 0.0;

        // Motor.
        if self.enable_motor && !fixed_rotation {
            let c_dot = w_b - w_a - self.motor_speed;
            let mut impulse = -self.axial_mass * c_dot;
            let old_impulse = self.motor_impulse;
            let max_impulse = data.step.dt * self.max_motor_torque;
            self.motor_impulse = (self.motor_impulse + impulse).clamp(-max_impulse, max_impulse);
            impulse = self.motor_impulse - old_impulse;

            w_a -= i_a * impulse;
            w_b += i_b * impulse;
        }

        if self.enable_limit && !fixed_rotation {
            // Lower limit.
            {
                let c = self.angle - self.lower_angle;
                let c_dot = w_b - w_a;
                let mut impulse = -self.axial_mass * (c_dot + c.max(0.0) * data.step.inv_dt);
                let old_impulse = self.lower_impulse;
                self.lower_impulse = (self.lower_impulse + impulse).max(0.0);
                impulse = self.lower_impulse - old_impulse;

                w_a -= i_a * impulse;
                w_b += i_b * impulse;
            }

            // Upper limit; sign conventions flip so the accumulated
            // impulse stays positive.
            {
                let c = self.upper_angle - self.angle;
                let c_dot = w_a - w_b;
                let mut impulse = -self.axial_mass * (c_dot + c.max(0.0) * data.step.inv_dt);
                let old_impulse = self.upper_impulse;
                self.upper_impulse = (self.upper_impulse + impulse).max(0.0);
                impulse = self.upper_impulse - old_impulse;

                w_a += i_a * impulse;
                w_b -= i_b * impulse;
            }
        }

        // Point-to-point constraint.
        {
            let c_dot = v_b + cross_sv(w_b, self.r_b) - v_a - cross_sv(w_a, self.r_a);
            let impulse = solve22(self.k, -c_dot);

            self.impulse += impulse;

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

    pub fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        let mut c_a = data.positions[self.index_a].c;
        let mut a_a = data.positions[self.index_a].a;
        let mut c_b = data.positions[self.index_b].c;
        let mut a_b = data.positions[self.index_b].a;

        let mut angular_error = 0.0;
        let position_error;

        let fixed_rotation = self.inv_i_a + self.inv_i_b == 0.0;

        // Limit correction.
        if self.enable_limit && !fixed_rotation {
            let angle = a_b - a_a - self.reference_angle;
            let mut c = 0.0;

            if (self.upper_angle - self.lower_angle).abs() < 2.0 * ANGULAR_SLOP {
                c = (angle - self.lower_angle)
                    .clamp(-MAX_ANGULAR_CORRECTION, MAX_ANGULAR_CORRECTION);
            } else if angle <= self.lower_angle {
                c = (angle - self.lower_angle + ANGULAR_SLOP)
                    .clamp(-MAX_ANGULAR_CORRECTION, 0.0);
            } else if angle >= self.upper_angle {
                c = (angle - self.upper_angle - ANGULAR_SLOP)
                    .clamp(0.0, MAX_ANGULAR_CORRECTION);
            }

            let limit_impulse = -self.axial_mass * c;
            a_a -= self.inv_i_a * limit_impulse;
            a_b += self.inv_i_b * limit_impulse;
            angular_error = c.abs();
        }

        // Point-to-point correction.
        {
            let q_a = Rot::new(a_a);
            let q_b = Rot::new(a_b);
            let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
            let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);

            let c = c_b + r_b - c_a - r_a;
            position_error = c.length();

            let m_a = self.inv_mass_a;
            let m_b = self.inv_mass_b;
            let i_a = self.inv_i_a;
            let i_b = self.inv_i_b;

            let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
            let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
            let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
            let k = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22));

            let impulse = -solve22(k, c);

            c_a -= m_a * impulse;
            a_a -= i_a * cross_vv(r_a, impulse);
            c_b += m_b * impulse;
            a_b += i_b * cross_vv(r_b, impulse);
        }

        data.positions[self.index_a].c = c_a;
        data.positions[self.index_a].a = a_a;
        data.positions[self.index_b].c = c_b;
        data.positions[self.index_b].a = a_b;

        position_error <= LINEAR_SLOP && angular_error <= ANGULAR_SLOP
    }
}
