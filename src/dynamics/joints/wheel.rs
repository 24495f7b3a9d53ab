//! Vehicle suspension: a point constraint along a spring axis fixed in
//! body A, with a rotational motor and optional translation limits.

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
pub struct WheelJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Suspension axis in body A's frame; must be a unit vector.
    pub local_axis_a: Vec2,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
    /// Suspension spring; zero stiffness locks the axis rigidly.
    pub stiffness: f32,
    pub damping: f32,
    pub collide_connected: bool,
}

impl WheelJointDef {
    pub fn new(
        body_a: EntityId,
        body_b: EntityId,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        local_axis_a: Vec2,
    ) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            local_axis_a: local_axis_a.normalize(),
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            stiffness: 0.0,
            damping: 0.0,
            collide_connected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WheelJoint {
    pub(crate) body_a: EntityId,
    pub(crate) body_b: EntityId,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,

    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    local_y_axis_a: Vec2,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
    pub stiffness: f32,
    pub damping: f32,

    // Solver state.
    impulse: f32,
    motor_impulse: f32,
    spring_impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,
    translation: f32,
    index_a: usize,
    index_b: usize,
    local_center_a: Vec2,
    local_center_b: Vec2,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    ax: Vec2,
    ay: Vec2,
    s_ax: f32,
    s_bx: f32,
    s_ay: f32,
    s_by: f32,
    mass: f32,
    motor_mass: f32,
    axial_mass: f32,
    spring_mass: f32,
    bias: f32,
    gamma: f32,
}

impl WheelJoint {
    pub fn new(def: &WheelJointDef) -> Self {
        let local_axis_a = def.local_axis_a.normalize();
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            island_flag: false,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            local_axis_a,
            local_y_axis_a: cross_sv(1.0, local_axis_a),
            enable_limit: def.enable_limit,
            lower_translation: def.lower_translation,
            upper_translation: def.upper_translation,
            enable_motor: def.enable_motor,
            motor_speed: def.motor_speed,
            max_motor_torque: def.max_motor_torque,
            stiffness: def.stiffness,
            damping: def.damping,
            impulse: 0.0,
            motor_impulse: 0.0,
            spring_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
            translation: 0.0,
            index_a: 0,
            index_b: 0,
            local_center_a: Vec2::ZERO,
            local_center_b: Vec2::ZERO,
            inv_mass_a: 0.0,
            inv_mass_b: 0.0,
            inv_i_a: 0.0,
            inv_i_b: 0.0,
            ax: Vec2::ZERO,
            ay: Vec2::ZERO,
            s_ax: 0.0,
            s_bx: 0.0,
            s_ay: 0.0,
            s_by: 0.0,
            mass: 0.0,
            motor_mass: 0.0,
            axial_mass: 0.0,
            spring_mass: 0.0,
            bias: 0.0,
            gamma: 0.0,
        }
    }

    pub fn motor_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.motor_impulse
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt
            * (self.impulse * self.ay
                + (self.spring_impulse + self.lower_impulse - self.upper_impulse) * self.ax)
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.motor_impulse
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

        let m_a = self.inv_mass_a;
        let m_b = self.inv_mass_b;
        let i_a = self.inv_i_a;
        let i_b = self.inv_i_b;

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

        let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);
        let d = c_b + r_b - c_a - r_a;

        // Point constraint perpendicular to the axis.
        self.ay = q_a.apply(self.local_y_axis_a);
        self.s_ay = cross_vv(d + r_a, self.ay);
        self.s_by = cross_vv(r_b, self.ay);

        self.mass = m_a + m_b + i_a * self.s_ay * self.s_ay + i_b * self.s_by * self.s_by;
        if self.mass > 0.0 {
            self.mass = 1.0 / self.mass;
        }

        // Spring and limits along the axis.
        self.ax = q_a.apply(self.local_axis_a);
        self.s_ax = cross_vv(d + r_a, self.ax);
        self.s_bx = cross_vv(r_b, self.ax);

        let inv_mass = m_a + m_b + i_a * self.s_ax * self.s_ax + i_b * self.s_bx * self.s_bx;
        self.axial_mass = if inv_mass > 0.0 { 1.0 / inv_mass } else { 0.0 };

        self.spring_mass = 0.0;
        self.bias = 0.0;
        self.gamma = 0.0;

        if self.stiffness > 0.0 && inv_mass > 0.0 {
            self.spring_mass = 1.0 / inv_mass;

            let c = d.dot(self.ax);
            let h = data.step.dt;

            self.gamma = h * (self.damping + h * self.stiffness);
            if self.gamma > 0.0 {
                self.gamma = 1.0 / self.gamma;
            }
            self.bias = c * h * self.stiffness * self.gamma;

            let soft_inv_mass = inv_mass + self.gamma;
            if soft_inv_mass > 0.0 {
                self.spring_mass = 1.0 / soft_inv_mass;
            }
        } else {
            self.spring_impulse = 0.0;
        }

        if self.enable_limit {
            self.translation = self.ax.dot(d);
        } else {
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }

        if self.enable_motor {
            self.motor_mass = i_a + i_b;
            if self.motor_mass > 0.0 {
                self.motor_mass = 1.0 / self.motor_mass;
            }
        } else {
            self.motor_mass = 0.0;
            self.motor_impulse = 0.0;
        }

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;
            self.spring_impulse *= data.step.dt_ratio;
            self.motor_impulse *= data.step.dt_ratio;
            self.lower_impulse *= data.step.dt_ratio;
            self.upper_impulse *= data.step.dt_ratio;

            let axial_impulse = self.spring_impulse + self.lower_impulse - self.upper_impulse;
            let p = self.impulse * self.ay + axial_impulse * self.ax;
            let l_a = self.impulse * self.s_ay + axial_impulse * self.s_ax + self.motor_impulse;
            let l_b = self.impulse * self.s_by + axial_impulse * self.s_bx + self.motor_impulse;

            v_a -= self.inv_mass_a * p;
            w_a -= self.inv_i_a * l_a;
            v_b += self.inv_mass_b * p;
            w_b += self.inv_i_b * l_b;
        } else {
            self.impulse = 0.0;
            self.spring_impulse = 0.0;
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
        let m_a = self.inv_mass_a;
        let m_b = self.inv_mass_b;
        let i_a = self.inv_i_a;
        let i_b = self.inv_i_b;

        let mut v_a = data.velocities[self.index_a].linear;
        let mut w_a = data.velocities[self.index_a].angular;
        let mut v_b = data.velocities[self.index_b].linear;
        let mut w_b = data.velocities[self.index_b].angular;

        // Spring along the suspension axis.
        if self.stiffness > 0.0 {
            let c_dot = self.ax.dot(v_b - v_a) + self.s_bx * w_b - self.s_ax * w_a;
            let impulse =
                -self.spring_mass * (c_dot + self.bias + self.gamma * self.spring_impulse);
            self.spring_impulse += impulse;

            let p = impulse * self.ax;
            let l_a = impulse * self.s_ax;
            let l_b = impulse * self.s_bx;

            v_a -= m_a * p;
            w_a -= i_a * l_a;
            v_b += m_b * p;
            w_b += i_b * l_b;
        }

        // Rotational motor about the axle.
        if self.enable_motor {
            let c_dot = w_b - w_a - self.motor_speed;
            let mut impulse = -self.motor_mass * c_dot;

            let old_impulse = self.motor_impulse;
            let max_impulse = data.step.dt * self.max_motor_torque;
            self.motor_impulse = (self.motor_impulse + impulse).clamp(-max_impulse, max_impulse);
            impulse = self.motor_impulse - old_impulse;

            w_a -= i_a * impulse;
            w_b += i_b * impulse;
        }

        if self.enable_limit {
            // Lower limit.
            {
                let c = self.translation - self.lower_translation;
                let c_dot = self.ax.dot(v_b - v_a) + self.s_bx * w_b - self.s_ax * w_a;
                let mut impulse = -self.axial_mass * (c_dot + c.max(0.0) * data.step.inv_dt);
                let old_impulse = self.lower_impulse;
                self.lower_impulse = (self.lower_impulse + impulse).max(0.0);
                impulse = self.lower_impulse - old_impulse;

                let p = impulse * self.ax;
                let l_a = impulse * self.s_ax;
                let l_b = impulse * self.s_bx;

                v_a -= m_a * p;
                w_a -= i_a * l_a;
                v_b += m_b * p;
                w_b += i_b * l_b;
            }

            // Upper limit.
            {
                let c = self.upper_translation - self.translation;
                let c_dot = self.ax.dot(v_a - v_b) + self.s_ax * w_a - self.s_bx * w_b;
                let mut impulse = -self.axial_mass * (c_dot + c.max(0.0) * data.step.inv_dt);
                let old_impulse = self.upper_impulse;
                self.upper_impulse = (self.upper_impulse + impulse).max(0.0);
                impulse = self.upper_impulse - old_impulse;

                let p = impulse * self.ax;
                let l_a = impulse * self.s_ax;
                let l_b = impulse * self.s_bx;

                v_a += m_a * p;
                w_a += i_a * l_a;
                v_b -= m_b * p;
                w_b -= i_b * l_b;
            }
        }

        // Point constraint perpendicular to the axis.
        {
            let c_dot = self.ay.dot(v_b - v_a) + self.s_by * w_b - self.s_ay * w_a;
            let impulse = -self.mass * c_dot;
            self.impulse += impulse;

            let p = impulse * self.ay;
            let l_a = impulse * self.s_ay;
            let l_b = impulse * self.s_by;

            v_a -= m_a * p;
            w_a -= i_a * l_a;
            v_b += m_b * p;
            w_b += i_b * l_b;
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

        let mut linear_error = 0.0f32;

        if self.enable_limit {
            let q_a = Rot::new(a_a);
            let q_b = Rot::new(a_b);

            let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
            let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);
            let d = c_b - c_a + r_b - r_a;

            let ax = q_a.apply(self.local_axis_a);
            let s_ax = cross_vv(d + r_a, ax);
            let s_bx = cross_vv(r_b, ax);

            let mut c = 0.0;
            let translation = ax.dot(d);
            if (self.upper_translation - self.lower_translation).abs() < 2.0 * LINEAR_SLOP {
                c = translation;
            } else if translation <= self.lower_translation {
                c = (translation - self.lower_translation).min(0.0);
            } else if translation >= self.upper_translation {
                c = (translation - self.upper_translation).max(0.0);
            }

            if c != 0.0 {
                let inv_mass = self.inv_mass_a
                    + self.inv_mass_b
                    + self.inv_i_a * s_ax * s_ax
                    + self.inv_i_b * s_bx * s_bx;
                if inv_mass > 0.0 {
                    let impulse = -c / inv_mass;

                    let p = impulse * ax;
                    let l_a = impulse * s_ax;
                    let l_b = impulse * s_bx;

                    c_a -= self.inv_mass_a * p;
                    a_a -= self.inv_i_a * l_a;
                    c_b += self.inv_mass_b * p;
                    a_b += self.inv_i_b * l_b;
                }
                linear_error = c.abs();
            }
        }

        // Perpendicular point correction.
        {
            let q_a = Rot::new(a_a);
            let q_b = Rot::new(a_b);

            let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
            let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);
            let d = c_b - c_a + r_b - r_a;

            let ay = q_a.apply(self.local_y_axis_a);

            let s_ay = cross_vv(d + r_a, ay);
            let s_by = cross_vv(r_b, ay);

            let c = d.dot(ay);

            let inv_mass = self.inv_mass_a
                + self.inv_mass_b
                + self.inv_i_a * self.s_ay * self.s_ay
                + self.inv_i_b * self.s_by * self.s_by;

            if inv_mass != 0.0 {
                let impulse = -c / inv_mass;

                let p = impulse * ay;
                let l_a = impulse * s_ay;
                let l_b = impulse * s_by;

                c_a -= self.inv_mass_a * p;
                a_a -= self.inv_i_a * l_a;
                c_b += self.inv_mass_b * p;
                a_b += self.inv_i_b * l_b;
            }

            linear_error = linear_error.max(c.abs());
        }

        data.positions[self.index_a].c = c_a;
        data.positions[self.index_a].a = a_a;
        data.positions[self.index_b].c = c_b;
        data.positions[self.index_b].a = a_b;

        linear_error <= LINEAR_SLOP
    }
}
