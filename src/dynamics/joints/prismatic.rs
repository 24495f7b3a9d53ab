//! Slider constraint: relative motion restricted to an axis fixed in body
//! A, with optional translation limits and a linear motor.

use glam::{Mat2, Mat3, Vec2, Vec3};

use crate::{
    config::{ANGULAR_SLOP, LINEAR_SLOP, MAX_LINEAR_CORRECTION},
    core::{
        body::RigidBody,
        types::{cross_sv, cross_vv, solve22, solve33, Rot},
    },
    dynamics::SolverData,
    utils::allocator::{Arena, EntityId},
};

#[derive(Debug, Clone)]
pub struct PrismaticJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Slide axis in body A's frame; must be a unit vector.
    pub local_axis_a: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_force: f32,
    pub collide_connected: bool,
}

impl PrismaticJointDef {
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
            reference_angle: 0.0,
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
            collide_connected: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrismaticJoint {
    pub(crate) body_a: EntityId,
    pub(crate) body_b: EntityId,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,

    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    local_y_axis_a: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_force: f32,

    // Solver state.
    impulse: Vec2,
    motor_impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,
    index_a: usize,
    index_b: usize,
    local_center_a: Vec2,
    local_center_b: Vec2,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    axis: Vec2,
    perp: Vec2,
    s1: f32,
    s2: f32,
    a1: f32,
    a2: f32,
    k: Mat2,
    translation: f32,
    axial_mass: f32,
}

impl PrismaticJoint {
    pub fn new(def: &PrismaticJointDef) -> Self {
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
            reference_angle: def.reference_angle,
            enable_limit: def.enable_limit,
            lower_translation: def.lower_translation,
            upper_translation: def.upper_translation,
            enable_motor: def.enable_motor,
            motor_speed: def.motor_speed,
            max_motor_force: def.max_motor_force,
            impulse: Vec2::ZERO,
            motor_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
            index_a: 0,
            index_b: 0,
            local_center_a: Vec2::ZERO,
            local_center_b: Vec2::ZERO,
            inv_mass_a: 0.0,
            inv_mass_b: 0.0,
            inv_i_a: 0.0,
            inv_i_b: 0.0,
            axis: Vec2::ZERO,
            perp: Vec2::ZERO,
            s1: 0.0,
            s2: 0.0,
            a1: 0.0,
            a2: 0.0,
            k: Mat2::ZERO,
            translation: 0.0,
            axial_mass: 0.0,
        }
    }

    pub fn joint_translation(&self) -> f32 {
        self.translation
    }

    pub fn motor_force(&self, inv_dt: f32) -> f32 {
        inv_dt * self.motor_impulse
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt
            * (self.impulse.x * self.perp
                + (self.motor_impulse + self.lower_impulse - self.upper_impulse) * self.axis)
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.impulse.y
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

        let r_a = q_a.apply(self.local_anchor_a - self.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - self.local_center_b);
        let d = (c_b - c_a) + r_b - r_a;

        let m_a = self.inv_mass_a;
        let m_b = self.inv_mass_b;
        let i_a = self.inv_i_a;
        let i_b = self.inv_i_b;

        // Motor and limit Jacobian.
        self.axis = q_a.apply(self.local_axis_a);
        self.a1 = cross_vv(d + r_a, self.axis);
        self.a2 = cross_vv(r_b, self.axis);

        self.axial_mass = m_a + m_b + i_a * self.a1 * self.a1 + i_b * self.a2 * self.a2;
        if self.axial_mass > 0.0 {
            self.axial_mass = 1.0 / self.axial_mass;
        }

        // Perp + angular constraint Jacobian.
        self.perp = q_a.apply(self.local_y_axis_a);
        self.s1 = cross_vv(d + r_a, self.perp);
        self.s2 = cross_vv(r_b, self.perp);

        let k11 = m_a + m_b + i_a * self.s1 * self.s1 + i_b * self.s2 * self.s2;
        let k12 = i_a * self.s1 + i_b * self.s2;
        let mut k22 = i_a + i_b;
        if k22 == 0.0 {
            // Both bodies have fixed rotation; the angular row vanishes.
            k22 = 1.0;
        }
        self.k = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22));

        self.translation = self.axis.dot(d);
        if !self.enable_limit {
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }
        if !self.enable_motor {
            self.motor_impulse = 0.0;
        }

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;
            self.motor_impulse *= data.step.dt_ratio;
            self.lower_impulse *= data.step.dt_ratio;
            self.upper_impulse *= data.step.dt_ratio;

            let axial_impulse = self.motor_impulse + self.lower_impulse - self.upper_impulse;
            let p = self.impulse.x * self.perp + axial_impulse * self.axis;
            let l_a = self.impulse.x * self.s1 + self.impulse.y + axial_impulse * self.a1;
            let l_b = self.impulse.x * self.s2 + self.impulse.y + axial_impulse * self.a2;

            v_a -= m_a * p;
            w_a -= i_a * l_a;
            v_b += m_b * p;
            w_b += i_b * l_b;
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

        // Motor.
        if self.enable_motor {
            let c_dot = self.axis.dot(v_b - v_a) + self.a2 * w_b - self.a1 * w_a;
            let mut impulse = self.axial_mass * (self.motor_speed - c_dot);
            let old_impulse = self.motor_impulse;
            let max_impulse = data.step.dt * self.max_motor_force;
            self.motor_impulse = (self.motor_impulse + impulse).clamp(-max_impulse, max_impulse);
            impulse = self.motor_impulse - old_impulse;

            let p = impulse * self.axis;
            let l_a = impulse * self.a1;
            let l_b = impulse * self.a2;

            v_a -= m_a * p;
            w_a -= i_a * l_a;
            v_b += m_b * p;
            w_b += i_b * l_b;
        }

        if self.enable_limit {
            // Lower limit.
            {
                let c = self.translation - self.lower_translation;
                let c_dot = self.axis.dot(v_b - v_a) + self.a2 * w_b - self.a1 * w_a;
                let mut impulse = -self.axial_mass * (c_dot + c.max(0.0) * data.step.inv_dt);
                let old_impulse = self.lower_impulse;
                self.lower_impulse = (self.lower_impulse + impulse).max(0.0);
                impulse = self.lower_impulse - old_impulse;

                let p = impulse * self.axis;
                let l_a = impulse * self.a1;
                let l_b = impulse * self.a2;

                v_a -= m_a * p;
                w_a -= i_a * l_a;
                v_b += m_b * p;
                w_b += i_b * l_b;
            }

            // Upper limit; signs mirrored.
            {
                let c = self.upper_translation - self.translation;
                let c_dot = self.axis.dot(v_a - v_b) + self.a1 * w_a - self.a2 * w_b;
                let mut impulse = -self.axial_mass * (c_dot + c.max(0.0) * data.step.inv_dt);
                let old_impulse = self.upper_impulse;
                self.upper_impulse = (self.upper_impulse + impulse).max(0.0);
                impulse = self.upper_impulse - old_impulse;

                let p = impulse * self.axis;
                let l_a = impulse * self.a1;
                let l_b = impulse * self.a2;

                v_a += m_a * p;
                w_a += i_a * l_a;
                v_b -= m_b * p;
                w_b -= i_b * l_b;
            }
        }

        // Perpendicular + angular constraint.
        {
            let c_dot = Vec2::new(
                self.perp.dot(v_b - v_a) + self.s2 * w_b - self.s1 * w_a,
                w_b - w_a,
            );

            let df = solve22(self.k, -c_dot);
            self.impulse += df;

            let p = df.x * self.perp;
            let l_a = df.x * self.s1 + df.y;
            let l_b = df.x * self.s2 + df.y;

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

    /// Fresh-Jacobian position correction; the limit row joins the system
    /// only when active.
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
        let d = c_b + r_b - c_a - r_a;

        let axis = q_a.apply(self.local_axis_a);
        let a1 = cross_vv(d + r_a, axis);
        let a2 = cross_vv(r_b, axis);
        let perp = q_a.apply(self.local_y_axis_a);

        let s1 = cross_vv(d + r_a, perp);
        let s2 = cross_vv(r_b, perp);

        let c1 = Vec2::new(perp.dot(d), a_b - a_a - self.reference_angle);

        let mut linear_error = c1.x.abs();
        let angular_error = c1.y.abs();

        let mut active = false;
        let mut c2 = 0.0;
        if self.enable_limit {
            let translation = axis.dot(d);
            if (self.upper_translation - self.lower_translation).abs() < 2.0 * LINEAR_SLOP {
                c2 = translation.clamp(-MAX_LINEAR_CORRECTION, MAX_LINEAR_CORRECTION);
                linear_error = linear_error.max(translation.abs());
                active = true;
            } else if translation <= self.lower_translation {
                c2 = (translation - self.lower_translation + LINEAR_SLOP)
                    .clamp(-MAX_LINEAR_CORRECTION, 0.0);
                linear_error = linear_error.max(self.lower_translation - translation);
                active = true;
            } else if translation >= self.upper_translation {
                c2 = (translation - self.upper_translation - LINEAR_SLOP)
                    .clamp(0.0, MAX_LINEAR_CORRECTION);
                linear_error = linear_error.max(translation - self.upper_translation);
                active = true;
            }
        }

        let impulse: Vec3;
        if active {
            let k11 = m_a + m_b + i_a * s1 * s1 + i_b * s2 * s2;
            let k12 = i_a * s1 + i_b * s2;
            let k13 = i_a * s1 * a1 + i_b * s2 * a2;
            let mut k22 = i_a + i_b;
            if k22 == 0.0 {
                k22 = 1.0;
            }
            let k23 = i_a * a1 + i_b * a2;
            let k33 = m_a + m_b + i_a * a1 * a1 + i_b * a2 * a2;

            let k = Mat3::from_cols(
                Vec3::new(k11, k12, k13),
                Vec3::new(k12, k22, k23),
                Vec3::new(k13, k23, k33),
            );

            let c = Vec3::new(c1.x, c1.y, c2);
            impulse = solve33(k, -c);
        } else {
            let k11 = m_a + m_b + i_a * s1 * s1 + i_b * s2 * s2;
            let k12 = i_a * s1 + i_b * s2;
            let mut k22 = i_a + i_b;
            if k22 == 0.0 {
                k22 = 1.0;
            }
            let k = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22));

            let impulse1 = solve22(k, -c1);
            impulse = Vec3::new(impulse1.x, impulse1.y, 0.0);
        }

        let p = impulse.x * perp + impulse.z * axis;
        let l_a = impulse.x * s1 + impulse.y + impulse.z * a1;
        let l_b = impulse.x * s2 + impulse.y + impulse.z * a2;

        c_a -= m_a * p;
        a_a -= i_a * l_a;
        c_b += m_b * p;
        a_b += i_b * l_b;

        data.positions[self.index_a].c = c_a;
        data.positions[self.index_a].a = a_a;
        data.positions[self.index_b].c = c_b;
        data.positions[self.index_b].a = a_b;

        linear_error <= LINEAR_SLOP && angular_error <= ANGULAR_SLOP
    }
}
