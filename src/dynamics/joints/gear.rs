//! Gear constraint tying the coordinates of two revolute/prismatic joints
//! together: `coordinate_a + ratio · coordinate_b == constant`.
//!
//! The participating joints must each attach a dynamic body (A/B) to a
//! ground body (C/D). The gear reads their frames once at creation; it
//! does not track later edits to the source joints.

use glam::Vec2;

use crate::{
    core::{
        body::RigidBody,
        types::{cross_vv, Rot, Transform},
    },
    dynamics::{
        joints::{Joint, PrismaticJoint, RevoluteJoint},
        SolverData,
    },
    utils::allocator::{Arena, EntityId},
};

#[derive(Debug, Clone)]
pub struct GearJointDef {
    /// A revolute or prismatic joint; its body B becomes the gear's body A.
    pub joint1: EntityId,
    /// A revolute or prismatic joint; its body B becomes the gear's body B.
    pub joint2: EntityId,
    pub ratio: f32,
    pub collide_connected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Revolute,
    Prismatic,
}

/// Frame snapshot taken from one source joint.
#[derive(Debug, Clone, Copy)]
struct SourceFrame {
    kind: SourceKind,
    local_anchor_ground: Vec2,
    local_anchor_body: Vec2,
    reference_angle: f32,
    local_axis: Vec2,
}

impl SourceFrame {
    fn from_joint(joint: &Joint) -> SourceFrame {
        match joint {
            Joint::Revolute(RevoluteJoint {
                local_anchor_a,
                local_anchor_b,
                reference_angle,
                ..
            }) => SourceFrame {
                kind: SourceKind::Revolute,
                local_anchor_ground: *local_anchor_a,
                local_anchor_body: *local_anchor_b,
                reference_angle: *reference_angle,
                local_axis: Vec2::ZERO,
            },
            Joint::Prismatic(PrismaticJoint {
                local_anchor_a,
                local_anchor_b,
                reference_angle,
                local_axis_a,
                ..
            }) => SourceFrame {
                kind: SourceKind::Prismatic,
                local_anchor_ground: *local_anchor_a,
                local_anchor_body: *local_anchor_b,
                reference_angle: *reference_angle,
                local_axis: *local_axis_a,
            },
            _ => panic!("gear joint requires revolute or prismatic source joints"),
        }
    }

    fn coordinate(&self, xf_ground: &Transform, a_ground: f32, xf_body: &Transform, a_body: f32) -> f32 {
        match self.kind {
            SourceKind::Revolute => a_body - a_ground - self.reference_angle,
            SourceKind::Prismatic => {
                let p_ground = self.local_anchor_ground;
                let p_body = xf_ground
                    .q
                    .apply_inv(xf_body.q.apply(self.local_anchor_body) + (xf_body.p - xf_ground.p));
                (p_body - p_ground).dot(self.local_axis)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GearJoint {
    pub(crate) body_a: EntityId,
    pub(crate) body_b: EntityId,
    body_c: EntityId,
    body_d: EntityId,
    pub(crate) collide_connected: bool,
    pub(crate) island_flag: bool,

    frame1: SourceFrame,
    frame2: SourceFrame,
    pub ratio: f32,
    constant: f32,

    // Solver state.
    impulse: f32,
    index_a: usize,
    index_b: usize,
    index_c: usize,
    index_d: usize,
    lc_a: Vec2,
    lc_b: Vec2,
    lc_c: Vec2,
    lc_d: Vec2,
    m_a: f32,
    m_b: f32,
    m_c: f32,
    m_d: f32,
    i_a: f32,
    i_b: f32,
    i_c: f32,
    i_d: f32,
    jv_ac: Vec2,
    jv_bd: Vec2,
    jw_a: f32,
    jw_b: f32,
    jw_c: f32,
    jw_d: f32,
    mass: f32,
}

impl GearJoint {
    /// Builds the gear from resolved source joints and the current body
    /// poses. The world resolves the def's joint ids before calling this.
    pub fn from_joints(
        def: &GearJointDef,
        joint1: &Joint,
        joint2: &Joint,
        bodies: &Arena<RigidBody>,
    ) -> Self {
        let frame1 = SourceFrame::from_joint(joint1);
        let frame2 = SourceFrame::from_joint(joint2);

        let body_c = joint1.body_a();
        let body_a = joint1.body_b();
        let body_d = joint2.body_a();
        let body_b = joint2.body_b();

        let get = |id: EntityId| bodies.get(id).expect("gear body missing");
        let (xf_a, a_a) = (get(body_a).transform, get(body_a).sweep.a);
        let (xf_b, a_b) = (get(body_b).transform, get(body_b).sweep.a);
        let (xf_c, a_c) = (get(body_c).transform, get(body_c).sweep.a);
        let (xf_d, a_d) = (get(body_d).transform, get(body_d).sweep.a);

        let coordinate_a = frame1.coordinate(&xf_c, a_c, &xf_a, a_a);
        let coordinate_b = frame2.coordinate(&xf_d, a_d, &xf_b, a_b);

        Self {
            body_a,
            body_b,
            body_c,
            body_d,
            collide_connected: def.collide_connected,
            island_flag: false,
            frame1,
            frame2,
            ratio: def.ratio,
            constant: coordinate_a + def.ratio * coordinate_b,
            impulse: 0.0,
            index_a: 0,
            index_b: 0,
            index_c: 0,
            index_d: 0,
            lc_a: Vec2::ZERO,
            lc_b: Vec2::ZERO,
            lc_c: Vec2::ZERO,
            lc_d: Vec2::ZERO,
            m_a: 0.0,
            m_b: 0.0,
            m_c: 0.0,
            m_d: 0.0,
            i_a: 0.0,
            i_b: 0.0,
            i_c: 0.0,
            i_d: 0.0,
            jv_ac: Vec2::ZERO,
            jv_bd: Vec2::ZERO,
            jw_a: 0.0,
            jw_b: 0.0,
            jw_c: 0.0,
            jw_d: 0.0,
            mass: 0.0,
        }
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * self.impulse * self.jv_ac
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.impulse * self.jw_a
    }

    pub fn init_velocity_constraints(&mut self, bodies: &Arena<RigidBody>, data: &mut SolverData) {
        let get = |id: EntityId| bodies.get(id).expect("gear body missing");
        let (body_a, body_b, body_c, body_d) = (
            get(self.body_a),
            get(self.body_b),
            get(self.body_c),
            get(self.body_d),
        );

        self.index_a = body_a.island_index;
        self.index_b = body_b.island_index;
        self.index_c = body_c.island_index;
        self.index_d = body_d.island_index;
        self.lc_a = body_a.local_center();
        self.lc_b = body_b.local_center();
        self.lc_c = body_c.local_center();
        self.lc_d = body_d.local_center();
        self.m_a = body_a.inv_mass;
        self.m_b = body_b.inv_mass;
        self.m_c = body_c.inv_mass;
        self.m_d = body_d.inv_mass;
        self.i_a = body_a.inv_inertia;
        self.i_b = body_b.inv_inertia;
        self.i_c = body_c.inv_inertia;
        self.i_d = body_d.inv_inertia;

        let a_a = data.positions[self.index_a].a;
        let mut v_a = data.velocities[self.index_a].linear;
        let mut w_a = data.velocities[self.index_a].angular;

        let a_b = data.positions[self.index_b].a;
        let mut v_b = data.velocities[self.index_b].linear;
        let mut w_b = data.velocities[self.index_b].angular;

        let a_c = data.positions[self.index_c].a;
        let mut v_c = data.velocities[self.index_c].linear;
        let mut w_c = data.velocities[self.index_c].angular;

        let a_d = data.positions[self.index_d].a;
        let mut v_d = data.velocities[self.index_d].linear;
        let mut w_d = data.velocities[self.index_d].angular;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);
        let q_c = Rot::new(a_c);
        let q_d = Rot::new(a_d);

        self.mass = 0.0;

        if self.frame1.kind == SourceKind::Revolute {
            self.jv_ac = Vec2::ZERO;
            self.jw_a = 1.0;
            self.jw_c = 1.0;
            self.mass += self.i_a + self.i_c;
        } else {
            let u = q_c.apply(self.frame1.local_axis);
            let r_c = q_c.apply(self.frame1.local_anchor_ground - self.lc_c);
            let r_a = q_a.apply(self.frame1.local_anchor_body - self.lc_a);
            self.jv_ac = u;
            self.jw_c = cross_vv(r_c, u);
            self.jw_a = cross_vv(r_a, u);
            self.mass += self.m_c + self.m_a
                + self.i_c * self.jw_c * self.jw_c
                + self.i_a * self.jw_a * self.jw_a;
        }

        if self.frame2.kind == SourceKind::Revolute {
            self.jv_bd = Vec2::ZERO;
            self.jw_b = self.ratio;
            self.jw_d = self.ratio;
            self.mass += self.ratio * self.ratio * (self.i_b + self.i_d);
        } else {
            let u = q_d.apply(self.frame2.local_axis);
            let r_d = q_d.apply(self.frame2.local_anchor_ground - self.lc_d);
            let r_b = q_b.apply(self.frame2.local_anchor_body - self.lc_b);
            self.jv_bd = self.ratio * u;
            self.jw_d = self.ratio * cross_vv(r_d, u);
            self.jw_b = self.ratio * cross_vv(r_b, u);
            self.mass += self.ratio * self.ratio * (self.m_d + self.m_b)
                + self.i_d * self.jw_d * self.jw_d
                + self.i_b * self.jw_b * self.jw_b;
        }

        self.mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };

        if data.step.warm_starting {
            v_a += self.m_a * self.impulse * self.jv_ac;
            w_a += self.i_a * self.impulse * self.jw_a;
            v_b += self.m_b * self.impulse * self.jv_bd;
            w_b += self.i_b * self.impulse * self.jw_b;
            v_c -= self.m_c * self.impulse * self.jv_ac;
            w_c -= self.i_c * self.impulse * self.jw_c;
            v_d -= self.m_d * self.impulse * self.jv_bd;
            w_d -= self.i_d * self.impulse * self.jw_d;
        } else {
            self.impulse = 0.0;
        }

        data.velocities[self.index_a].linear = v_a;
        data.velocities[self.index_a].angular = w_a;
        data.velocities[self.index_b].linear = v_b;
        data.velocities[self.index_b].angular = w_b;
        data.velocities[self.index_c].linear = v_c;
        data.velocities[self.index_c].angular = w_c;
        data.velocities[self.index_d].linear = v_d;
        data.velocities[self.index_d].angular = w_d;
    }

    pub fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let mut v_a = data.velocities[self.index_a].linear;
        let mut w_a = data.velocities[self.index_a].angular;
        let mut v_b = data.velocities[self.index_b].linear;
        let mut w_b = data.velocities[self.index_b].angular;
        let mut v_c = data.velocities[self.index_c].linear;
        let mut w_c = data.velocities[self.index_c].angular;
        let mut v_d = data.velocities[self.index_d].linear;
        let mut w_d = data.velocities[self.index_d].angular;

        let c_dot = self.jv_ac.dot(v_a - v_c) + self.jv_bd.dot(v_b - v_d)
            + (self.jw_a * w_a - self.jw_c * w_c)
            + (self.jw_b * w_b - self.jw_d * w_d);

        let impulse = -self.mass * c_dot;
        self.impulse += impulse;

        v_a += self.m_a * impulse * self.jv_ac;
        w_a += self.i_a * impulse * self.jw_a;
        v_b += self.m_b * impulse * self.jv_bd;
        w_b += self.i_b * impulse * self.jw_b;
        v_c -= self.m_c * impulse * self.jv_ac;
        w_c -= self.i_c * impulse * self.jw_c;
        v_d -= self.m_d * impulse * self.jv_bd;
        w_d -= self.i_d * impulse * self.jw_d;

        data.velocities[self.index_a].linear = v_a;
        data.velocities[self.index_a].angular = w_a;
        data.velocities[self.index_b].linear = v_b;
        data.velocities[self.index_b].angular = w_b;
        data.velocities[self.index_c].linear = v_c;
        data.velocities[self.index_c].angular = w_c;
        data.velocities[self.index_d].linear = v_d;
        data.velocities[self.index_d].angular = w_d;
    }

    pub fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        let mut c_a = data.positions[self.index_a].c;
        let mut a_a = data.positions[self.index_a].a;
        let mut c_b = data.positions[self.index_b].c;
        let mut a_b = data.positions[self.index_b].a;
        let mut c_c = data.positions[self.index_c].c;
        let mut a_c = data.positions[self.index_c].a;
        let mut c_d = data.positions[self.index_d].c;
        let mut a_d = data.positions[self.index_d].a;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);
        let q_c = Rot::new(a_c);
        let q_d = Rot::new(a_d);

        let linear_error = 0.0f32;

        let mut mass = 0.0;

        let (jv_ac, jw_a, jw_c, coordinate_a);
        if self.frame1.kind == SourceKind::Revolute {
            jv_ac = Vec2::ZERO;
            jw_a = 1.0;
            jw_c = 1.0;
            mass += self.i_a + self.i_c;
            coordinate_a = a_a - a_c - self.frame1.reference_angle;
        } else {
            let u = q_c.apply(self.frame1.local_axis);
            let r_c = q_c.apply(self.frame1.local_anchor_ground - self.lc_c);
            let r_a = q_a.apply(self.frame1.local_anchor_body - self.lc_a);
            jv_ac = u;
            jw_c = cross_vv(r_c, u);
            jw_a = cross_vv(r_a, u);
            mass += self.m_c + self.m_a + self.i_c * jw_c * jw_c + self.i_a * jw_a * jw_a;

            let p_c = self.frame1.local_anchor_ground - self.lc_c;
            let p_a = q_c.apply_inv(r_a + (c_a - c_c));
            coordinate_a = (p_a - p_c).dot(self.frame1.local_axis);
        }

        let (jv_bd, jw_b, jw_d, coordinate_b);
        if self.frame2.kind == SourceKind::Revolute {
            jv_bd = Vec2::ZERO;
            jw_b = self.ratio;
            jw_d = self.ratio;
            mass += self.ratio * self.ratio * (self.i_b + self.i_d);
            coordinate_b = a_b - a_d - self.frame2.reference_angle;
        } else {
            let u = q_d.apply(self.frame2.local_axis);
            let r_d = q_d.apply(self.frame2.local_anchor_ground - self.lc_d);
            let r_b = q_b.apply(self.frame2.local_anchor_body - self.lc_b);
            jv_bd = self.ratio * u;
            jw_d = self.ratio * cross_vv(r_d, u);
            jw_b = self.ratio * cross_vv(r_b, u);
            mass += self.ratio * self.ratio * (self.m_d + self.m_b)
                + self.i_d * jw_d * jw_d
                + self.i_b * jw_b * jw_b;

            let p_d = self.frame2.local_anchor_ground - self.lc_d;
            let p_b = q_d.apply_inv(r_b + (c_b - c_d));
            coordinate_b = (p_b - p_d).dot(self.frame2.local_axis);
        }

        let c = (coordinate_a + self.ratio * coordinate_b) - self.constant;

        let mut impulse = 0.0;
        if mass > 0.0 {
            impulse = -c / mass;
        }

        c_a += self.m_a * impulse * jv_ac;
        a_a += self.i_a * impulse * jw_a;
        c_b += self.m_b * impulse * jv_bd;
        a_b += self.i_b * impulse * jw_b;
        c_c -= self.m_c * impulse * jv_ac;
        a_c -= self.i_c * impulse * jw_c;
        c_d -= self.m_d * impulse * jv_bd;
        a_d -= self.i_d * impulse * jw_d;

        data.positions[self.index_a].c = c_a;
        data.positions[self.index_a].a = a_a;
        data.positions[self.index_b].c = c_b;
        data.positions[self.index_b].a = a_b;
        data.positions[self.index_c].c = c_c;
        data.positions[self.index_c].a = a_c;
        data.positions[self.index_d].c = c_d;
        data.positions[self.index_d].a = a_d;

        linear_error < crate::config::LINEAR_SLOP
    }
}
