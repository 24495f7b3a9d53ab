//! Sequential-impulses contact solver: velocity constraints with warm
//! starting and an optional 2×2 block solve, plus the non-linear position
//! correction passes.

use glam::{Mat2, Vec2};

use crate::{
    collision::{
        contact::Contact,
        narrowphase::{Manifold, ManifoldKind, WorldManifold},
    },
    config::{
        BAUMGARTE, LINEAR_SLOP, MAX_LINEAR_CORRECTION, MAX_MANIFOLD_POINTS, TOI_BAUMGARTE,
    },
    core::{
        body::RigidBody,
        fixture::Fixture,
        types::{cross_sv, cross_vs, cross_vv, Position, Rot, Transform, Velocity},
    },
    dynamics::TimeStep,
    utils::allocator::{Arena, EntityId},
};

/// Toggle for the coupled 2-point normal solve. Pointwise iteration is the
/// fallback when the block matrix is ill-conditioned.
const BLOCK_SOLVE: bool = true;

#[derive(Debug, Clone, Copy, Default)]
struct VelocityConstraintPoint {
    r_a: Vec2,
    r_b: Vec2,
    normal_impulse: f32,
    tangent_impulse: f32,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
}

#[derive(Debug, Clone)]
struct ContactVelocityConstraint {
    points: [VelocityConstraintPoint; MAX_MANIFOLD_POINTS],
    normal: Vec2,
    normal_mass: Mat2,
    k: Mat2,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    friction: f32,
    restitution: f32,
    restitution_threshold: f32,
    tangent_speed: f32,
    point_count: usize,
    contact: EntityId,
}

#[derive(Debug, Clone)]
struct ContactPositionConstraint {
    local_points: [Vec2; MAX_MANIFOLD_POINTS],
    local_normal: Vec2,
    local_point: Vec2,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f32,
    inv_mass_b: f32,
    local_center_a: Vec2,
    local_center_b: Vec2,
    inv_i_a: f32,
    inv_i_b: f32,
    kind: ManifoldKind,
    radius_a: f32,
    radius_b: f32,
    point_count: usize,
}

pub struct ContactSolver {
    velocity_constraints: Vec<ContactVelocityConstraint>,
    position_constraints: Vec<ContactPositionConstraint>,
}

impl ContactSolver {
    /// Gathers constraint seeds for the island's contacts. Warm-started
    /// impulses are scaled by `dt_ratio` so a variable timestep does not
    /// inject energy.
    pub fn new(
        step: &TimeStep,
        contact_ids: &[EntityId],
        contacts: &Arena<Contact>,
        fixtures: &Arena<Fixture>,
        bodies: &Arena<RigidBody>,
    ) -> Self {
        let mut velocity_constraints = Vec::with_capacity(contact_ids.len());
        let mut position_constraints = Vec::with_capacity(contact_ids.len());

        for &contact_id in contact_ids {
            let contact = contacts.get(contact_id).expect("island contact missing");
            let fixture_a = fixtures.get(contact.fixture_a).expect("fixture missing");
            let fixture_b = fixtures.get(contact.fixture_b).expect("fixture missing");
            let body_a = bodies.get(fixture_a.body_id()).expect("body missing");
            let body_b = bodies.get(fixture_b.body_id()).expect("body missing");

            let manifold = contact.manifold();
            debug_assert!(manifold.point_count > 0);

            let mut vc = ContactVelocityConstraint {
                points: [VelocityConstraintPoint::default(); MAX_MANIFOLD_POINTS],
                normal: Vec2::ZERO,
                normal_mass: Mat2::ZERO,
                k: Mat2::ZERO,
                index_a: body_a.island_index,
                index_b: body_b.island_index,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                friction: contact.friction,
                restitution: contact.restitution,
                restitution_threshold: contact.restitution_threshold,
                tangent_speed: contact.tangent_speed,
                point_count: manifold.point_count,
                contact: contact_id,
            };

            let pc = ContactPositionConstraint {
                local_points: {
                    let mut pts = [Vec2::ZERO; MAX_MANIFOLD_POINTS];
                    for (i, p) in manifold.points.iter().take(manifold.point_count).enumerate() {
                        pts[i] = p.local_point;
                    }
                    pts
                },
                local_normal: manifold.local_normal,
                local_point: manifold.local_point,
                index_a: body_a.island_index,
                index_b: body_b.island_index,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                local_center_a: body_a.local_center(),
                local_center_b: body_b.local_center(),
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                kind: manifold.kind,
                radius_a: fixture_a.shape.radius(),
                radius_b: fixture_b.shape.radius(),
                point_count: manifold.point_count,
            };

            for (i, cp) in manifold.points.iter().take(manifold.point_count).enumerate() {
                let vcp = &mut vc.points[i];
                if step.warm_starting {
                    vcp.normal_impulse = step.dt_ratio * cp.normal_impulse;
                    vcp.tangent_impulse = step.dt_ratio * cp.tangent_impulse;
                }
            }

            velocity_constraints.push(vc);
            position_constraints.push(pc);
        }

        Self {
            velocity_constraints,
            position_constraints,
        }
    }

    /// Computes contact frames, effective masses, restitution bias, and
    /// the optional block matrix from the current solver state.
    pub fn initialize_velocity_constraints(
        &mut self,
        positions: &[Position],
        velocities: &[Velocity],
    ) {
        const MAX_CONDITION_NUMBER: f32 = 1000.0;

        for (vc, pc) in self
            .velocity_constraints
            .iter_mut()
            .zip(self.position_constraints.iter())
        {
            let radius_a = pc.radius_a;
            let radius_b = pc.radius_b;

            let index_a = vc.index_a;
            let index_b = vc.index_b;

            let c_a = positions[index_a].c;
            let a_a = positions[index_a].a;
            let v_a = velocities[index_a].linear;
            let w_a = velocities[index_a].angular;

            let c_b = positions[index_b].c;
            let a_b = positions[index_b].a;
            let v_b = velocities[index_b].linear;
            let w_b = velocities[index_b].angular;

            let q_a = Rot::new(a_a);
            let q_b = Rot::new(a_b);
            let xf_a = Transform {
                p: c_a - q_a.apply(pc.local_center_a),
                q: q_a,
            };
            let xf_b = Transform {
                p: c_b - q_b.apply(pc.local_center_b),
                q: q_b,
            };

            let manifold = Manifold {
                points: {
                    let mut pts = [crate::collision::narrowphase::ManifoldPoint::default();
                        MAX_MANIFOLD_POINTS];
                    for i in 0..pc.point_count {
                        pts[i].local_point = pc.local_points[i];
                    }
                    pts
                },
                local_normal: pc.local_normal,
                local_point: pc.local_point,
                kind: pc.kind,
                point_count: pc.point_count,
            };
            let world_manifold =
                WorldManifold::initialize(&manifold, &xf_a, radius_a, &xf_b, radius_b);

            vc.normal = world_manifold.normal;

            for i in 0..vc.point_count {
                let vcp = &mut vc.points[i];

                vcp.r_a = world_manifold.points[i] - c_a;
                vcp.r_b = world_manifold.points[i] - c_b;

                let rn_a = cross_vv(vcp.r_a, vc.normal);
                let rn_b = cross_vv(vcp.r_b, vc.normal);

                let k_normal =
                    vc.inv_mass_a + vc.inv_mass_b + vc.inv_i_a * rn_a * rn_a + vc.inv_i_b * rn_b * rn_b;
                vcp.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

                let tangent = cross_vs(vc.normal, 1.0);

                let rt_a = cross_vv(vcp.r_a, tangent);
                let rt_b = cross_vv(vcp.r_b, tangent);

                let k_tangent =
                    vc.inv_mass_a + vc.inv_mass_b + vc.inv_i_a * rt_a * rt_a + vc.inv_i_b * rt_b * rt_b;
                vcp.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

                // Restitution bias from the approach speed.
                vcp.velocity_bias = 0.0;
                let v_rel = vc.normal.dot(
                    v_b + cross_sv(w_b, vcp.r_b) - v_a - cross_sv(w_a, vcp.r_a),
                );
                if v_rel < -vc.restitution_threshold {
                    vcp.velocity_bias = -vc.restitution * v_rel;
                }
            }

            // Couple the two points when the block matrix is invertible
            // with an acceptable condition number.
            if vc.point_count == 2 && BLOCK_SOLVE {
                let vcp1 = vc.points[0];
                let vcp2 = vc.points[1];

                let rn1_a = cross_vv(vcp1.r_a, vc.normal);
                let rn1_b = cross_vv(vcp1.r_b, vc.normal);
                let rn2_a = cross_vv(vcp2.r_a, vc.normal);
                let rn2_b = cross_vv(vcp2.r_b, vc.normal);

                let k11 = vc.inv_mass_a
                    + vc.inv_mass_b
                    + vc.inv_i_a * rn1_a * rn1_a
                    + vc.inv_i_b * rn1_b * rn1_b;
                let k22 = vc.inv_mass_a
                    + vc.inv_mass_b
                    + vc.inv_i_a * rn2_a * rn2_a
                    + vc.inv_i_b * rn2_b * rn2_b;
                let k12 = vc.inv_mass_a
                    + vc.inv_mass_b
                    + vc.inv_i_a * rn1_a * rn2_a
                    + vc.inv_i_b * rn1_b * rn2_b;

                if k11 * k11 < MAX_CONDITION_NUMBER * (k11 * k22 - k12 * k12) {
                    vc.k = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22));
                    vc.normal_mass = vc.k.inverse();
                } else {
                    // Nearly singular: solve the points one at a time.
                    vc.point_count = 1;
                }
            }
        }
    }

    /// Applies the carried-over impulses before iterating.
    pub fn warm_start(&mut self, velocities: &mut [Velocity]) {
        for vc in &self.velocity_constraints {
            let index_a = vc.index_a;
            let index_b = vc.index_b;
            let inv_mass_a = vc.inv_mass_a;
            let inv_i_a = vc.inv_i_a;
            let inv_mass_b = vc.inv_mass_b;
            let inv_i_b = vc.inv_i_b;

            let mut v_a = velocities[index_a].linear;
            let mut w_a = velocities[index_a].angular;
            let mut v_b = velocities[index_b].linear;
            let mut w_b = velocities[index_b].angular;

            let normal = vc.normal;
            let tangent = cross_vs(normal, 1.0);

            for vcp in vc.points.iter().take(vc.point_count) {
                let p = vcp.normal_impulse * normal + vcp.tangent_impulse * tangent;
                w_a -= inv_i_a * cross_vv(vcp.r_a, p);
                v_a -= inv_mass_a * p;
                w_b += inv_i_b * cross_vv(vcp.r_b, p);
                v_b += inv_mass_b * p;
            }

            velocities[index_a].linear = v_a;
            velocities[index_a].angular = w_a;
            velocities[index_b].linear = v_b;
            velocities[index_b].angular = w_b;
        }
    }

    /// One Gauss–Seidel sweep: friction impulses first, then normal
    /// impulses (pointwise or the 2×2 block enumeration).
    pub fn solve_velocity_constraints(&mut self, velocities: &mut [Velocity]) {
        for vc in self.velocity_constraints.iter_mut() {
            let index_a = vc.index_a;
            let index_b = vc.index_b;
            let inv_mass_a = vc.inv_mass_a;
            let inv_i_a = vc.inv_i_a;
            let inv_mass_b = vc.inv_mass_b;
            let inv_i_b = vc.inv_i_b;

            let mut v_a = velocities[index_a].linear;
            let mut w_a = velocities[index_a].angular;
            let mut v_b = velocities[index_b].linear;
            let mut w_b = velocities[index_b].angular;

            let normal = vc.normal;
            let tangent = cross_vs(normal, 1.0);
            let friction = vc.friction;

            debug_assert!(vc.point_count == 1 || vc.point_count == 2);

            // Friction, using the most recent normal impulse as the cone
            // bound.
            for vcp in vc.points.iter_mut().take(vc.point_count) {
                let dv = v_b + cross_sv(w_b, vcp.r_b) - v_a - cross_sv(w_a, vcp.r_a);

                let vt = dv.dot(tangent) - vc.tangent_speed;
                let mut lambda = vcp.tangent_mass * (-vt);

                // Accumulated clamping against the friction cone.
                let max_friction = friction * vcp.normal_impulse;
                let new_impulse =
                    (vcp.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                lambda = new_impulse - vcp.tangent_impulse;
                vcp.tangent_impulse = new_impulse;

                let p = lambda * tangent;

                v_a -= inv_mass_a * p;
                w_a -= inv_i_a * cross_vv(vcp.r_a, p);
                v_b += inv_mass_b * p;
                w_b += inv_i_b * cross_vv(vcp.r_b, p);
            }

            if vc.point_count == 1 || !BLOCK_SOLVE {
                for vcp in vc.points.iter_mut().take(vc.point_count) {
                    let dv = v_b + cross_sv(w_b, vcp.r_b) - v_a - cross_sv(w_a, vcp.r_a);

                    let vn = dv.dot(normal);
                    let mut lambda = -vcp.normal_mass * (vn - vcp.velocity_bias);

                    // Accumulated clamping: total impulse stays repulsive.
                    let new_impulse = (vcp.normal_impulse + lambda).max(0.0);
                    lambda = new_impulse - vcp.normal_impulse;
                    vcp.normal_impulse = new_impulse;

                    let p = lambda * normal;
                    v_a -= inv_mass_a * p;
                    w_a -= inv_i_a * cross_vv(vcp.r_a, p);
                    v_b += inv_mass_b * p;
                    w_b += inv_i_b * cross_vv(vcp.r_b, p);
                }
            } else {
                // 2-point block solve: enumerate the four complementarity
                // cases of `vn = A·x + b, x >= 0, vn >= 0, x·vn = 0` and
                // accept the first consistent one.
                let cp1_ra = vc.points[0].r_a;
                let cp1_rb = vc.points[0].r_b;
                let cp2_ra = vc.points[1].r_a;
                let cp2_rb = vc.points[1].r_b;

                let a = Vec2::new(vc.points[0].normal_impulse, vc.points[1].normal_impulse);
                debug_assert!(a.x >= 0.0 && a.y >= 0.0);

                let dv1 = v_b + cross_sv(w_b, cp1_rb) - v_a - cross_sv(w_a, cp1_ra);
                let dv2 = v_b + cross_sv(w_b, cp2_rb) - v_a - cross_sv(w_a, cp2_ra);

                let mut b = Vec2::new(dv1.dot(normal), dv2.dot(normal));
                b.x -= vc.points[0].velocity_bias;
                b.y -= vc.points[1].velocity_bias;

                // Remove the contribution of the accumulated impulse so the
                // cases solve for the total impulse directly.
                b -= vc.k * a;

                loop {
                    // Case 1: both points remain in contact.
                    let mut x = -(vc.normal_mass * b);
                    if x.x >= 0.0 && x.y >= 0.0 {
                        let d = x - a;
                        let p1 = d.x * normal;
                        let p2 = d.y * normal;
                        v_a -= inv_mass_a * (p1 + p2);
                        w_a -= inv_i_a * (cross_vv(cp1_ra, p1) + cross_vv(cp2_ra, p2));
                        v_b += inv_mass_b * (p1 + p2);
                        w_b += inv_i_b * (cross_vv(cp1_rb, p1) + cross_vv(cp2_rb, p2));

                        vc.points[0].normal_impulse = x.x;
                        vc.points[1].normal_impulse = x.y;
                        break;
                    }

                    // Case 2: point 1 in contact, point 2 separating.
                    x.x = -vc.points[0].normal_mass * b.x;
                    x.y = 0.0;
                    let vn2 = vc.k.x_axis.y * x.x + b.y;
                    if x.x >= 0.0 && vn2 >= 0.0 {
                        let d = x - a;
                        let p1 = d.x * normal;
                        let p2 = d.y * normal;
                        v_a -= inv_mass_a * (p1 + p2);
                        w_a -= inv_i_a * (cross_vv(cp1_ra, p1) + cross_vv(cp2_ra, p2));
                        v_b += inv_mass_b * (p1 + p2);
                        w_b += inv_i_b * (cross_vv(cp1_rb, p1) + cross_vv(cp2_rb, p2));

                        vc.points[0].normal_impulse = x.x;
                        vc.points[1].normal_impulse = x.y;
                        break;
                    }

                    // Case 3: point 2 in contact, point 1 separating.
                    x.x = 0.0;
                    x.y = -vc.points[1].normal_mass * b.y;
                    let vn1 = vc.k.y_axis.x * x.y + b.x;
                    if x.y >= 0.0 && vn1 >= 0.0 {
                        let d = x - a;
                        let p1 = d.x * normal;
                        let p2 = d.y * normal;
                        v_a -= inv_mass_a * (p1 + p2);
                        w_a -= inv_i_a * (cross_vv(cp1_ra, p1) + cross_vv(cp2_ra, p2));
                        v_b += inv_mass_b * (p1 + p2);
                        w_b += inv_i_b * (cross_vv(cp1_rb, p1) + cross_vv(cp2_rb, p2));

                        vc.points[0].normal_impulse = x.x;
                        vc.points[1].normal_impulse = x.y;
                        break;
                    }

                    // Case 4: both separating.
                    x.x = 0.0;
                    x.y = 0.0;
                    let vn1 = b.x;
                    let vn2 = b.y;
                    if vn1 >= 0.0 && vn2 >= 0.0 {
                        let d = x - a;
                        let p1 = d.x * normal;
                        let p2 = d.y * normal;
                        v_a -= inv_mass_a * (p1 + p2);
                        w_a -= inv_i_a * (cross_vv(cp1_ra, p1) + cross_vv(cp2_ra, p2));
                        v_b += inv_mass_b * (p1 + p2);
                        w_b += inv_i_b * (cross_vv(cp1_rb, p1) + cross_vv(cp2_rb, p2));

                        vc.points[0].normal_impulse = x.x;
                        vc.points[1].normal_impulse = x.y;
                        break;
                    }

                    // No consistent case; give up and keep the accumulated
                    // impulse as-is.
                    break;
                }
            }

            velocities[index_a].linear = v_a;
            velocities[index_a].angular = w_a;
            velocities[index_b].linear = v_b;
            velocities[index_b].angular = w_b;
        }
    }

    /// Writes accumulated impulses back into the contact manifolds so the
    /// next step warm starts from them.
    pub fn store_impulses(&self, contacts: &mut Arena<Contact>) {
        for vc in &self.velocity_constraints {
            let contact = contacts.get_mut(vc.contact).expect("island contact missing");
            for i in 0..vc.point_count {
                contact.manifold.points[i].normal_impulse = vc.points[i].normal_impulse;
                contact.manifold.points[i].tangent_impulse = vc.points[i].tangent_impulse;
            }
        }
    }

    /// Per-point impulses for the PostSolve report.
    pub fn impulses(&self) -> impl Iterator<Item = (EntityId, crate::collision::contact::ContactImpulse)> + '_ {
        self.velocity_constraints.iter().map(|vc| {
            let mut impulse = crate::collision::contact::ContactImpulse {
                count: vc.point_count,
                ..Default::default()
            };
            for i in 0..vc.point_count {
                impulse.normal_impulses[i] = vc.points[i].normal_impulse;
                impulse.tangent_impulses[i] = vc.points[i].tangent_impulse;
            }
            (vc.contact, impulse)
        })
    }

    /// Discrete position correction. Returns true once the deepest
    /// penetration is within `3 · LINEAR_SLOP`.
    pub fn solve_position_constraints(&self, positions: &mut [Position]) -> bool {
        self.solve_position_constraints_inner(positions, BAUMGARTE, None)
    }

    /// TOI position correction: only the two TOI bodies get mass; other
    /// island bodies act as anchors. Converges at `1.5 · LINEAR_SLOP`.
    pub fn solve_toi_position_constraints(
        &self,
        positions: &mut [Position],
        toi_index_a: usize,
        toi_index_b: usize,
    ) -> bool {
        self.solve_position_constraints_inner(
            positions,
            TOI_BAUMGARTE,
            Some((toi_index_a, toi_index_b)),
        )
    }

    fn solve_position_constraints_inner(
        &self,
        positions: &mut [Position],
        baumgarte: f32,
        toi_indices: Option<(usize, usize)>,
    ) -> bool {
        let mut min_separation = 0.0f32;

        for pc in &self.position_constraints {
            let index_a = pc.index_a;
            let index_b = pc.index_b;
            let local_center_a = pc.local_center_a;
            let local_center_b = pc.local_center_b;

            let (mut inv_mass_a, mut inv_i_a) = (pc.inv_mass_a, pc.inv_i_a);
            let (mut inv_mass_b, mut inv_i_b) = (pc.inv_mass_b, pc.inv_i_b);
            if let Some((toi_a, toi_b)) = toi_indices {
                if index_a != toi_a && index_a != toi_b {
                    inv_mass_a = 0.0;
                    inv_i_a = 0.0;
                }
                if index_b != toi_a && index_b != toi_b {
                    inv_mass_b = 0.0;
                    inv_i_b = 0.0;
                }
            }

            let mut c_a = positions[index_a].c;
            let mut a_a = positions[index_a].a;
            let mut c_b = positions[index_b].c;
            let mut a_b = positions[index_b].a;

            for point_index in 0..pc.point_count {
                let q_a = Rot::new(a_a);
                let q_b = Rot::new(a_b);
                let xf_a = Transform {
                    p: c_a - q_a.apply(local_center_a),
                    q: q_a,
                };
                let xf_b = Transform {
                    p: c_b - q_b.apply(local_center_b),
                    q: q_b,
                };

                let (normal, point, separation) =
                    position_solver_manifold(pc, &xf_a, &xf_b, point_index);

                let r_a = point - c_a;
                let r_b = point - c_b;

                min_separation = min_separation.min(separation);

                // Clamped Baumgarte correction to avoid overshoot.
                let c = (baumgarte * (separation + LINEAR_SLOP))
                    .clamp(-MAX_LINEAR_CORRECTION, 0.0);

                let rn_a = cross_vv(r_a, normal);
                let rn_b = cross_vv(r_b, normal);
                let k =
                    inv_mass_a + inv_mass_b + inv_i_a * rn_a * rn_a + inv_i_b * rn_b * rn_b;

                let impulse = if k > 0.0 { -c / k } else { 0.0 };
                let p = impulse * normal;

                c_a -= inv_mass_a * p;
                a_a -= inv_i_a * cross_vv(r_a, p);
                c_b += inv_mass_b * p;
                a_b += inv_i_b * cross_vv(r_b, p);
            }

            positions[index_a].c = c_a;
            positions[index_a].a = a_a;
            positions[index_b].c = c_b;
            positions[index_b].a = a_b;
        }

        let tolerance = if toi_indices.is_some() {
            -1.5 * LINEAR_SLOP
        } else {
            -3.0 * LINEAR_SLOP
        };
        min_separation >= tolerance
    }
}

/// Reconstructs the world contact point, normal, and separation for one
/// manifold point from the stored local form.
fn position_solver_manifold(
    pc: &ContactPositionConstraint,
    xf_a: &Transform,
    xf_b: &Transform,
    index: usize,
) -> (Vec2, Vec2, f32) {
    debug_assert!(pc.point_count > 0);

    match pc.kind {
        ManifoldKind::Circles => {
            let point_a = xf_a.apply(pc.local_point);
            let point_b = xf_b.apply(pc.local_points[0]);
            let normal = (point_b - point_a).normalize_or_zero();
            let point = 0.5 * (point_a + point_b);
            let separation = (point_b - point_a).length() - pc.radius_a - pc.radius_b;
            (normal, point, separation)
        }
        ManifoldKind::FaceA => {
            let normal = xf_a.q.apply(pc.local_normal);
            let plane_point = xf_a.apply(pc.local_point);

            let clip_point = xf_b.apply(pc.local_points[index]);
            let separation =
                (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, clip_point, separation)
        }
        ManifoldKind::FaceB => {
            let normal = xf_b.q.apply(pc.local_normal);
            let plane_point = xf_b.apply(pc.local_point);

            let clip_point = xf_a.apply(pc.local_points[index]);
            let separation =
                (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            // Report the normal from A to B.
            (-normal, clip_point, separation)
        }
    }
}
