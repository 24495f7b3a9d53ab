//! Island solver: a connected component of the contact+joint graph solved
//! as one unit with its own scratch position/velocity arrays.

use glam::Vec2;

use crate::{
    collision::contact::{Contact, ContactImpulse},
    config::{
        ANGULAR_SLEEP_TOLERANCE, LINEAR_SLEEP_TOLERANCE, TIME_TO_SLEEP,
    },
    core::{
        body::{BodyType, RigidBody},
        fixture::Fixture,
        types::{Position, Velocity},
    },
    dynamics::{
        contact_solver::ContactSolver, integrator::Integrator, joints::Joint, SolverData, TimeStep,
    },
    utils::allocator::{Arena, EntityId},
};

/// Bounded working set for one island. Exceeding a capacity is a
/// programmer error in the flood fill, not a runtime condition.
pub struct Island {
    pub bodies: Vec<EntityId>,
    pub contacts: Vec<EntityId>,
    pub joints: Vec<EntityId>,

    positions: Vec<Position>,
    velocities: Vec<Velocity>,

    body_capacity: usize,
    contact_capacity: usize,
    joint_capacity: usize,
}

impl Island {
    pub fn new(body_capacity: usize, contact_capacity: usize, joint_capacity: usize) -> Self {
        Self {
            bodies: Vec::with_capacity(body_capacity),
            contacts: Vec::with_capacity(contact_capacity),
            joints: Vec::with_capacity(joint_capacity),
            positions: Vec::with_capacity(body_capacity),
            velocities: Vec::with_capacity(body_capacity),
            body_capacity,
            contact_capacity,
            joint_capacity,
        }
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
    }

    /// Adds a body and assigns its island index.
    pub fn add_body(&mut self, id: EntityId, body: &mut RigidBody) {
        assert!(self.bodies.len() < self.body_capacity, "island body overflow");
        body.island_index = self.bodies.len();
        self.bodies.push(id);
    }

    pub fn add_contact(&mut self, id: EntityId) {
        assert!(
            self.contacts.len() < self.contact_capacity,
            "island contact overflow"
        );
        self.contacts.push(id);
    }

    pub fn add_joint(&mut self, id: EntityId) {
        assert!(self.joints.len() < self.joint_capacity, "island joint overflow");
        self.joints.push(id);
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Full discrete solve: integrate velocities, iterate velocity
    /// constraints, integrate positions, iterate position constraints,
    /// write back, and update sleep timers. Returns the per-contact
    /// impulses for PostSolve reporting.
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        &mut self,
        bodies: &mut Arena<RigidBody>,
        fixtures: &Arena<Fixture>,
        contacts: &mut Arena<Contact>,
        joints: &mut Arena<Joint>,
        step: &TimeStep,
        gravity: Vec2,
        allow_sleep: bool,
    ) -> Vec<(EntityId, ContactImpulse)> {
        let h = step.dt;

        self.positions.clear();
        self.velocities.clear();

        // Integrate velocities and stash the sweep start for TOI.
        for &body_id in &self.bodies {
            let body = bodies.get_mut(body_id).expect("island body missing");

            let c = body.sweep.c;
            let a = body.sweep.a;
            let mut velocity = Velocity {
                linear: body.linear_velocity,
                angular: body.angular_velocity,
            };

            body.sweep.c0 = c;
            body.sweep.a0 = a;

            Integrator::integrate_velocity(body, &mut velocity, gravity, h);

            self.positions.push(Position { c, a });
            self.velocities.push(velocity);
        }

        let mut contact_solver =
            ContactSolver::new(step, &self.contacts, contacts, fixtures, bodies);
        contact_solver.initialize_velocity_constraints(&self.positions, &self.velocities);
        if step.warm_starting {
            contact_solver.warm_start(&mut self.velocities);
        }

        {
            let mut data = SolverData {
                step: *step,
                positions: &mut self.positions,
                velocities: &mut self.velocities,
            };
            for &joint_id in &self.joints {
                let joint = joints.get_mut(joint_id).expect("island joint missing");
                joint.init_velocity_constraints(bodies, &mut data);
            }

            for _ in 0..step.velocity_iterations {
                for &joint_id in &self.joints {
                    let joint = joints.get_mut(joint_id).expect("island joint missing");
                    joint.solve_velocity_constraints(&mut data);
                }
                contact_solver.solve_velocity_constraints(data.velocities);
            }
        }

        // Keep the impulses for the next step's warm start.
        contact_solver.store_impulses(contacts);

        for i in 0..self.bodies.len() {
            Integrator::integrate_position(&mut self.positions[i], &mut self.velocities[i], h);
        }

        // Relax positions until both contacts and joints settle.
        let mut position_solved = false;
        for _ in 0..step.position_iterations {
            let contacts_okay = contact_solver.solve_position_constraints(&mut self.positions);

            let mut joints_okay = true;
            {
                let mut data = SolverData {
                    step: *step,
                    positions: &mut self.positions,
                    velocities: &mut self.velocities,
                };
                for &joint_id in &self.joints {
                    let joint = joints.get_mut(joint_id).expect("island joint missing");
                    let joint_okay = joint.solve_position_constraints(&mut data);
                    joints_okay = joints_okay && joint_okay;
                }
            }

            if contacts_okay && joints_okay {
                position_solved = true;
                break;
            }
        }

        // Copy scratch state back to the bodies.
        for (i, &body_id) in self.bodies.iter().enumerate() {
            let body = bodies.get_mut(body_id).expect("island body missing");
            body.sweep.c = self.positions[i].c;
            body.sweep.a = self.positions[i].a;
            body.linear_velocity = self.velocities[i].linear;
            body.angular_velocity = self.velocities[i].angular;
            body.synchronize_transform();
        }

        if allow_sleep {
            let mut min_sleep_time = f32::MAX;

            let lin_tol_sqr = LINEAR_SLEEP_TOLERANCE * LINEAR_SLEEP_TOLERANCE;
            let ang_tol_sqr = ANGULAR_SLEEP_TOLERANCE * ANGULAR_SLEEP_TOLERANCE;

            for &body_id in &self.bodies {
                let body = bodies.get_mut(body_id).expect("island body missing");
                if body.body_type == BodyType::Static {
                    continue;
                }

                if !body.auto_sleep
                    || body.angular_velocity * body.angular_velocity > ang_tol_sqr
                    || body.linear_velocity.length_squared() > lin_tol_sqr
                {
                    body.sleep_time = 0.0;
                    min_sleep_time = 0.0;
                } else {
                    body.sleep_time += h;
                    min_sleep_time = min_sleep_time.min(body.sleep_time);
                }
            }

            if min_sleep_time >= TIME_TO_SLEEP && position_solved {
                for &body_id in &self.bodies {
                    let body = bodies.get_mut(body_id).expect("island body missing");
                    body.set_awake(false);
                }
            }
        }

        contact_solver.impulses().collect()
    }

    /// TOI sub-step solve for a two-body mini island: position-first with
    /// the stiffer TOI Baumgarte, then velocities without warm starting.
    #[allow(clippy::too_many_arguments)]
    pub fn solve_toi(
        &mut self,
        bodies: &mut Arena<RigidBody>,
        fixtures: &Arena<Fixture>,
        contacts: &mut Arena<Contact>,
        step: &TimeStep,
        toi_index_a: usize,
        toi_index_b: usize,
    ) -> Vec<(EntityId, ContactImpulse)> {
        debug_assert!(toi_index_a < self.bodies.len());
        debug_assert!(toi_index_b < self.bodies.len());

        self.positions.clear();
        self.velocities.clear();
        for &body_id in &self.bodies {
            let body = bodies.get(body_id).expect("island body missing");
            self.positions.push(Position {
                c: body.sweep.c,
                a: body.sweep.a,
            });
            self.velocities.push(Velocity {
                linear: body.linear_velocity,
                angular: body.angular_velocity,
            });
        }

        let mut contact_solver =
            ContactSolver::new(step, &self.contacts, contacts, fixtures, bodies);

        // Resolve the overlap at the impact position.
        for _ in 0..step.position_iterations {
            if contact_solver.solve_toi_position_constraints(
                &mut self.positions,
                toi_index_a,
                toi_index_b,
            ) {
                break;
            }
        }

        // The TOI bodies restart their sweeps from the corrected pose.
        {
            let body_id = self.bodies[toi_index_a];
            let body = bodies.get_mut(body_id).expect("island body missing");
            body.sweep.c0 = self.positions[toi_index_a].c;
            body.sweep.a0 = self.positions[toi_index_a].a;
        }
        {
            let body_id = self.bodies[toi_index_b];
            let body = bodies.get_mut(body_id).expect("island body missing");
            body.sweep.c0 = self.positions[toi_index_b].c;
            body.sweep.a0 = self.positions[toi_index_b].a;
        }

        // No warm starting: TOI impulses can be enormous and would poison
        // the persistent manifold state.
        contact_solver.initialize_velocity_constraints(&self.positions, &self.velocities);

        for _ in 0..step.velocity_iterations {
            contact_solver.solve_velocity_constraints(&mut self.velocities);
        }

        let h = step.dt;
        for i in 0..self.bodies.len() {
            Integrator::integrate_position(&mut self.positions[i], &mut self.velocities[i], h);
        }

        for (i, &body_id) in self.bodies.iter().enumerate() {
            let body = bodies.get_mut(body_id).expect("island body missing");
            body.sweep.c = self.positions[i].c;
            body.sweep.a = self.positions[i].a;
            body.linear_velocity = self.velocities[i].linear;
            body.angular_velocity = self.velocities[i].angular;
            body.synchronize_transform();
        }

        contact_solver.impulses().collect()
    }
}
