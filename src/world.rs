//! Central simulation container orchestrating all subsystems: body,
//! fixture, and joint lifecycles, the contact graph, the island solver,
//! and the continuous-collision sub-stepper.

use glam::Vec2;
use log::debug;
use std::time::Instant;

use crate::{
    collision::{
        broadphase::BroadPhase,
        contact::{Contact, ContactFilter, ContactListener, DefaultContactFilter, DestructionListener},
        queries::{Aabb, RayCastInput, RaycastHit, RaycastQuery},
        shapes::DistanceProxy,
        toi::{time_of_impact, ToiInput, ToiState},
    },
    config::{self, DEFAULT_GRAVITY, MAX_SUB_STEPS, MAX_TOI_CONTACTS},
    core::{
        body::{BodyDef, BodyType, ContactEdge, JointEdge, RigidBody},
        fixture::{Fixture, FixtureDef, ProxyKey},
        types::MassData,
    },
    dynamics::{
        island::Island,
        joints::{GearJoint, Joint, JointDef},
        TimeStep,
    },
    utils::{
        allocator::{Arena, EntityId},
        profiling::StepProfile,
    },
};

/// Central physics world. All entities live in generational arenas and
/// are addressed by stable [`EntityId`]s.
pub struct PhysicsWorld {
    pub(crate) bodies: Arena<RigidBody>,
    pub(crate) fixtures: Arena<Fixture>,
    pub(crate) joints: Arena<Joint>,
    pub(crate) contacts: Arena<Contact>,
    broadphase: BroadPhase<ProxyKey>,

    gravity: Vec2,
    allow_sleep: bool,
    warm_starting: bool,
    continuous_physics: bool,
    auto_clear_forces: bool,

    locked: bool,
    new_contacts: bool,
    inv_dt0: f32,

    listener: Option<Box<dyn ContactListener>>,
    filter: Box<dyn ContactFilter>,
    destruction_listener: Option<Box<dyn DestructionListener>>,

    pub profile: StepProfile,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self::builder().gravity(gravity).build()
    }

    pub fn builder() -> PhysicsWorldBuilder {
        PhysicsWorldBuilder::new()
    }

    /// Engine version; a structural identity, not a wire format.
    pub fn version(&self) -> config::Version {
        config::VERSION
    }
}

pub struct PhysicsWorldBuilder {
    gravity: Vec2,
    allow_sleep: bool,
    warm_starting: bool,
    continuous_physics: bool,
    auto_clear_forces: bool,
}

impl Default for PhysicsWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorldBuilder {
    pub fn new() -> Self {
        Self {
            gravity: Vec2::from_slice(&DEFAULT_GRAVITY),
            allow_sleep: true,
            warm_starting: true,
            continuous_physics: true,
            auto_clear_forces: true,
        }
    }

    pub fn gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    pub fn warm_starting(mut self, enabled: bool) -> Self {
        self.warm_starting = enabled;
        self
    }

    pub fn continuous_physics(mut self, enabled: bool) -> Self {
        self.continuous_physics = enabled;
        self
    }

    pub fn auto_clear_forces(mut self, enabled: bool) -> Self {
        self.auto_clear_forces = enabled;
        self
    }

    pub fn build(self) -> PhysicsWorld {
        PhysicsWorld {
            bodies: Arena::new(),
            fixtures: Arena::new(),
            joints: Arena::new(),
            contacts: Arena::new(),
            broadphase: BroadPhase::new(),
            gravity: self.gravity,
            allow_sleep: self.allow_sleep,
            warm_starting: self.warm_starting,
            continuous_physics: self.continuous_physics,
            auto_clear_forces: self.auto_clear_forces,
            locked: false,
            new_contacts: false,
            inv_dt0: 0.0,
            listener: None,
            filter: Box::new(DefaultContactFilter),
            destruction_listener: None,
            profile: StepProfile::default(),
        }
    }
}

impl PhysicsWorld {
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn set_contact_listener<L: ContactListener + 'static>(&mut self, listener: L) {
        self.listener = Some(Box::new(listener));
    }

    pub fn set_contact_filter<F: ContactFilter + 'static>(&mut self, filter: F) {
        self.filter = Box::new(filter);
    }

    pub fn set_destruction_listener<L: DestructionListener + 'static>(&mut self, listener: L) {
        self.destruction_listener = Some(Box::new(listener));
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn awake_body_count(&self) -> usize {
        self.bodies.iter().filter(|(_, b)| b.is_awake()).count()
    }

    pub fn body(&self, id: EntityId) -> Option<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    pub fn body_ids(&self) -> Vec<EntityId> {
        self.bodies.ids()
    }

    pub fn fixture(&self, id: EntityId) -> Option<&Fixture> {
        self.fixtures.get(id)
    }

    pub fn joint(&self, id: EntityId) -> Option<&Joint> {
        self.joints.get(id)
    }

    pub fn joint_mut(&mut self, id: EntityId) -> Option<&mut Joint> {
        self.joints.get_mut(id)
    }

    pub fn contact(&self, id: EntityId) -> Option<&Contact> {
        self.contacts.get(id)
    }

    pub fn contact_ids(&self) -> Vec<EntityId> {
        self.contacts.ids()
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    pub fn create_body(&mut self, def: &BodyDef) -> EntityId {
        assert!(!self.locked, "create_body called during step");
        self.bodies.insert(RigidBody::from_def(def))
    }

    /// Destroys a body together with its fixtures, joints, and contacts.
    /// The destruction listener is told about the implicit teardowns.
    pub fn destroy_body(&mut self, body_id: EntityId) {
        assert!(!self.locked, "destroy_body called during step");
        let Some(body) = self.bodies.get(body_id) else {
            return;
        };

        let joint_ids: Vec<EntityId> = body.joint_edges.iter().map(|edge| edge.joint).collect();
        for joint_id in joint_ids {
            if self.joints.contains(joint_id) {
                if let Some(listener) = self.destruction_listener.as_mut() {
                    listener.say_goodbye_joint(joint_id);
                }
                self.destroy_joint(joint_id);
            }
        }

        let contact_ids: Vec<EntityId> = self
            .bodies
            .get(body_id)
            .map(|b| b.contact_edges.iter().map(|edge| edge.contact).collect())
            .unwrap_or_default();
        for contact_id in contact_ids {
            self.destroy_contact(contact_id);
        }

        let fixture_ids: Vec<EntityId> = self
            .bodies
            .get(body_id)
            .map(|b| b.fixtures.clone())
            .unwrap_or_default();
        for fixture_id in fixture_ids {
            if let Some(listener) = self.destruction_listener.as_mut() {
                listener.say_goodbye_fixture(fixture_id);
            }
            if let Some(fixture) = self.fixtures.get_mut(fixture_id) {
                fixture.destroy_proxies(&mut self.broadphase);
            }
            self.fixtures.remove(fixture_id);
        }

        self.bodies.remove(body_id);
    }

    pub fn create_fixture(&mut self, body_id: EntityId, def: &FixtureDef) -> EntityId {
        assert!(!self.locked, "create_fixture called during step");
        let body = self.bodies.get(body_id).expect("fixture body missing");
        let transform = body.transform;
        let enabled = body.enabled;

        let fixture_id = self.fixtures.insert(Fixture::from_def(body_id, def));
        let fixture = self.fixtures.get_mut(fixture_id).expect("just inserted");

        if enabled {
            fixture.create_proxies(fixture_id, &mut self.broadphase, &transform);
        }

        let body = self.bodies.get_mut(body_id).expect("fixture body missing");
        body.fixtures.push(fixture_id);

        if def.density > 0.0 {
            self.reset_mass_data(body_id);
        }

        // New proxies need pairing at the next step.
        self.new_contacts = true;
        fixture_id
    }

    pub fn destroy_fixture(&mut self, fixture_id: EntityId) {
        assert!(!self.locked, "destroy_fixture called during step");
        let Some(fixture) = self.fixtures.get(fixture_id) else {
            return;
        };
        let body_id = fixture.body_id();

        // Any contact on this fixture dies with it.
        let contact_ids: Vec<EntityId> = self
            .bodies
            .get(body_id)
            .map(|body| {
                body.contact_edges
                    .iter()
                    .filter(|edge| {
                        self.contacts
                            .get(edge.contact)
                            .map(|c| c.fixture_a == fixture_id || c.fixture_b == fixture_id)
                            .unwrap_or(false)
                    })
                    .map(|edge| edge.contact)
                    .collect()
            })
            .unwrap_or_default();
        for contact_id in contact_ids {
            self.destroy_contact(contact_id);
        }

        if let Some(fixture) = self.fixtures.get_mut(fixture_id) {
            fixture.destroy_proxies(&mut self.broadphase);
        }
        self.fixtures.remove(fixture_id);

        if let Some(body) = self.bodies.get_mut(body_id) {
            body.fixtures.retain(|&id| id != fixture_id);
        }
        self.reset_mass_data(body_id);
    }

    pub fn create_joint(&mut self, def: &JointDef) -> EntityId {
        assert!(!self.locked, "create_joint called during step");

        let joint = match def {
            JointDef::Distance(d) => Joint::Distance(crate::dynamics::joints::DistanceJoint::new(d)),
            JointDef::Revolute(d) => Joint::Revolute(crate::dynamics::joints::RevoluteJoint::new(d)),
            JointDef::Prismatic(d) => {
                Joint::Prismatic(crate::dynamics::joints::PrismaticJoint::new(d))
            }
            JointDef::Pulley(d) => Joint::Pulley(crate::dynamics::joints::PulleyJoint::new(d)),
            JointDef::Mouse(d) => Joint::Mouse(crate::dynamics::joints::MouseJoint::new(d)),
            JointDef::Gear(d) => {
                let joint1 = self.joints.get(d.joint1).expect("gear joint1 missing");
                let joint2 = self.joints.get(d.joint2).expect("gear joint2 missing");
                Joint::Gear(GearJoint::from_joints(d, joint1, joint2, &self.bodies))
            }
            JointDef::Wheel(d) => Joint::Wheel(crate::dynamics::joints::WheelJoint::new(d)),
            JointDef::Weld(d) => Joint::Weld(crate::dynamics::joints::WeldJoint::new(d)),
            JointDef::Friction(d) => {
                Joint::Friction(crate::dynamics::joints::FrictionJoint::new(d))
            }
            JointDef::Motor(d) => Joint::Motor(crate::dynamics::joints::MotorJoint::new(d)),
        };

        let body_a = joint.body_a();
        let body_b = joint.body_b();
        let collide_connected = joint.collide_connected();

        let joint_id = self.joints.insert(joint);

        if let Some(body) = self.bodies.get_mut(body_a) {
            body.joint_edges.push(JointEdge {
                joint: joint_id,
                other: body_b,
            });
        }
        if let Some(body) = self.bodies.get_mut(body_b) {
            body.joint_edges.push(JointEdge {
                joint: joint_id,
                other: body_a,
            });
        }

        // Existing contacts between the bodies may now be filtered out.
        if !collide_connected {
            self.flag_contacts_for_filtering(body_a, body_b);
        }

        joint_id
    }

    pub fn destroy_joint(&mut self, joint_id: EntityId) {
        assert!(!self.locked, "destroy_joint called during step");
        let Some(joint) = self.joints.get(joint_id) else {
            return;
        };
        let body_a = joint.body_a();
        let body_b = joint.body_b();
        let collide_connected = joint.collide_connected();

        for body_id in [body_a, body_b] {
            if let Some(body) = self.bodies.get_mut(body_id) {
                body.joint_edges.retain(|edge| edge.joint != joint_id);
                body.set_awake(true);
            }
        }

        self.joints.remove(joint_id);

        // The pair may collide again; force a filter re-check.
        if !collide_connected {
            self.flag_contacts_for_filtering(body_a, body_b);
        }
    }

    fn flag_contacts_for_filtering(&mut self, body_a: EntityId, body_b: EntityId) {
        let Some(body) = self.bodies.get(body_a) else {
            return;
        };
        let edges: Vec<ContactEdge> = body.contact_edges.clone();
        for edge in edges {
            if edge.other == body_b {
                if let Some(contact) = self.contacts.get_mut(edge.contact) {
                    contact.flag_for_filtering();
                }
            }
        }
    }

    /// Re-issues the filter check for every contact of the fixture.
    pub fn refilter_fixture(&mut self, fixture_id: EntityId) {
        let Some(fixture) = self.fixtures.get(fixture_id) else {
            return;
        };
        let body_id = fixture.body_id();
        if let Some(body) = self.bodies.get(body_id) {
            let edges: Vec<ContactEdge> = body.contact_edges.clone();
            for edge in edges {
                if let Some(contact) = self.contacts.get_mut(edge.contact) {
                    if contact.fixture_a == fixture_id || contact.fixture_b == fixture_id {
                        contact.flag_for_filtering();
                    }
                }
            }
        }
        if let Some(fixture) = self.fixtures.get(fixture_id) {
            for proxy in &fixture.proxies {
                self.broadphase.touch_proxy(proxy.proxy_id);
            }
        }
        self.new_contacts = true;
    }

    /// Moves a body to a new pose outside the solver and synchronizes its
    /// broad-phase proxies.
    pub fn set_transform(&mut self, body_id: EntityId, position: Vec2, angle: f32) {
        assert!(!self.locked, "set_transform called during step");
        let Some(body) = self.bodies.get_mut(body_id) else {
            return;
        };
        body.set_pose(position, angle);
        let transform = body.transform;

        let fixture_ids = body.fixtures.clone();
        for fixture_id in fixture_ids {
            if let Some(fixture) = self.fixtures.get_mut(fixture_id) {
                fixture.synchronize(&mut self.broadphase, &transform, &transform);
            }
        }
        self.new_contacts = true;
    }

    /// Enables or disables a body: proxies are destroyed while disabled
    /// and recreated on enable, contacts die immediately.
    pub fn set_body_enabled(&mut self, body_id: EntityId, enabled: bool) {
        assert!(!self.locked, "set_body_enabled called during step");
        let Some(body) = self.bodies.get(body_id) else {
            return;
        };
        if body.enabled == enabled {
            return;
        }
        let transform = body.transform;
        let fixture_ids = body.fixtures.clone();

        if enabled {
            for fixture_id in &fixture_ids {
                if let Some(fixture) = self.fixtures.get_mut(*fixture_id) {
                    fixture.create_proxies(*fixture_id, &mut self.broadphase, &transform);
                }
            }
            self.new_contacts = true;
        } else {
            for fixture_id in &fixture_ids {
                if let Some(fixture) = self.fixtures.get_mut(*fixture_id) {
                    fixture.destroy_proxies(&mut self.broadphase);
                }
            }
            let contact_ids: Vec<EntityId> = self
                .bodies
                .get(body_id)
                .map(|b| b.contact_edges.iter().map(|e| e.contact).collect())
                .unwrap_or_default();
            for contact_id in contact_ids {
                self.destroy_contact(contact_id);
            }
        }

        if let Some(body) = self.bodies.get_mut(body_id) {
            body.enabled = enabled;
        }
    }

    /// Recomputes mass, center, and inertia from the body's fixtures.
    pub fn reset_mass_data(&mut self, body_id: EntityId) {
        let Some(body) = self.bodies.get(body_id) else {
            return;
        };

        let mut mass = 0.0;
        let mut center = Vec2::ZERO;
        let mut inertia = 0.0;
        for &fixture_id in &body.fixtures {
            let fixture = self.fixtures.get(fixture_id).expect("body fixture missing");
            if fixture.density == 0.0 {
                continue;
            }
            let mass_data: MassData = fixture.mass_data();
            mass += mass_data.mass;
            center += mass_data.mass * mass_data.center;
            inertia += mass_data.inertia;
        }

        if mass > 0.0 {
            center *= 1.0 / mass;
        }

        let body = self.bodies.get_mut(body_id).expect("checked above");
        body.set_mass_properties(mass, center, inertia);
    }

    pub fn clear_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Reports every fixture with a broad-phase AABB overlapping `aabb`.
    /// Return false from the visitor to stop early.
    pub fn query_aabb<F>(&self, aabb: Aabb, mut visitor: F)
    where
        F: FnMut(EntityId) -> bool,
    {
        let tree = self.broadphase.tree();
        tree.query(&aabb, |proxy_id| {
            let key = tree.data(proxy_id);
            visitor(key.fixture)
        });
    }

    /// Casts a segment through the world. The visitor receives
    /// `(fixture, point, normal, fraction)` and returns the new clipping
    /// fraction: 0 stops, the fraction narrows the search, negative
    /// ignores the hit.
    pub fn ray_cast<F>(&self, p1: Vec2, p2: Vec2, mut visitor: F)
    where
        F: FnMut(EntityId, Vec2, Vec2, f32) -> f32,
    {
        let input = RayCastInput {
            p1,
            p2,
            max_fraction: 1.0,
        };
        let tree = self.broadphase.tree();
        tree.ray_cast(&input, |sub_input, proxy_id| {
            let key = tree.data(proxy_id);
            let fixture = self.fixtures.get(key.fixture).expect("proxy fixture missing");
            let body = self.bodies.get(fixture.body_id()).expect("fixture body missing");

            if let Some(output) =
                fixture
                    .shape
                    .ray_cast(sub_input, &body.transform, key.child_index)
            {
                let fraction = output.fraction;
                let point = (1.0 - fraction) * sub_input.p1 + fraction * sub_input.p2;
                return visitor(key.fixture, point, output.normal, fraction);
            }
            // Continue past this fixture without narrowing the segment.
            -1.0
        });
    }

    /// Convenience closest-hit ray cast.
    pub fn raycast_closest(&self, query: &RaycastQuery) -> Option<RaycastHit> {
        let p2 = query.origin + query.direction.normalize_or_zero() * query.max_distance;
        let mut best: Option<RaycastHit> = None;

        self.ray_cast(query.origin, p2, |fixture_id, point, normal, fraction| {
            if query.ignore_sensors {
                if let Some(fixture) = self.fixtures.get(fixture_id) {
                    if fixture.is_sensor() {
                        return -1.0;
                    }
                }
            }
            let body_id = self
                .fixtures
                .get(fixture_id)
                .map(|f| f.body_id())
                .unwrap_or_default();
            best = Some(RaycastHit {
                body_id,
                fixture_id,
                point,
                normal,
                fraction,
            });
            // Clip the ray so only nearer hits are reported from here on.
            fraction
        });

        best
    }

    // ---------------------------------------------------------------
    // Stepping
    // ---------------------------------------------------------------

    /// Advances the world by `dt`: integration, constraint solving,
    /// continuous collision, and sleep management.
    pub fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        assert!(!self.locked, "step re-entered");

        let step_start = Instant::now();
        self.profile.reset();

        // Register pairs for fixtures created since the last step.
        if self.new_contacts {
            let broad_start = Instant::now();
            self.find_new_contacts();
            self.new_contacts = false;
            self.profile.broad_phase_time += broad_start.elapsed();
        }

        self.locked = true;

        let step = TimeStep {
            dt,
            inv_dt: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            dt_ratio: self.inv_dt0 * dt,
            velocity_iterations,
            position_iterations,
            warm_starting: self.warm_starting,
        };

        // Narrow phase: update or destroy every contact.
        {
            let narrow_start = Instant::now();
            self.collide();
            self.profile.narrow_phase_time += narrow_start.elapsed();
        }

        if step.dt > 0.0 {
            let solve_start = Instant::now();
            self.solve(&step);
            self.profile.solve_time += solve_start.elapsed();
        }

        // Continuous collision for bullets and fast kinematics.
        if self.continuous_physics && step.dt > 0.0 {
            let toi_start = Instant::now();
            self.solve_toi(&step);
            self.profile.solve_toi_time += toi_start.elapsed();
        }

        if step.dt > 0.0 {
            self.inv_dt0 = step.inv_dt;
        }

        if self.auto_clear_forces {
            self.clear_forces();
        }

        self.locked = false;

        self.profile.total_step_time = step_start.elapsed();
        self.profile.body_count = self.bodies.len();
        self.profile.contact_count = self.contacts.len();
        debug!(
            "step dt={dt:.5} bodies={} contacts={}",
            self.profile.body_count, self.profile.contact_count
        );
    }

    /// Queries the broad phase for newly overlapping proxy pairs and
    /// creates contacts for them.
    fn find_new_contacts(&mut self) {
        let mut pairs: Vec<(ProxyKey, ProxyKey)> = Vec::new();
        self.broadphase.update_pairs(|a, b| pairs.push((a, b)));

        for (key_a, key_b) in pairs {
            self.add_pair(key_a, key_b);
        }
    }

    /// Registers a contact for an overlapping proxy pair unless the pair
    /// is rejected by identity, an existing contact, joints, or filters.
    fn add_pair(&mut self, key_a: ProxyKey, key_b: ProxyKey) {
        let fixture_a_id = key_a.fixture;
        let fixture_b_id = key_b.fixture;

        let Some(fixture_a) = self.fixtures.get(fixture_a_id) else {
            return;
        };
        let Some(fixture_b) = self.fixtures.get(fixture_b_id) else {
            return;
        };

        let body_a_id = fixture_a.body_id();
        let body_b_id = fixture_b.body_id();
        if body_a_id == body_b_id {
            return;
        }

        // Walk body B's contact list to reject duplicates.
        if let Some(body_b) = self.bodies.get(body_b_id) {
            for edge in &body_b.contact_edges {
                if edge.other != body_a_id {
                    continue;
                }
                if let Some(contact) = self.contacts.get(edge.contact) {
                    let fa = contact.fixture_a;
                    let fb = contact.fixture_b;
                    let ca = contact.child_a;
                    let cb = contact.child_b;
                    if fa == fixture_a_id
                        && fb == fixture_b_id
                        && ca == key_a.child_index
                        && cb == key_b.child_index
                    {
                        return;
                    }
                    if fa == fixture_b_id
                        && fb == fixture_a_id
                        && ca == key_b.child_index
                        && cb == key_a.child_index
                    {
                        return;
                    }
                }
            }
        }

        if !self.bodies_should_collide(body_a_id, body_b_id) {
            return;
        }
        if !self.filter.should_collide(fixture_a, fixture_b) {
            return;
        }

        let (friction, restitution, restitution_threshold) =
            Contact::mixed_material(fixture_a, fixture_b);

        let Some(contact) = Contact::new(
            fixture_a_id,
            key_a.child_index,
            fixture_b_id,
            key_b.child_index,
            &fixture_a.shape,
            &fixture_b.shape,
            friction,
            restitution,
            restitution_threshold,
        ) else {
            return;
        };

        // The contact may have swapped operands; link edges using its
        // canonical order.
        let canon_a = self
            .fixtures
            .get(contact.fixture_a)
            .map(|f| f.body_id())
            .expect("fixture missing");
        let canon_b = self
            .fixtures
            .get(contact.fixture_b)
            .map(|f| f.body_id())
            .expect("fixture missing");

        let contact_id = self.contacts.insert(contact);

        if let Some(body) = self.bodies.get_mut(canon_a) {
            body.contact_edges.push(ContactEdge {
                contact: contact_id,
                other: canon_b,
            });
        }
        if let Some(body) = self.bodies.get_mut(canon_b) {
            body.contact_edges.push(ContactEdge {
                contact: contact_id,
                other: canon_a,
            });
        }
    }

    /// Type- and joint-based collision eligibility of a body pair.
    fn bodies_should_collide(&self, body_a_id: EntityId, body_b_id: EntityId) -> bool {
        let Some(body_a) = self.bodies.get(body_a_id) else {
            return false;
        };
        let Some(body_b) = self.bodies.get(body_b_id) else {
            return false;
        };

        // At least one body must be dynamic.
        if body_a.body_type != BodyType::Dynamic && body_b.body_type != BodyType::Dynamic {
            return false;
        }

        // A joint may veto collision between its bodies.
        for edge in &body_b.joint_edges {
            if edge.other == body_a_id {
                if let Some(joint) = self.joints.get(edge.joint) {
                    if !joint.collide_connected() {
                        return false;
                    }
                }
            }
        }

        true
    }

    fn destroy_contact(&mut self, contact_id: EntityId) {
        let Some(contact) = self.contacts.get_mut(contact_id) else {
            return;
        };

        let was_touching = contact.is_touching();
        let fixture_a = contact.fixture_a;
        let fixture_b = contact.fixture_b;

        if was_touching {
            if let Some(listener) = self.listener.as_mut() {
                listener.end_contact(contact);
            }
        }

        let body_a = self.fixtures.get(fixture_a).map(|f| f.body_id());
        let body_b = self.fixtures.get(fixture_b).map(|f| f.body_id());

        for body_id in [body_a, body_b].into_iter().flatten() {
            if let Some(body) = self.bodies.get_mut(body_id) {
                body.contact_edges.retain(|edge| edge.contact != contact_id);
                if was_touching {
                    body.set_awake(true);
                }
            }
        }

        self.contacts.remove(contact_id);
    }

    /// Narrow phase over the persistent contact graph: re-filter, cull by
    /// fat AABB, update manifolds, and dispatch listener callbacks.
    fn collide(&mut self) {
        for contact_id in self.contacts.ids() {
            let Some(contact) = self.contacts.get(contact_id) else {
                continue;
            };

            let fixture_a_id = contact.fixture_a;
            let fixture_b_id = contact.fixture_b;
            let child_a = contact.child_a;
            let child_b = contact.child_b;
            let needs_filtering = contact.filter_flag;

            let Some(fixture_a) = self.fixtures.get(fixture_a_id) else {
                self.destroy_contact(contact_id);
                continue;
            };
            let Some(fixture_b) = self.fixtures.get(fixture_b_id) else {
                self.destroy_contact(contact_id);
                continue;
            };

            let body_a_id = fixture_a.body_id();
            let body_b_id = fixture_b.body_id();

            if needs_filtering {
                let keep = self.bodies_should_collide(body_a_id, body_b_id)
                    && self.filter.should_collide(fixture_a, fixture_b);
                if !keep {
                    self.destroy_contact(contact_id);
                    continue;
                }
                if let Some(contact) = self.contacts.get_mut(contact_id) {
                    contact.filter_flag = false;
                }
            }

            let body_a = self.bodies.get(body_a_id).expect("contact body missing");
            let body_b = self.bodies.get(body_b_id).expect("contact body missing");

            let active_a = body_a.is_awake() && body_a.body_type != BodyType::Static;
            let active_b = body_b.is_awake() && body_b.body_type != BodyType::Static;
            if !active_a && !active_b {
                continue;
            }

            // Contacts whose fat AABBs separated are destroyed this step.
            let fixture_a = self.fixtures.get(fixture_a_id).expect("checked above");
            let fixture_b = self.fixtures.get(fixture_b_id).expect("checked above");
            let proxy_a = fixture_a.proxies[child_a].proxy_id;
            let proxy_b = fixture_b.proxies[child_b].proxy_id;
            if !self.broadphase.test_overlap(proxy_a, proxy_b) {
                self.destroy_contact(contact_id);
                continue;
            }

            let sensor = fixture_a.is_sensor() || fixture_b.is_sensor();
            let shape_a = fixture_a.shape.clone();
            let shape_b = fixture_b.shape.clone();
            let xf_a = self.bodies.get(body_a_id).expect("checked").transform;
            let xf_b = self.bodies.get(body_b_id).expect("checked").transform;

            let contact = self.contacts.get_mut(contact_id).expect("checked above");
            let (old_manifold, update) =
                contact.update_manifold(&shape_a, &xf_a, &shape_b, &xf_b, sensor);

            if update.touching_changed {
                for body_id in [body_a_id, body_b_id] {
                    if let Some(body) = self.bodies.get_mut(body_id) {
                        body.set_awake(true);
                    }
                }
            }

            if let Some(listener) = self.listener.as_mut() {
                let contact = self.contacts.get_mut(contact_id).expect("checked above");
                if update.began {
                    listener.begin_contact(contact);
                }
                if update.ended {
                    listener.end_contact(contact);
                }
                if !sensor && contact.is_touching() {
                    listener.pre_solve(contact, &old_manifold);
                }
            }
        }
    }

    /// Builds islands by flood fill from awake dynamic bodies and solves
    /// each independently.
    fn solve(&mut self, step: &TimeStep) {
        self.profile.island_count = 0;

        let mut island = Island::new(
            self.bodies.len().max(1),
            self.contacts.len().max(1),
            self.joints.len().max(1),
        );

        for (_, body) in self.bodies.iter_mut() {
            body.island_flag = false;
        }
        for (_, contact) in self.contacts.iter_mut() {
            contact.island_flag = false;
        }
        for (_, joint) in self.joints.iter_mut() {
            joint.set_island_flag(false);
        }

        let seeds = self.bodies.ids();
        let mut stack: Vec<EntityId> = Vec::with_capacity(self.bodies.len());

        for seed_id in seeds {
            {
                let Some(seed) = self.bodies.get(seed_id) else {
                    continue;
                };
                if seed.island_flag
                    || !seed.is_awake()
                    || !seed.enabled
                    || seed.body_type == BodyType::Static
                {
                    continue;
                }
            }

            island.clear();
            stack.clear();
            stack.push(seed_id);
            self.bodies.get_mut(seed_id).unwrap().island_flag = true;

            while let Some(body_id) = stack.pop() {
                {
                    let body = self.bodies.get_mut(body_id).expect("stack body missing");
                    debug_assert!(body.enabled);
                    island.add_body(body_id, body);

                    // Keep the body awake while it is being solved, without
                    // resetting its sleep timer.
                    body.set_awake_flag();

                    // Static bodies anchor islands but never propagate them.
                    if body.body_type == BodyType::Static {
                        continue;
                    }
                }

                let contact_edges: Vec<ContactEdge> = self
                    .bodies
                    .get(body_id)
                    .map(|b| b.contact_edges.clone())
                    .unwrap_or_default();
                for edge in contact_edges {
                    let Some(contact) = self.contacts.get_mut(edge.contact) else {
                        continue;
                    };
                    if contact.island_flag {
                        continue;
                    }
                    if !contact.is_enabled() || !contact.is_touching() {
                        continue;
                    }

                    let sensor_a = self
                        .fixtures
                        .get(contact.fixture_a)
                        .map(|f| f.is_sensor())
                        .unwrap_or(false);
                    let sensor_b = self
                        .fixtures
                        .get(contact.fixture_b)
                        .map(|f| f.is_sensor())
                        .unwrap_or(false);
                    if sensor_a || sensor_b {
                        continue;
                    }

                    contact.island_flag = true;
                    island.add_contact(edge.contact);

                    let other = self.bodies.get_mut(edge.other).expect("edge body missing");
                    if !other.island_flag {
                        other.island_flag = true;
                        stack.push(edge.other);
                    }
                }

                let joint_edges: Vec<JointEdge> = self
                    .bodies
                    .get(body_id)
                    .map(|b| b.joint_edges.clone())
                    .unwrap_or_default();
                for edge in joint_edges {
                    let Some(joint) = self.joints.get_mut(edge.joint) else {
                        continue;
                    };
                    if joint.island_flag() {
                        continue;
                    }
                    let Some(other) = self.bodies.get_mut(edge.other) else {
                        continue;
                    };
                    if !other.enabled {
                        continue;
                    }

                    joint.set_island_flag(true);
                    island.add_joint(edge.joint);

                    if !other.island_flag {
                        other.island_flag = true;
                        stack.push(edge.other);
                    }
                }
            }

            let impulses = island.solve(
                &mut self.bodies,
                &self.fixtures,
                &mut self.contacts,
                &mut self.joints,
                step,
                self.gravity,
                self.allow_sleep,
            );
            self.profile.island_count += 1;

            if let Some(listener) = self.listener.as_mut() {
                for (contact_id, impulse) in impulses {
                    if let Some(contact) = self.contacts.get_mut(contact_id) {
                        listener.post_solve(contact, &impulse);
                    }
                }
            }

            // Static bodies may participate in several islands.
            for &body_id in &island.bodies {
                let body = self.bodies.get_mut(body_id).expect("island body missing");
                if body.body_type == BodyType::Static {
                    body.island_flag = false;
                }
            }
        }

        // Moved bodies get fresh fat AABBs; new overlaps become contacts.
        for body_id in self.bodies.ids() {
            let body = self.bodies.get(body_id).expect("listed body missing");
            if !body.island_flag || body.body_type == BodyType::Static {
                continue;
            }
            self.synchronize_fixtures(body_id);
        }

        self.find_new_contacts();
    }

    fn synchronize_fixtures(&mut self, body_id: EntityId) {
        let Some(body) = self.bodies.get(body_id) else {
            return;
        };
        let xf1 = body.sweep.transform_at(0.0);
        let xf2 = body.transform;
        let fixture_ids = body.fixtures.clone();
        for fixture_id in fixture_ids {
            if let Some(fixture) = self.fixtures.get_mut(fixture_id) {
                fixture.synchronize(&mut self.broadphase, &xf1, &xf2);
            }
        }
    }

    /// Continuous collision: repeatedly finds the earliest time of impact
    /// among eligible contacts, advances the pair, solves a two-body mini
    /// island at the impact time, and re-integrates the sub-step.
    fn solve_toi(&mut self, step: &TimeStep) {
        let mut island = Island::new(2 * MAX_TOI_CONTACTS, MAX_TOI_CONTACTS, 0);

        for (_, body) in self.bodies.iter_mut() {
            body.island_flag = false;
            body.sweep.alpha0 = 0.0;
        }
        for (_, contact) in self.contacts.iter_mut() {
            contact.toi_flag = false;
            contact.island_flag = false;
            contact.toi_count = 0;
            contact.toi = 1.0;
        }

        // Find TOI events and solve them in time order.
        loop {
            let mut min_contact: Option<EntityId> = None;
            let mut min_alpha = 1.0f32;

            for contact_id in self.contacts.ids() {
                let Some(contact) = self.contacts.get(contact_id) else {
                    continue;
                };
                if !contact.is_enabled() {
                    continue;
                }
                if contact.toi_count > MAX_SUB_STEPS {
                    continue;
                }

                let alpha;
                if contact.toi_flag {
                    // This contact has a cached TOI.
                    alpha = contact.toi;
                } else {
                    let fixture_a_id = contact.fixture_a;
                    let fixture_b_id = contact.fixture_b;
                    let child_a = contact.child_a;
                    let child_b = contact.child_b;

                    let fixture_a = self.fixtures.get(fixture_a_id).expect("fixture missing");
                    let fixture_b = self.fixtures.get(fixture_b_id).expect("fixture missing");
                    if fixture_a.is_sensor() || fixture_b.is_sensor() {
                        continue;
                    }

                    let body_a_id = fixture_a.body_id();
                    let body_b_id = fixture_b.body_id();

                    let (type_a, type_b, awake_a, awake_b, bullet_a, bullet_b) = {
                        let body_a = self.bodies.get(body_a_id).expect("body missing");
                        let body_b = self.bodies.get(body_b_id).expect("body missing");
                        (
                            body_a.body_type,
                            body_b.body_type,
                            body_a.is_awake(),
                            body_b.is_awake(),
                            body_a.bullet,
                            body_b.bullet,
                        )
                    };
                    debug_assert!(
                        type_a == BodyType::Dynamic || type_b == BodyType::Dynamic
                    );

                    // Is at least one body active (awake and dynamic or kinematic)?
                    let active_a = awake_a && type_a != BodyType::Static;
                    let active_b = awake_b && type_b != BodyType::Static;
                    if !active_a && !active_b {
                        continue;
                    }

                    // Are these two non-bullet dynamic bodies?
                    let collide_a = bullet_a || type_a != BodyType::Dynamic;
                    let collide_b = bullet_b || type_b != BodyType::Dynamic;
                    if !collide_a && !collide_b {
                        continue;
                    }

                    // Advance the sweeps to the same starting fraction.
                    let mut alpha0;
                    {
                        let (body_a, body_b) = self
                            .bodies
                            .get2_mut(body_a_id, body_b_id)
                            .expect("contact bodies missing");
                        alpha0 = body_a.sweep.alpha0;
                        if body_a.sweep.alpha0 < body_b.sweep.alpha0 {
                            alpha0 = body_b.sweep.alpha0;
                            body_a.sweep.advance(alpha0);
                        } else if body_b.sweep.alpha0 < body_a.sweep.alpha0 {
                            alpha0 = body_a.sweep.alpha0;
                            body_b.sweep.advance(alpha0);
                        }
                    }
                    debug_assert!(alpha0 < 1.0);

                    let (sweep_a, sweep_b) = {
                        let body_a = self.bodies.get(body_a_id).unwrap();
                        let body_b = self.bodies.get(body_b_id).unwrap();
                        (body_a.sweep, body_b.sweep)
                    };

                    let input = ToiInput {
                        proxy_a: DistanceProxy::new(&fixture_a.shape, child_a),
                        proxy_b: DistanceProxy::new(&fixture_b.shape, child_b),
                        sweep_a,
                        sweep_b,
                        t_max: 1.0,
                    };
                    let output = time_of_impact(&input);

                    // Beta is the fraction of the remaining portion of the
                    // sweep. A failed root find still reports its last
                    // time and is handled as touching there.
                    let beta = output.t;
                    alpha = match output.state {
                        ToiState::Touching | ToiState::Failed => {
                            (alpha0 + (1.0 - alpha0) * beta).min(1.0)
                        }
                        _ => 1.0,
                    };

                    let contact = self.contacts.get_mut(contact_id).unwrap();
                    contact.toi = alpha;
                    contact.toi_flag = true;
                }

                if alpha < min_alpha {
                    min_contact = Some(contact_id);
                    min_alpha = alpha;
                }
            }

            let Some(min_contact_id) = min_contact else {
                break;
            };
            if min_alpha > 1.0 - 10.0 * f32::EPSILON {
                // No more TOI events this step.
                break;
            }

            // Advance the bodies to the TOI.
            let (fixture_a_id, fixture_b_id) = {
                let contact = self.contacts.get(min_contact_id).expect("toi contact");
                (contact.fixture_a, contact.fixture_b)
            };
            let body_a_id = self.fixtures.get(fixture_a_id).unwrap().body_id();
            let body_b_id = self.fixtures.get(fixture_b_id).unwrap().body_id();

            let (backup1, backup2) = {
                let body_a = self.bodies.get(body_a_id).unwrap();
                let body_b = self.bodies.get(body_b_id).unwrap();
                (body_a.sweep, body_b.sweep)
            };

            self.bodies.get_mut(body_a_id).unwrap().advance(min_alpha);
            self.bodies.get_mut(body_b_id).unwrap().advance(min_alpha);

            // The TOI contact likely has new points at the impact pose.
            self.update_contact_for_toi(min_contact_id);
            {
                let contact = self.contacts.get_mut(min_contact_id).unwrap();
                contact.toi_flag = false;
                contact.toi_count += 1;
            }

            let (enabled, touching) = {
                let contact = self.contacts.get(min_contact_id).unwrap();
                (contact.is_enabled(), contact.is_touching())
            };
            if !enabled || !touching {
                // The impact evaporated; restore the sweeps.
                let contact = self.contacts.get_mut(min_contact_id).unwrap();
                contact.set_enabled(false);

                let body_a = self.bodies.get_mut(body_a_id).unwrap();
                body_a.sweep = backup1;
                body_a.synchronize_transform();
                let body_b = self.bodies.get_mut(body_b_id).unwrap();
                body_b.sweep = backup2;
                body_b.synchronize_transform();
                continue;
            }

            self.bodies.get_mut(body_a_id).unwrap().set_awake(true);
            self.bodies.get_mut(body_b_id).unwrap().set_awake(true);

            // Build the mini island: the impact pair plus everything
            // immediately touching it.
            island.clear();
            {
                let body_a = self.bodies.get_mut(body_a_id).unwrap();
                island.add_body(body_a_id, body_a);
                body_a.island_flag = true;
            }
            {
                let body_b = self.bodies.get_mut(body_b_id).unwrap();
                island.add_body(body_b_id, body_b);
                body_b.island_flag = true;
            }
            {
                let contact = self.contacts.get_mut(min_contact_id).unwrap();
                contact.island_flag = true;
                island.add_contact(min_contact_id);
            }

            let toi_index_a = self.bodies.get(body_a_id).unwrap().island_index;
            let toi_index_b = self.bodies.get(body_b_id).unwrap().island_index;

            for seed_body_id in [body_a_id, body_b_id] {
                if self.bodies.get(seed_body_id).unwrap().body_type != BodyType::Dynamic {
                    continue;
                }

                let contact_edges: Vec<ContactEdge> = self
                    .bodies
                    .get(seed_body_id)
                    .map(|b| b.contact_edges.clone())
                    .unwrap_or_default();

                for edge in contact_edges {
                    if island.body_count() == 2 * MAX_TOI_CONTACTS {
                        break;
                    }
                    if island.contact_count() == MAX_TOI_CONTACTS {
                        break;
                    }

                    let contact_id = edge.contact;
                    let Some(contact) = self.contacts.get(contact_id) else {
                        continue;
                    };
                    if contact.island_flag {
                        continue;
                    }

                    // Only bullets create TOI contacts with other dynamics.
                    let other_id = edge.other;
                    let (other_type, other_bullet) = {
                        let other = self.bodies.get(other_id).expect("edge body missing");
                        (other.body_type, other.bullet)
                    };
                    let seed_bullet = self.bodies.get(seed_body_id).unwrap().bullet;
                    if other_type == BodyType::Dynamic && !seed_bullet && !other_bullet {
                        continue;
                    }

                    let sensor_a = self
                        .fixtures
                        .get(contact.fixture_a)
                        .map(|f| f.is_sensor())
                        .unwrap_or(false);
                    let sensor_b = self
                        .fixtures
                        .get(contact.fixture_b)
                        .map(|f| f.is_sensor())
                        .unwrap_or(false);
                    if sensor_a || sensor_b {
                        continue;
                    }

                    // Tentatively advance the other body to the TOI.
                    let backup = self.bodies.get(other_id).unwrap().sweep;
                    if !self.bodies.get(other_id).unwrap().island_flag {
                        self.bodies.get_mut(other_id).unwrap().advance(min_alpha);
                    }

                    self.update_contact_for_toi(contact_id);

                    let (enabled, touching) = {
                        let contact = self.contacts.get(contact_id).unwrap();
                        (contact.is_enabled(), contact.is_touching())
                    };
                    if !enabled || !touching {
                        let other = self.bodies.get_mut(other_id).unwrap();
                        other.sweep = backup;
                        other.synchronize_transform();
                        continue;
                    }

                    self.contacts.get_mut(contact_id).unwrap().island_flag = true;
                    island.add_contact(contact_id);

                    if self.bodies.get(other_id).unwrap().island_flag {
                        continue;
                    }
                    {
                        let other = self.bodies.get_mut(other_id).unwrap();
                        other.island_flag = true;
                        if other.body_type != BodyType::Static {
                            other.set_awake(true);
                        }
                        island.add_body(other_id, other);
                    }
                }
            }

            let sub_step = TimeStep {
                dt: (1.0 - min_alpha) * step.dt,
                inv_dt: if (1.0 - min_alpha) * step.dt > 0.0 {
                    1.0 / ((1.0 - min_alpha) * step.dt)
                } else {
                    0.0
                },
                dt_ratio: 1.0,
                velocity_iterations: step.velocity_iterations,
                position_iterations: 20,
                warm_starting: false,
            };
            let impulses = island.solve_toi(
                &mut self.bodies,
                &self.fixtures,
                &mut self.contacts,
                &sub_step,
                toi_index_a,
                toi_index_b,
            );

            if let Some(listener) = self.listener.as_mut() {
                for (contact_id, impulse) in impulses {
                    if let Some(contact) = self.contacts.get_mut(contact_id) {
                        listener.post_solve(contact, &impulse);
                    }
                }
            }

            let bullet_involved = self.bodies.get(body_a_id).map(|b| b.bullet).unwrap_or(false)
                || self.bodies.get(body_b_id).map(|b| b.bullet).unwrap_or(false);
            if bullet_involved {
                if let Some(contact) = self.contacts.get_mut(min_contact_id) {
                    contact.bullet_hit_flag = true;
                }
            }

            // Reset flags and sync displaced bodies; their old TOIs are
            // now invalid.
            for &island_body_id in island.bodies.clone().iter() {
                let body = self.bodies.get_mut(island_body_id).unwrap();
                body.island_flag = false;
                if body.body_type != BodyType::Dynamic {
                    continue;
                }

                self.synchronize_fixtures(island_body_id);

                let contact_edges: Vec<ContactEdge> = self
                    .bodies
                    .get(island_body_id)
                    .map(|b| b.contact_edges.clone())
                    .unwrap_or_default();
                for edge in contact_edges {
                    if let Some(contact) = self.contacts.get_mut(edge.contact) {
                        contact.toi_flag = false;
                        contact.island_flag = false;
                    }
                }
            }

            // Displacement may have created new pairs.
            self.find_new_contacts();
        }
    }

    /// Contact update used inside the TOI loop; dispatches listener
    /// callbacks exactly like the discrete narrow phase.
    fn update_contact_for_toi(&mut self, contact_id: EntityId) {
        let Some(contact) = self.contacts.get(contact_id) else {
            return;
        };
        let fixture_a_id = contact.fixture_a;
        let fixture_b_id = contact.fixture_b;

        let fixture_a = self.fixtures.get(fixture_a_id).expect("fixture missing");
        let fixture_b = self.fixtures.get(fixture_b_id).expect("fixture missing");
        let sensor = fixture_a.is_sensor() || fixture_b.is_sensor();
        let shape_a = fixture_a.shape.clone();
        let shape_b = fixture_b.shape.clone();
        let body_a_id = fixture_a.body_id();
        let body_b_id = fixture_b.body_id();

        let xf_a = self.bodies.get(body_a_id).expect("body missing").transform;
        let xf_b = self.bodies.get(body_b_id).expect("body missing").transform;

        let contact = self.contacts.get_mut(contact_id).unwrap();
        let (old_manifold, update) =
            contact.update_manifold(&shape_a, &xf_a, &shape_b, &xf_b, sensor);

        if update.touching_changed {
            for body_id in [body_a_id, body_b_id] {
                if let Some(body) = self.bodies.get_mut(body_id) {
                    body.set_awake(true);
                }
            }
        }

        if let Some(listener) = self.listener.as_mut() {
            let contact = self.contacts.get_mut(contact_id).unwrap();
            if update.began {
                listener.begin_contact(contact);
            }
            if update.ended {
                listener.end_contact(contact);
            }
            if !sensor && contact.is_touching() {
                listener.pre_solve(contact, &old_manifold);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::Shape;
    use crate::core::body::BodyDef;

    #[test]
    fn world_reports_engine_version() {
        let world = PhysicsWorld::new(Vec2::ZERO);
        let version = world.version();
        assert_eq!((version.major, version.minor, version.revision), (2, 4, 0));
    }

    #[test]
    fn fixture_creation_assigns_mass() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body_id = world.create_body(
            &BodyDef::builder()
                .body_type(BodyType::Dynamic)
                .position(Vec2::ZERO)
                .build(),
        );
        world.create_fixture(body_id, &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(2.0));

        let body = world.body(body_id).unwrap();
        assert!((body.mass - 2.0).abs() < 1e-5);
        assert!(body.inertia > 0.0);
    }

    #[test]
    fn destroying_a_body_removes_its_fixtures() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body_id = world.create_body(&BodyDef::default());
        let fixture_id = world.create_fixture(body_id, &FixtureDef::new(Shape::circle(0.5)));

        world.destroy_body(body_id);
        assert!(world.body(body_id).is_none());
        assert!(world.fixture(fixture_id).is_none());
        assert_eq!(world.fixture_count(), 0);
    }

    #[test]
    fn joints_suppress_collision_between_connected_bodies() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = world.create_body(
            &BodyDef::builder().body_type(BodyType::Dynamic).build(),
        );
        let b = world.create_body(
            &BodyDef::builder().body_type(BodyType::Dynamic).build(),
        );

        assert!(world.bodies_should_collide(a, b));

        let def = crate::dynamics::joints::RevoluteJointDef::new(a, b, Vec2::ZERO, Vec2::ZERO);
        world.create_joint(&JointDef::Revolute(def));
        assert!(!world.bodies_should_collide(a, b));
    }
}
