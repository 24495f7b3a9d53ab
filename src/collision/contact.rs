use crate::{
    collision::{
        distance::test_overlap,
        narrowphase::{
            collide_circles, collide_edge_and_circle, collide_edge_and_polygon,
            collide_polygon_and_circle, collide_polygons, Manifold,
        },
        shapes::Shape,
    },
    config::MAX_MANIFOLD_POINTS,
    core::{fixture::Fixture, types::Transform},
    utils::allocator::EntityId,
};

/// Per-point solver impulses reported to [`ContactListener::post_solve`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactImpulse {
    pub normal_impulses: [f32; MAX_MANIFOLD_POINTS],
    pub tangent_impulses: [f32; MAX_MANIFOLD_POINTS],
    pub count: usize,
}

/// Contact lifecycle callbacks, invoked while the world is locked. Only
/// the supplied contact's enabled/friction/restitution/tangent-speed may
/// be mutated (and only in `pre_solve`); topology changes must be
/// deferred.
pub trait ContactListener {
    fn begin_contact(&mut self, _contact: &mut Contact) {}
    fn end_contact(&mut self, _contact: &mut Contact) {}
    fn pre_solve(&mut self, _contact: &mut Contact, _old_manifold: &Manifold) {}
    fn post_solve(&mut self, _contact: &mut Contact, _impulse: &ContactImpulse) {}
}

/// User hook deciding whether two fixtures may collide at all.
pub trait ContactFilter {
    fn should_collide(&self, fixture_a: &Fixture, fixture_b: &Fixture) -> bool;
}

/// Default rule: delegate to the fixtures' category/mask/group filters.
pub struct DefaultContactFilter;

impl ContactFilter for DefaultContactFilter {
    fn should_collide(&self, fixture_a: &Fixture, fixture_b: &Fixture) -> bool {
        fixture_a.filter().should_collide(fixture_b.filter())
    }
}

/// Notified when the world implicitly tears down fixtures or joints (for
/// example when their body is destroyed).
pub trait DestructionListener {
    fn say_goodbye_fixture(&mut self, _fixture: EntityId) {}
    fn say_goodbye_joint(&mut self, _joint: EntityId) {}
}

#[inline]
fn mix_friction(friction1: f32, friction2: f32) -> f32 {
    (friction1 * friction2).sqrt()
}

#[inline]
fn mix_restitution(restitution1: f32, restitution2: f32) -> f32 {
    restitution1.max(restitution2)
}

#[inline]
fn mix_restitution_threshold(threshold1: f32, threshold2: f32) -> f32 {
    threshold1.min(threshold2)
}

/// Result of a contact manifold update, consumed by the world to wake
/// bodies and dispatch listener callbacks in order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContactUpdate {
    pub began: bool,
    pub ended: bool,
    pub touching_changed: bool,
}

/// Edge of the contact graph between two fixture children. Stores the
/// persistent manifold whose impulses warm start the next step.
#[derive(Debug, Clone)]
pub struct Contact {
    pub(crate) fixture_a: EntityId,
    pub(crate) fixture_b: EntityId,
    pub(crate) child_a: usize,
    pub(crate) child_b: usize,

    pub(crate) manifold: Manifold,

    pub(crate) island_flag: bool,
    touching: bool,
    enabled: bool,
    /// Set when the filter must be re-evaluated next step.
    pub(crate) filter_flag: bool,
    pub(crate) bullet_hit_flag: bool,
    pub(crate) toi_flag: bool,
    pub(crate) toi_count: usize,
    pub(crate) toi: f32,

    pub friction: f32,
    pub restitution: f32,
    pub restitution_threshold: f32,
    /// Conveyor-belt style surface speed along the tangent.
    pub tangent_speed: f32,
}

impl Contact {
    /// Creates a contact for a fixture pair, swapping operands into the
    /// canonical order of the shape-pair registry. Returns `None` for
    /// pairs with no manifold generator (edge/edge and chain pairs are
    /// massless on both sides).
    pub(crate) fn new(
        fixture_a: EntityId,
        child_a: usize,
        fixture_b: EntityId,
        child_b: usize,
        shape_a: &Shape,
        shape_b: &Shape,
        friction: f32,
        restitution: f32,
        restitution_threshold: f32,
    ) -> Option<Self> {
        let swap = match (shape_a, shape_b) {
            (Shape::Circle(_), Shape::Circle(_)) => false,
            (Shape::Polygon(_), Shape::Circle(_) | Shape::Polygon(_)) => false,
            (Shape::Edge(_), Shape::Circle(_) | Shape::Polygon(_)) => false,
            (Shape::Chain(_), Shape::Circle(_) | Shape::Polygon(_)) => false,
            (Shape::Circle(_), Shape::Polygon(_) | Shape::Edge(_) | Shape::Chain(_)) => true,
            (Shape::Polygon(_), Shape::Edge(_) | Shape::Chain(_)) => true,
            // Both shapes are one-dimensional; no generator exists.
            (Shape::Edge(_) | Shape::Chain(_), Shape::Edge(_) | Shape::Chain(_)) => return None,
        };

        let (fixture_a, child_a, fixture_b, child_b) = if swap {
            (fixture_b, child_b, fixture_a, child_a)
        } else {
            (fixture_a, child_a, fixture_b, child_b)
        };

        Some(Self {
            fixture_a,
            fixture_b,
            child_a,
            child_b,
            manifold: Manifold::default(),
            island_flag: false,
            touching: false,
            enabled: true,
            filter_flag: false,
            bullet_hit_flag: false,
            toi_flag: false,
            toi_count: 0,
            toi: 1.0,
            friction,
            restitution,
            restitution_threshold,
            tangent_speed: 0.0,
        })
    }

    pub(crate) fn mixed_material(fixture_a: &Fixture, fixture_b: &Fixture) -> (f32, f32, f32) {
        (
            mix_friction(fixture_a.friction, fixture_b.friction),
            mix_restitution(fixture_a.restitution, fixture_b.restitution),
            mix_restitution_threshold(
                fixture_a.restitution_threshold,
                fixture_b.restitution_threshold,
            ),
        )
    }

    pub fn fixture_a(&self) -> EntityId {
        self.fixture_a
    }

    pub fn fixture_b(&self) -> EntityId {
        self.fixture_b
    }

    pub fn child_index_a(&self) -> usize {
        self.child_a
    }

    pub fn child_index_b(&self) -> usize {
        self.child_b
    }

    pub fn manifold(&self) -> &Manifold {
        &self.manifold
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True once the TOI stepper resolved this contact for a bullet body.
    pub fn is_bullet_hit(&self) -> bool {
        self.bullet_hit_flag
    }

    /// Disables the contact for the current step only (PreSolve hook).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Requests a filter re-check on the next step.
    pub fn flag_for_filtering(&mut self) {
        self.filter_flag = true;
    }

    /// Runs the registered manifold generator for this contact's shape
    /// pair at the given transforms.
    pub(crate) fn evaluate(
        &self,
        shape_a: &Shape,
        xf_a: &Transform,
        shape_b: &Shape,
        xf_b: &Transform,
    ) -> Manifold {
        match (shape_a, shape_b) {
            (Shape::Circle(a), Shape::Circle(b)) => collide_circles(a, xf_a, b, xf_b),
            (Shape::Polygon(a), Shape::Circle(b)) => collide_polygon_and_circle(a, xf_a, b, xf_b),
            (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(a, xf_a, b, xf_b),
            (Shape::Edge(a), Shape::Circle(b)) => collide_edge_and_circle(a, xf_a, b, xf_b),
            (Shape::Edge(a), Shape::Polygon(b)) => collide_edge_and_polygon(a, xf_a, b, xf_b),
            (Shape::Chain(chain), Shape::Circle(b)) => {
                let edge = chain.child_edge(self.child_a);
                collide_edge_and_circle(&edge, xf_a, b, xf_b)
            }
            (Shape::Chain(chain), Shape::Polygon(b)) => {
                let edge = chain.child_edge(self.child_a);
                collide_edge_and_polygon(&edge, xf_a, b, xf_b)
            }
            _ => {
                debug_assert!(false, "contact created for unregistered shape pair");
                Manifold::default()
            }
        }
    }

    /// Recomputes the manifold, carries impulses over matching feature
    /// ids, and reports the touching transition. Sensors only get a
    /// boolean overlap test and never a manifold.
    pub(crate) fn update_manifold(
        &mut self,
        shape_a: &Shape,
        xf_a: &Transform,
        shape_b: &Shape,
        xf_b: &Transform,
        sensor: bool,
    ) -> (Manifold, ContactUpdate) {
        let old_manifold = self.manifold;

        // Re-enable; PreSolve may disable again this step.
        self.enabled = true;

        let was_touching = self.touching;
        let touching;

        if sensor {
            touching = test_overlap(shape_a, self.child_a, shape_b, self.child_b, xf_a, xf_b);
            self.manifold.point_count = 0;
        } else {
            let mut manifold = self.evaluate(shape_a, xf_a, shape_b, xf_b);
            touching = manifold.point_count > 0;

            // Match old points by feature id to warm start the solver.
            for i in 0..manifold.point_count {
                let new_point = &mut manifold.points[i];
                new_point.normal_impulse = 0.0;
                new_point.tangent_impulse = 0.0;
                for j in 0..old_manifold.point_count {
                    let old_point = &old_manifold.points[j];
                    if old_point.id == new_point.id {
                        new_point.normal_impulse = old_point.normal_impulse;
                        new_point.tangent_impulse = old_point.tangent_impulse;
                        break;
                    }
                }
            }

            self.manifold = manifold;
        }

        self.touching = touching;

        (
            old_manifold,
            ContactUpdate {
                began: !was_touching && touching,
                ended: was_touching && !touching,
                touching_changed: was_touching != touching,
            },
        )
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn make_contact(shape_a: &Shape, shape_b: &Shape) -> Option<Contact> {
        Contact::new(
            EntityId::new(0, 0),
            0,
            EntityId::new(1, 0),
            0,
            shape_a,
            shape_b,
            0.2,
            0.0,
            1.0,
        )
    }

    #[test]
    fn operands_swap_into_canonical_order() {
        let circle = Shape::circle(0.5);
        let polygon = Shape::cuboid(0.5, 0.5);

        let contact = make_contact(&circle, &polygon).unwrap();
        // The polygon must end up as fixture A.
        assert_eq!(contact.fixture_a(), EntityId::new(1, 0));
        assert_eq!(contact.fixture_b(), EntityId::new(0, 0));
    }

    #[test]
    fn one_dimensional_pairs_are_rejected() {
        let edge = Shape::edge(Vec2::ZERO, Vec2::X);
        assert!(make_contact(&edge, &edge).is_none());
    }

    #[test]
    fn update_carries_impulses_across_feature_matches() {
        let a = Shape::cuboid(0.5, 0.5);
        let b = Shape::cuboid(0.5, 0.5);
        let mut contact = make_contact(&a, &b).unwrap();

        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(0.0, 0.99), 0.0);

        let (_, update) = contact.update_manifold(&a, &xf_a, &b, &xf_b, false);
        assert!(update.began);
        assert_eq!(contact.manifold.point_count, 2);

        // Pretend the solver accumulated impulses.
        contact.manifold.points[0].normal_impulse = 1.5;
        contact.manifold.points[1].normal_impulse = 2.5;

        let xf_b2 = Transform::new(Vec2::new(0.001, 0.989), 0.0);
        let (_, update) = contact.update_manifold(&a, &xf_a, &b, &xf_b2, false);
        assert!(!update.touching_changed);
        assert_eq!(contact.manifold.points[0].normal_impulse, 1.5);
        assert_eq!(contact.manifold.points[1].normal_impulse, 2.5);
    }

    #[test]
    fn sensors_report_overlap_without_manifold() {
        let a = Shape::circle(0.5);
        let b = Shape::circle(0.5);
        let mut contact = make_contact(&a, &b).unwrap();

        let (_, update) = contact.update_manifold(
            &a,
            &Transform::IDENTITY,
            &b,
            &Transform::new(Vec2::new(0.5, 0.0), 0.0),
            true,
        );
        assert!(update.began);
        assert!(contact.is_touching());
        assert_eq!(contact.manifold.point_count, 0);
    }

    #[test]
    fn material_mixing_rules() {
        let body = EntityId::default();
        let fa = Fixture::from_def(
            body,
            &crate::core::fixture::FixtureDef::new(Shape::circle(1.0))
                .friction(0.4)
                .restitution(0.1)
                .restitution_threshold(2.0),
        );
        let fb = Fixture::from_def(
            body,
            &crate::core::fixture::FixtureDef::new(Shape::circle(1.0))
                .friction(0.9)
                .restitution(0.8)
                .restitution_threshold(0.5),
        );

        let (friction, restitution, threshold) = Contact::mixed_material(&fa, &fb);
        assert!((friction - (0.4f32 * 0.9).sqrt()).abs() < 1e-6);
        assert_eq!(restitution, 0.8);
        assert_eq!(threshold, 0.5);
    }
}
