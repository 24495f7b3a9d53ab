use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    collision::{
        broadphase::BroadPhase,
        queries::Aabb,
        shapes::Shape,
    },
    config::DEFAULT_RESTITUTION_THRESHOLD,
    core::types::{MassData, Transform},
    utils::allocator::EntityId,
};

/// Category/mask/group collision filtering, applied before any narrow
/// phase work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionFilter {
    /// Bit identifying what this fixture is.
    pub category_bits: u16,
    /// Bits identifying what this fixture collides with.
    pub mask_bits: u16,
    /// Same non-zero group: positive always collides, negative never.
    pub group_index: i16,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            group_index: 0,
        }
    }
}

impl CollisionFilter {
    /// Default pairwise rule: the group index wins when shared and
    /// non-zero, otherwise both category/mask directions must agree.
    pub fn should_collide(&self, other: &CollisionFilter) -> bool {
        if self.group_index == other.group_index && self.group_index != 0 {
            return self.group_index > 0;
        }
        (self.mask_bits & other.category_bits) != 0
            && (self.category_bits & other.mask_bits) != 0
    }
}

/// Construction parameters for a fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureDef {
    pub shape: Shape,
    pub friction: f32,
    pub restitution: f32,
    /// Relative normal speed below which restitution is ignored.
    pub restitution_threshold: f32,
    pub density: f32,
    pub is_sensor: bool,
    pub filter: CollisionFilter,
}

impl FixtureDef {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            friction: 0.2,
            restitution: 0.0,
            restitution_threshold: DEFAULT_RESTITUTION_THRESHOLD,
            density: 1.0,
            is_sensor: false,
            filter: CollisionFilter::default(),
        }
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn restitution_threshold(mut self, threshold: f32) -> Self {
        self.restitution_threshold = threshold;
        self
    }

    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    pub fn filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// One broad-phase entry of a fixture: chains own one per segment, every
/// other shape exactly one.
#[derive(Debug, Clone, Copy)]
pub struct FixtureProxy {
    pub aabb: Aabb,
    pub proxy_id: i32,
    pub child_index: usize,
}

/// Key stored in the broad-phase tree for each proxy leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyKey {
    pub fixture: EntityId,
    pub child_index: usize,
}

/// Attaches a shape to a body together with its material and filter data.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub(crate) body: EntityId,
    pub shape: Shape,
    pub friction: f32,
    pub restitution: f32,
    pub restitution_threshold: f32,
    pub density: f32,
    pub(crate) sensor: bool,
    pub(crate) filter: CollisionFilter,
    pub(crate) proxies: Vec<FixtureProxy>,
}

impl Fixture {
    pub fn from_def(body: EntityId, def: &FixtureDef) -> Self {
        debug_assert!(def.density.is_finite() && def.density >= 0.0);
        debug_assert!(def.friction.is_finite() && def.friction >= 0.0);
        Self {
            body,
            shape: def.shape.clone(),
            friction: def.friction,
            restitution: def.restitution,
            restitution_threshold: def.restitution_threshold,
            density: def.density,
            sensor: def.is_sensor,
            filter: def.filter,
            proxies: Vec::new(),
        }
    }

    pub fn body_id(&self) -> EntityId {
        self.body
    }

    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    pub fn filter(&self) -> &CollisionFilter {
        &self.filter
    }

    pub fn mass_data(&self) -> MassData {
        self.shape.compute_mass(self.density)
    }

    pub fn test_point(&self, xf: &Transform, point: Vec2) -> bool {
        self.shape.test_point(xf, point)
    }

    /// Registers one broad-phase proxy per shape child at the transform.
    pub(crate) fn create_proxies(
        &mut self,
        fixture_id: EntityId,
        broadphase: &mut BroadPhase<ProxyKey>,
        xf: &Transform,
    ) {
        debug_assert!(self.proxies.is_empty());
        for child_index in 0..self.shape.child_count() {
            let aabb = self.shape.compute_aabb(xf, child_index);
            let proxy_id = broadphase.create_proxy(
                aabb,
                ProxyKey {
                    fixture: fixture_id,
                    child_index,
                },
            );
            self.proxies.push(FixtureProxy {
                aabb,
                proxy_id,
                child_index,
            });
        }
    }

    pub(crate) fn destroy_proxies(&mut self, broadphase: &mut BroadPhase<ProxyKey>) {
        for proxy in self.proxies.drain(..) {
            broadphase.destroy_proxy(proxy.proxy_id);
        }
    }

    /// Moves each proxy to the swept AABB covering both transforms; the
    /// displacement drives predictive fattening in the tree.
    pub(crate) fn synchronize(
        &mut self,
        broadphase: &mut BroadPhase<ProxyKey>,
        xf1: &Transform,
        xf2: &Transform,
    ) {
        for proxy in self.proxies.iter_mut() {
            let aabb1 = self.shape.compute_aabb(xf1, proxy.child_index);
            let aabb2 = self.shape.compute_aabb(xf2, proxy.child_index);
            proxy.aabb = Aabb::combine(aabb1, aabb2);
            let displacement = aabb2.center() - aabb1.center();
            broadphase.move_proxy(proxy.proxy_id, proxy.aabb, displacement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_index_overrides_category_mask() {
        let mut a = CollisionFilter::default();
        let mut b = CollisionFilter::default();

        a.group_index = 3;
        b.group_index = 3;
        assert!(a.should_collide(&b));

        a.group_index = -3;
        b.group_index = -3;
        assert!(!a.should_collide(&b));
    }

    #[test]
    fn category_mask_must_agree_both_ways() {
        let a = CollisionFilter {
            category_bits: 0x0002,
            mask_bits: 0x0004,
            group_index: 0,
        };
        let b = CollisionFilter {
            category_bits: 0x0004,
            mask_bits: 0x0002,
            group_index: 0,
        };
        let deaf = CollisionFilter {
            category_bits: 0x0004,
            mask_bits: 0x0008,
            group_index: 0,
        };
        assert!(a.should_collide(&b));
        assert!(!a.should_collide(&deaf));
    }

    #[test]
    fn chain_fixture_creates_one_proxy_per_segment() {
        use crate::collision::shapes::Chain;

        let chain = Chain::new(
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(3.0, 0.0),
            ],
            Vec2::new(-1.0, 0.0),
            Vec2::new(4.0, 0.0),
        );
        let def = FixtureDef::new(Shape::Chain(chain));
        let mut fixture = Fixture::from_def(EntityId::default(), &def);

        let mut broadphase = BroadPhase::new();
        fixture.create_proxies(EntityId::default(), &mut broadphase, &Transform::IDENTITY);
        assert_eq!(fixture.proxies.len(), 3);
        assert_eq!(broadphase.proxy_count(), 3);

        fixture.destroy_proxies(&mut broadphase);
        assert_eq!(broadphase.proxy_count(), 0);
    }
}
