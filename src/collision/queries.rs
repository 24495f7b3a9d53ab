use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::utils::allocator::EntityId;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec2::splat(f32::MAX),
            max: Vec2::splat(f32::MIN),
        }
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.extend(*p);
        }
        aabb
    }

    pub fn extend(&mut self, point: Vec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn is_valid(&self) -> bool {
        let d = self.max - self.min;
        d.x >= 0.0 && d.y >= 0.0 && self.min.is_finite() && self.max.is_finite()
    }

    pub fn center(&self) -> Vec2 {
        0.5 * (self.min + self.max)
    }

    pub fn extents(&self) -> Vec2 {
        0.5 * (self.max - self.min)
    }

    /// Sum of edge lengths; the surface-area analogue driving tree insertion.
    pub fn perimeter(&self) -> f32 {
        let d = self.max - self.min;
        2.0 * (d.x + d.y)
    }

    pub fn combine(a: Aabb, b: Aabb) -> Aabb {
        Aabb {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    pub fn union_with(&mut self, other: Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d1 = other.min - self.max;
        let d2 = self.min - other.max;
        d1.x <= 0.0 && d1.y <= 0.0 && d2.x <= 0.0 && d2.y <= 0.0
    }

    pub fn expanded(&self, margin: f32) -> Aabb {
        let r = Vec2::splat(margin);
        Aabb {
            min: self.min - r,
            max: self.max + r,
        }
    }

    /// Slab-based segment intersection used by shape ray casts.
    /// Returns false when the segment is parallel to an axis and outside
    /// its slab, or when the slab intervals do not intersect in `[0, max]`.
    pub fn ray_cast(&self, input: &RayCastInput) -> Option<RayCastOutput> {
        let mut tmin = f32::MIN;
        let mut tmax = f32::MAX;

        let p = input.p1;
        let d = input.p2 - input.p1;
        let abs_d = d.abs();

        let mut normal = Vec2::ZERO;
        for i in 0..2 {
            let (p_i, d_i, abs_d_i, min_i, max_i) = if i == 0 {
                (p.x, d.x, abs_d.x, self.min.x, self.max.x)
            } else {
                (p.y, d.y, abs_d.y, self.min.y, self.max.y)
            };

            if abs_d_i < f32::EPSILON {
                if p_i < min_i || max_i < p_i {
                    return None;
                }
            } else {
                let inv_d = 1.0 / d_i;
                let mut t1 = (min_i - p_i) * inv_d;
                let mut t2 = (max_i - p_i) * inv_d;
                let mut s = -1.0;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                    s = 1.0;
                }
                if t1 > tmin {
                    normal = if i == 0 {
                        Vec2::new(s, 0.0)
                    } else {
                        Vec2::new(0.0, s)
                    };
                    tmin = t1;
                }
                tmax = tmax.min(t2);
                if tmin > tmax {
                    return None;
                }
            }
        }

        if tmin < 0.0 || input.max_fraction < tmin {
            return None;
        }

        Some(RayCastOutput {
            normal,
            fraction: tmin,
        })
    }
}

/// Ray (really: segment) cast input; the cast runs from `p1` toward `p2`,
/// clipped to `max_fraction` of that segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RayCastInput {
    pub p1: Vec2,
    pub p2: Vec2,
    pub max_fraction: f32,
}

/// Ray cast hit: the point is `p1 + fraction · (p2 − p1)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RayCastOutput {
    pub normal: Vec2,
    pub fraction: f32,
}

/// Convenience ray cast query resolved against the whole world.
#[derive(Debug, Clone)]
pub struct RaycastQuery {
    pub origin: Vec2,
    pub direction: Vec2,
    pub max_distance: f32,
    pub ignore_sensors: bool,
}

impl Default for RaycastQuery {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            direction: Vec2::X,
            max_distance: f32::MAX,
            ignore_sensors: false,
        }
    }
}

impl RaycastQuery {
    pub fn new(origin: Vec2, direction: Vec2, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
            ..Self::default()
        }
    }
}

/// Result of a convenience ray cast against the world.
#[derive(Debug, Clone)]
pub struct RaycastHit {
    pub body_id: EntityId,
    pub fixture_id: EntityId,
    pub point: Vec2,
    pub normal: Vec2,
    pub fraction: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_symmetric_and_touch_counts() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(1.0));
        let b = Aabb::new(Vec2::splat(1.0), Vec2::splat(2.0));
        let c = Aabb::new(Vec2::splat(1.1), Vec2::splat(2.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn ray_misses_parallel_slab_outside_box() {
        let aabb = Aabb::new(Vec2::ZERO, Vec2::splat(1.0));
        let input = RayCastInput {
            p1: Vec2::new(-1.0, 2.0),
            p2: Vec2::new(3.0, 2.0),
            max_fraction: 1.0,
        };
        assert!(aabb.ray_cast(&input).is_none());
    }

    #[test]
    fn ray_reports_entry_face_normal() {
        let aabb = Aabb::new(Vec2::ZERO, Vec2::splat(1.0));
        let input = RayCastInput {
            p1: Vec2::new(-1.0, 0.5),
            p2: Vec2::new(2.0, 0.5),
            max_fraction: 1.0,
        };
        let out = aabb.ray_cast(&input).unwrap();
        assert_eq!(out.normal, Vec2::new(-1.0, 0.0));
        assert!((out.fraction - 1.0 / 3.0).abs() < 1e-6);
    }
}
