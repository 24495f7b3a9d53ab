use glam::Vec2;

use crate::{
    collision::shapes::{DistanceProxy, Shape},
    config::{LINEAR_SLOP, POLYGON_RADIUS},
    core::types::{cross_sv, cross_vs, cross_vv, Transform},
};

const MAX_ITERATIONS: usize = 20;

/// Cached simplex from a previous [`distance`] call. Seeds the next call so
/// temporally coherent queries converge in one or two iterations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplexCache {
    /// Length for a 2-simplex, signed area for a 3-simplex.
    pub metric: f32,
    pub count: u16,
    pub index_a: [u8; 3],
    pub index_b: [u8; 3],
}

#[derive(Debug, Clone)]
pub struct DistanceInput {
    pub proxy_a: DistanceProxy,
    pub proxy_b: DistanceProxy,
    pub transform_a: Transform,
    pub transform_b: Transform,
    pub use_radii: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceOutput {
    /// Closest point on shape A.
    pub point_a: Vec2,
    /// Closest point on shape B.
    pub point_b: Vec2,
    pub distance: f32,
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct SimplexVertex {
    /// Support point on proxy A (world).
    w_a: Vec2,
    /// Support point on proxy B (world).
    w_b: Vec2,
    /// `w_b − w_a`.
    w: Vec2,
    /// Barycentric coordinate for the closest point.
    a: f32,
    index_a: usize,
    index_b: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Simplex {
    v: [SimplexVertex; 3],
    count: usize,
}

impl Simplex {
    fn read_cache(
        cache: &SimplexCache,
        proxy_a: &DistanceProxy,
        xf_a: &Transform,
        proxy_b: &DistanceProxy,
        xf_b: &Transform,
    ) -> Self {
        debug_assert!(cache.count <= 3);
        let mut simplex = Simplex::default();

        simplex.count = cache.count as usize;
        for i in 0..simplex.count {
            let index_a = cache.index_a[i] as usize;
            let index_b = cache.index_b[i] as usize;
            let w_a = xf_a.apply(proxy_a.vertex(index_a));
            let w_b = xf_b.apply(proxy_b.vertex(index_b));
            simplex.v[i] = SimplexVertex {
                w_a,
                w_b,
                w: w_b - w_a,
                a: 0.0,
                index_a,
                index_b,
            };
        }

        // Discard a stale cache: the metric window guards against large
        // relative motion invalidating the seeded simplex.
        if simplex.count > 1 {
            let metric1 = cache.metric;
            let metric2 = simplex.metric();
            if metric2 < 0.5 * metric1 || 2.0 * metric1 < metric2 || metric2 < f32::EPSILON {
                simplex.count = 0;
            }
        }

        if simplex.count == 0 {
            let w_a = xf_a.apply(proxy_a.vertex(0));
            let w_b = xf_b.apply(proxy_b.vertex(0));
            simplex.v[0] = SimplexVertex {
                w_a,
                w_b,
                w: w_b - w_a,
                a: 1.0,
                index_a: 0,
                index_b: 0,
            };
            simplex.count = 1;
        }

        simplex
    }

    fn write_cache(&self, cache: &mut SimplexCache) {
        cache.metric = self.metric();
        cache.count = self.count as u16;
        for i in 0..self.count {
            cache.index_a[i] = self.v[i].index_a as u8;
            cache.index_b[i] = self.v[i].index_b as u8;
        }
    }

    fn search_direction(&self) -> Vec2 {
        match self.count {
            1 => -self.v[0].w,
            2 => {
                let e12 = self.v[1].w - self.v[0].w;
                let sgn = cross_vv(e12, -self.v[0].w);
                if sgn > 0.0 {
                    // Origin is left of e12.
                    cross_sv(1.0, e12)
                } else {
                    cross_vs(e12, 1.0)
                }
            }
            _ => {
                debug_assert!(false, "search direction on a full simplex");
                Vec2::ZERO
            }
        }
    }

    fn closest_point(&self) -> Vec2 {
        match self.count {
            1 => self.v[0].w,
            2 => self.v[0].a * self.v[0].w + self.v[1].a * self.v[1].w,
            3 => Vec2::ZERO,
            _ => unreachable!(),
        }
    }

    fn witness_points(&self) -> (Vec2, Vec2) {
        match self.count {
            1 => (self.v[0].w_a, self.v[0].w_b),
            2 => (
                self.v[0].a * self.v[0].w_a + self.v[1].a * self.v[1].w_a,
                self.v[0].a * self.v[0].w_b + self.v[1].a * self.v[1].w_b,
            ),
            3 => {
                let p = self.v[0].a * self.v[0].w_a
                    + self.v[1].a * self.v[1].w_a
                    + self.v[2].a * self.v[2].w_a;
                (p, p)
            }
            _ => unreachable!(),
        }
    }

    fn metric(&self) -> f32 {
        match self.count {
            1 => 0.0,
            2 => (self.v[1].w - self.v[0].w).length(),
            3 => cross_vv(self.v[1].w - self.v[0].w, self.v[2].w - self.v[0].w),
            _ => unreachable!(),
        }
    }

    /// Closest point on segment `w1 w2` to the origin, expressed through
    /// the Voronoi regions of the segment.
    fn solve2(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let e12 = w2 - w1;

        let d12_2 = -w1.dot(e12);
        if d12_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        let d12_1 = w2.dot(e12);
        if d12_1 <= 0.0 {
            self.v[0] = self.v[1];
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        let inv_d12 = 1.0 / (d12_1 + d12_2);
        self.v[0].a = d12_1 * inv_d12;
        self.v[1].a = d12_2 * inv_d12;
        self.count = 2;
    }

    /// Closest feature of triangle `w1 w2 w3` to the origin via the full
    /// Voronoi region enumeration.
    fn solve3(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let w3 = self.v[2].w;

        let e12 = w2 - w1;
        let d12_1 = w2.dot(e12);
        let d12_2 = -w1.dot(e12);

        let e13 = w3 - w1;
        let d13_1 = w3.dot(e13);
        let d13_2 = -w1.dot(e13);

        let e23 = w3 - w2;
        let d23_1 = w3.dot(e23);
        let d23_2 = -w2.dot(e23);

        let n123 = cross_vv(e12, e13);
        let d123_1 = n123 * cross_vv(w2, w3);
        let d123_2 = n123 * cross_vv(w3, w1);
        let d123_3 = n123 * cross_vv(w1, w2);

        // Vertex w1
        if d12_2 <= 0.0 && d13_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        // Edge w1-w2
        if d12_1 > 0.0 && d12_2 > 0.0 && d123_3 <= 0.0 {
            let inv = 1.0 / (d12_1 + d12_2);
            self.v[0].a = d12_1 * inv;
            self.v[1].a = d12_2 * inv;
            self.count = 2;
            return;
        }

        // Edge w1-w3
        if d13_1 > 0.0 && d13_2 > 0.0 && d123_2 <= 0.0 {
            let inv = 1.0 / (d13_1 + d13_2);
            self.v[0].a = d13_1 * inv;
            self.v[2].a = d13_2 * inv;
            self.v[1] = self.v[2];
            self.count = 2;
            return;
        }

        // Vertex w2
        if d12_1 <= 0.0 && d23_2 <= 0.0 {
            self.v[0] = self.v[1];
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        // Vertex w3
        if d13_1 <= 0.0 && d23_1 <= 0.0 {
            self.v[0] = self.v[2];
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        // Edge w2-w3
        if d23_1 > 0.0 && d23_2 > 0.0 && d123_1 <= 0.0 {
            let inv = 1.0 / (d23_1 + d23_2);
            self.v[1].a = d23_1 * inv;
            self.v[2].a = d23_2 * inv;
            self.v[0] = self.v[2];
            self.count = 2;
            return;
        }

        // Interior: the triangle encloses the origin.
        let inv = 1.0 / (d123_1 + d123_2 + d123_3);
        self.v[0].a = d123_1 * inv;
        self.v[1].a = d123_2 * inv;
        self.v[2].a = d123_3 * inv;
        self.count = 3;
    }
}

/// GJK closest-point query between two convex proxies. The cache is
/// consulted on entry and written back for the next call.
pub fn distance(input: &DistanceInput, cache: &mut SimplexCache) -> DistanceOutput {
    let proxy_a = &input.proxy_a;
    let proxy_b = &input.proxy_b;
    let xf_a = input.transform_a;
    let xf_b = input.transform_b;

    let mut simplex = Simplex::read_cache(cache, proxy_a, &xf_a, proxy_b, &xf_b);

    let mut save_a = [0usize; 3];
    let mut save_b = [0usize; 3];

    let mut iterations = 0;
    while iterations < MAX_ITERATIONS {
        let save_count = simplex.count;
        for i in 0..save_count {
            save_a[i] = simplex.v[i].index_a;
            save_b[i] = simplex.v[i].index_b;
        }

        match simplex.count {
            1 => {}
            2 => simplex.solve2(),
            3 => simplex.solve3(),
            _ => unreachable!(),
        }

        // The triangle encloses the origin: overlap.
        if simplex.count == 3 {
            break;
        }

        let d = simplex.search_direction();
        if d.length_squared() < f32::EPSILON * f32::EPSILON {
            // The origin is probably contained by a line segment or
            // triangle; leaving now avoids dividing by a vanishing
            // direction. The witness points are still usable.
            break;
        }

        let index_a = proxy_a.support(xf_a.q.apply_inv(-d));
        let index_b = proxy_b.support(xf_b.q.apply_inv(d));
        let w_a = xf_a.apply(proxy_a.vertex(index_a));
        let w_b = xf_b.apply(proxy_b.vertex(index_b));

        let vertex = &mut simplex.v[simplex.count];
        *vertex = SimplexVertex {
            w_a,
            w_b,
            w: w_b - w_a,
            a: 0.0,
            index_a,
            index_b,
        };

        iterations += 1;

        // A repeated support point means no progress is possible.
        let duplicate = (0..save_count).any(|i| save_a[i] == index_a && save_b[i] == index_b);
        if duplicate {
            break;
        }

        simplex.count += 1;
    }

    let (mut point_a, mut point_b) = simplex.witness_points();
    let mut dist = (point_a - point_b).length();
    simplex.write_cache(cache);

    if input.use_radii {
        let r_a = proxy_a.radius;
        let r_b = proxy_b.radius;

        if dist > r_a + r_b && dist > f32::EPSILON {
            // Shapes still separated; pull witness points onto the surfaces.
            dist -= r_a + r_b;
            let normal = (point_b - point_a).normalize();
            point_a += r_a * normal;
            point_b -= r_b * normal;
        } else {
            // Overlapping with radii: collapse witness points to the midpoint.
            let p = 0.5 * (point_a + point_b);
            point_a = p;
            point_b = p;
            dist = 0.0;
        }
    }

    DistanceOutput {
        point_a,
        point_b,
        distance: dist,
        iterations,
    }
}

/// Boolean overlap test between two shape children.
pub fn test_overlap(
    shape_a: &Shape,
    child_a: usize,
    shape_b: &Shape,
    child_b: usize,
    xf_a: &Transform,
    xf_b: &Transform,
) -> bool {
    let input = DistanceInput {
        proxy_a: DistanceProxy::new(shape_a, child_a),
        proxy_b: DistanceProxy::new(shape_b, child_b),
        transform_a: *xf_a,
        transform_b: *xf_b,
        use_radii: true,
    };
    let mut cache = SimplexCache::default();
    let output = distance(&input, &mut cache);
    output.distance < 10.0 * f32::EPSILON
}

#[derive(Debug, Clone)]
pub struct ShapeCastInput {
    pub proxy_a: DistanceProxy,
    pub proxy_b: DistanceProxy,
    pub transform_a: Transform,
    pub transform_b: Transform,
    /// Sweep translation of proxy B relative to A over the cast.
    pub translation_b: Vec2,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeCastOutput {
    pub point: Vec2,
    pub normal: Vec2,
    pub lambda: f32,
    pub iterations: usize,
}

/// GJK-based ray cast of swept proxy B against proxy A. Returns `None` on
/// initial overlap or when no hit exists within the translation.
pub fn shape_cast(input: &ShapeCastInput) -> Option<ShapeCastOutput> {
    let proxy_a = &input.proxy_a;
    let proxy_b = &input.proxy_b;
    let xf_a = input.transform_a;
    let xf_b = input.transform_b;

    let radius_a = proxy_a.radius.max(POLYGON_RADIUS);
    let radius_b = proxy_b.radius.max(POLYGON_RADIUS);
    let radius = radius_a + radius_b;

    let r = input.translation_b;
    let mut n = Vec2::ZERO;
    let mut lambda = 0.0f32;

    let mut simplex = Simplex::default();

    let mut index_a = proxy_a.support(xf_a.q.apply_inv(-r));
    let mut w_a = xf_a.apply(proxy_a.vertex(index_a));
    let mut index_b = proxy_b.support(xf_b.q.apply_inv(r));
    let mut w_b = xf_b.apply(proxy_b.vertex(index_b));
    let mut v = w_a - w_b;

    // Target separation between the cores.
    let sigma = POLYGON_RADIUS.max(radius - POLYGON_RADIUS);
    let tolerance = 0.5 * LINEAR_SLOP;

    let mut iterations = 0;
    while iterations < MAX_ITERATIONS && v.length() - sigma > tolerance {
        debug_assert!(simplex.count < 3);

        index_a = proxy_a.support(xf_a.q.apply_inv(-v));
        w_a = xf_a.apply(proxy_a.vertex(index_a));
        index_b = proxy_b.support(xf_b.q.apply_inv(v));
        w_b = xf_b.apply(proxy_b.vertex(index_b));
        let p = w_a - w_b;

        // -v is a normal at p.
        v = v.normalize();

        // Intersect the cast ray with the support plane.
        let vp = v.dot(p);
        let vr = v.dot(r);
        if vp - sigma > lambda * vr {
            if vr <= 0.0 {
                return None;
            }
            lambda = (vp - sigma) / vr;
            if lambda > 1.0 {
                return None;
            }
            n = -v;
            simplex.count = 0;
        }

        // The simplex works with B − A, so the roles reverse here. The
        // stored point shifts by lambda·r to track the clip position while
        // the plane equation stays in unshifted space.
        let vertex = &mut simplex.v[simplex.count];
        *vertex = SimplexVertex {
            index_a: index_b,
            w_a: w_b + lambda * r,
            index_b: index_a,
            w_b: w_a,
            w: Vec2::ZERO,
            a: 1.0,
        };
        vertex.w = vertex.w_b - vertex.w_a;
        simplex.count += 1;

        match simplex.count {
            1 => {}
            2 => simplex.solve2(),
            3 => simplex.solve3(),
            _ => unreachable!(),
        }

        // Three points means the origin sits inside the simplex: overlap.
        if simplex.count == 3 {
            return None;
        }

        v = simplex.closest_point();
        iterations += 1;
    }

    if iterations == 0 {
        // Initial overlap.
        return None;
    }

    // The simplex stores B in the A slots, so the second witness lies on A.
    let (_point_b, point_a) = simplex.witness_points();
    if v.length_squared() > 0.0 {
        n = (-v).normalize();
    }

    Some(ShapeCastOutput {
        point: point_a + radius_a * n,
        normal: n,
        lambda,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn box_proxy(half: f32) -> DistanceProxy {
        DistanceProxy::new(&Shape::cuboid(half, half), 0)
    }

    #[test]
    fn separated_boxes_report_gap_distance() {
        let input = DistanceInput {
            proxy_a: box_proxy(0.5),
            proxy_b: box_proxy(0.5),
            transform_a: Transform::IDENTITY,
            transform_b: Transform::new(Vec2::new(3.0, 0.0), 0.0),
            use_radii: false,
        };
        let mut cache = SimplexCache::default();
        let out = distance(&input, &mut cache);
        assert_relative_eq!(out.distance, 2.0, epsilon = 1e-4);
        assert!(out.iterations <= MAX_ITERATIONS);
    }

    #[test]
    fn overlapping_squares_have_zero_distance_and_shared_witness() {
        // Unit squares offset by half their size: deep overlap.
        let shape = Shape::cuboid(0.5, 0.5);
        let xf_b = Transform::new(Vec2::new(0.5, 0.5), 0.0);
        assert!(test_overlap(
            &shape,
            0,
            &shape,
            0,
            &Transform::IDENTITY,
            &xf_b
        ));

        let input = DistanceInput {
            proxy_a: box_proxy(0.5),
            proxy_b: box_proxy(0.5),
            transform_a: Transform::IDENTITY,
            transform_b: xf_b,
            use_radii: true,
        };
        let mut cache = SimplexCache::default();
        let out = distance(&input, &mut cache);
        assert_eq!(out.distance, 0.0);
        assert_eq!(out.point_a, out.point_b);
        // The shared witness lies inside both squares.
        assert!(shape.test_point(&Transform::IDENTITY, out.point_a));
        assert!(shape.test_point(&xf_b, out.point_a));
    }

    #[test]
    fn warm_cache_converges_immediately() {
        let input = DistanceInput {
            proxy_a: box_proxy(0.5),
            proxy_b: box_proxy(0.5),
            transform_a: Transform::IDENTITY,
            transform_b: Transform::new(Vec2::new(2.0, 0.3), 0.1),
            use_radii: false,
        };
        let mut cache = SimplexCache::default();
        let cold = distance(&input, &mut cache);
        let warm = distance(&input, &mut cache);
        assert!(warm.iterations <= cold.iterations);
        assert_relative_eq!(warm.distance, cold.distance, epsilon = 1e-5);
    }

    #[test]
    fn shape_cast_finds_first_touch() {
        let input = ShapeCastInput {
            proxy_a: box_proxy(0.5),
            proxy_b: DistanceProxy::new(&Shape::circle(0.5), 0),
            transform_a: Transform::IDENTITY,
            transform_b: Transform::new(Vec2::new(-4.0, 0.0), 0.0),
            translation_b: Vec2::new(8.0, 0.0),
        };
        let out = shape_cast(&input).expect("cast should hit");
        // Touch when circle center reaches x = -1 (0.5 box + 0.5 radius),
        // i.e. after 3 of the 8 units of travel.
        assert_relative_eq!(out.lambda, 3.0 / 8.0, epsilon = 1e-2);
        assert!(out.normal.x < -0.99);
    }

    #[test]
    fn shape_cast_rejects_initial_overlap() {
        let input = ShapeCastInput {
            proxy_a: box_proxy(0.5),
            proxy_b: box_proxy(0.5),
            transform_a: Transform::IDENTITY,
            transform_b: Transform::new(Vec2::new(0.25, 0.0), 0.0),
            translation_b: Vec2::new(1.0, 0.0),
        };
        assert!(shape_cast(&input).is_none());
    }
}
