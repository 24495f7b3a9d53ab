use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    collision::queries::{Aabb, RayCastInput, RayCastOutput},
    config::{LINEAR_SLOP, MAX_POLYGON_VERTICES, POLYGON_RADIUS},
    core::types::{cross_vv, MassData, Transform},
};

/// Solid circle centered at a body-local position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub position: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(radius: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            radius,
        }
    }

    pub fn with_position(position: Vec2, radius: f32) -> Self {
        Self { position, radius }
    }
}

/// Line segment with optional ghost vertices for smooth chain traversal.
/// A one-sided edge only collides on the side its normal points to, which
/// suppresses internal hits when the edge belongs to a chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub vertex1: Vec2,
    pub vertex2: Vec2,
    pub vertex0: Vec2,
    pub vertex3: Vec2,
    pub one_sided: bool,
}

impl Edge {
    /// Two-sided free-standing edge.
    pub fn two_sided(v1: Vec2, v2: Vec2) -> Self {
        Self {
            vertex1: v1,
            vertex2: v2,
            vertex0: Vec2::ZERO,
            vertex3: Vec2::ZERO,
            one_sided: false,
        }
    }

    /// One-sided edge with adjacent ghost vertices `v0` and `v3`.
    pub fn one_sided(v0: Vec2, v1: Vec2, v2: Vec2, v3: Vec2) -> Self {
        Self {
            vertex1: v1,
            vertex2: v2,
            vertex0: v0,
            vertex3: v3,
            one_sided: true,
        }
    }
}

/// Convex polygon with at most [`MAX_POLYGON_VERTICES`] vertices in CCW
/// order, matching outward normals, and a precomputed centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
    pub normals: Vec<Vec2>,
    pub centroid: Vec2,
}

impl Polygon {
    /// Builds a convex hull from the given points. Degenerate input falls
    /// back to a 1×1 box.
    pub fn new(points: &[Vec2]) -> Self {
        let mut polygon = Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            centroid: Vec2::ZERO,
        };
        polygon.set(points);
        polygon
    }

    /// Axis-aligned box with the given half extents.
    pub fn new_box(half_width: f32, half_height: f32) -> Self {
        let mut polygon = Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            centroid: Vec2::ZERO,
        };
        polygon.set_as_box(half_width, half_height);
        polygon
    }

    /// Box with the given half extents, local center, and local rotation.
    pub fn new_oriented_box(half_width: f32, half_height: f32, center: Vec2, angle: f32) -> Self {
        let mut polygon = Self::new_box(half_width, half_height);
        polygon.centroid = center;
        let xf = Transform::new(center, angle);
        for v in polygon.vertices.iter_mut() {
            *v = xf.apply(*v);
        }
        for n in polygon.normals.iter_mut() {
            *n = xf.q.apply(*n);
        }
        polygon
    }

    pub fn set_as_box(&mut self, half_width: f32, half_height: f32) {
        self.vertices = vec![
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ];
        self.normals = vec![
            Vec2::new(0.0, -1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
        ];
        self.centroid = Vec2::ZERO;
    }

    pub fn set(&mut self, points: &[Vec2]) {
        assert!(
            points.len() >= 3 && points.len() <= MAX_POLYGON_VERTICES,
            "polygon vertex count {} outside [3, {}]",
            points.len(),
            MAX_POLYGON_VERTICES
        );

        // Weld vertices closer than half the slop; duplicates wreck the hull.
        let weld_distance_sq = (0.5 * LINEAR_SLOP) * (0.5 * LINEAR_SLOP);
        let mut unique: Vec<Vec2> = Vec::with_capacity(points.len());
        for p in points {
            if unique
                .iter()
                .all(|u| (*u - *p).length_squared() > weld_distance_sq)
            {
                unique.push(*p);
            }
        }

        if unique.len() < 3 {
            warn!("degenerate polygon input, substituting unit box");
            self.set_as_box(1.0, 1.0);
            return;
        }

        // Gift wrapping from the rightmost point.
        let mut right = 0;
        let mut max_x = unique[0].x;
        for (i, p) in unique.iter().enumerate().skip(1) {
            if p.x > max_x || (p.x == max_x && p.y < unique[right].y) {
                right = i;
                max_x = p.x;
            }
        }

        let mut hull = Vec::with_capacity(unique.len());
        let mut index = right;
        loop {
            hull.push(index);
            let mut next = (index + 1) % unique.len();
            for candidate in 0..unique.len() {
                if candidate == index {
                    continue;
                }
                let r = unique[next] - unique[index];
                let v = unique[candidate] - unique[index];
                let c = cross_vv(r, v);
                if c < 0.0 || (c == 0.0 && v.length_squared() > r.length_squared()) {
                    next = candidate;
                }
            }
            index = next;
            if index == right {
                break;
            }
        }

        if hull.len() < 3 {
            warn!("collinear polygon input, substituting unit box");
            self.set_as_box(1.0, 1.0);
            return;
        }

        self.vertices = hull.iter().map(|&i| unique[i]).collect();
        self.normals = (0..self.vertices.len())
            .map(|i| {
                let i2 = (i + 1) % self.vertices.len();
                let edge = self.vertices[i2] - self.vertices[i];
                debug_assert!(edge.length_squared() > f32::EPSILON * f32::EPSILON);
                Vec2::new(edge.y, -edge.x).normalize()
            })
            .collect();
        self.centroid = compute_centroid(&self.vertices);
    }

    pub fn count(&self) -> usize {
        self.vertices.len()
    }
}

fn compute_centroid(vertices: &[Vec2]) -> Vec2 {
    debug_assert!(vertices.len() >= 3);

    // Triangle fan around an interior reference point for accuracy.
    let origin = vertices.iter().copied().sum::<Vec2>() / vertices.len() as f32;

    let mut center = Vec2::ZERO;
    let mut area = 0.0;
    let inv3 = 1.0 / 3.0;
    for i in 0..vertices.len() {
        let e1 = vertices[i] - origin;
        let e2 = vertices[(i + 1) % vertices.len()] - origin;
        let triangle_area = 0.5 * cross_vv(e1, e2);
        area += triangle_area;
        center += triangle_area * inv3 * (e1 + e2);
    }

    debug_assert!(area > f32::EPSILON);
    center * (1.0 / area) + origin
}

/// Ordered vertex sequence exposing one one-sided [`Edge`] child per
/// segment. Ghost vertices at both ends suppress collisions against the
/// chain interior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub vertices: Vec<Vec2>,
    pub prev_vertex: Vec2,
    pub next_vertex: Vec2,
}

impl Chain {
    /// Open chain with explicit ghost vertices.
    pub fn new(vertices: &[Vec2], prev_vertex: Vec2, next_vertex: Vec2) -> Self {
        assert!(vertices.len() >= 2, "chain needs at least two vertices");
        Self::validate(vertices);
        Self {
            vertices: vertices.to_vec(),
            prev_vertex,
            next_vertex,
        }
    }

    /// Closed loop; the closing segment is generated automatically.
    pub fn new_loop(vertices: &[Vec2]) -> Self {
        assert!(vertices.len() >= 3, "chain loop needs at least three vertices");
        Self::validate(vertices);
        let mut all = vertices.to_vec();
        all.push(vertices[0]);
        Self {
            prev_vertex: all[all.len() - 2],
            next_vertex: all[1],
            vertices: all,
        }
    }

    fn validate(vertices: &[Vec2]) {
        for pair in vertices.windows(2) {
            assert!(
                (pair[1] - pair[0]).length_squared() > LINEAR_SLOP * LINEAR_SLOP,
                "chain vertices too close together"
            );
        }
    }

    pub fn child_count(&self) -> usize {
        self.vertices.len() - 1
    }

    /// One-sided edge for segment `index`, with ghost vertices taken from
    /// the neighboring segments (or the chain's end ghosts).
    pub fn child_edge(&self, index: usize) -> Edge {
        assert!(index < self.child_count(), "chain child index out of range");
        let v0 = if index > 0 {
            self.vertices[index - 1]
        } else {
            self.prev_vertex
        };
        let v3 = if index < self.vertices.len() - 2 {
            self.vertices[index + 2]
        } else {
            self.next_vertex
        };
        Edge::one_sided(v0, self.vertices[index], self.vertices[index + 1], v3)
    }
}

/// Tagged union over the supported collision geometries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Circle(Circle),
    Edge(Edge),
    Polygon(Polygon),
    Chain(Chain),
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle(Circle::new(radius))
    }

    pub fn circle_at(position: Vec2, radius: f32) -> Self {
        Shape::Circle(Circle::with_position(position, radius))
    }

    pub fn edge(v1: Vec2, v2: Vec2) -> Self {
        Shape::Edge(Edge::two_sided(v1, v2))
    }

    pub fn cuboid(half_width: f32, half_height: f32) -> Self {
        Shape::Polygon(Polygon::new_box(half_width, half_height))
    }

    pub fn polygon(points: &[Vec2]) -> Self {
        Shape::Polygon(Polygon::new(points))
    }

    /// Skin radius of the shape. Polygons, edges, and chain segments carry
    /// the fixed [`POLYGON_RADIUS`] skin.
    pub fn radius(&self) -> f32 {
        match self {
            Shape::Circle(c) => c.radius,
            Shape::Edge(_) | Shape::Polygon(_) | Shape::Chain(_) => POLYGON_RADIUS,
        }
    }

    /// Number of broad-phase children: one per chain segment, one otherwise.
    pub fn child_count(&self) -> usize {
        match self {
            Shape::Chain(chain) => chain.child_count(),
            _ => 1,
        }
    }

    pub fn compute_aabb(&self, xf: &Transform, child_index: usize) -> Aabb {
        match self {
            Shape::Circle(c) => {
                let p = xf.apply(c.position);
                Aabb::new(p - Vec2::splat(c.radius), p + Vec2::splat(c.radius))
            }
            Shape::Edge(e) => {
                let v1 = xf.apply(e.vertex1);
                let v2 = xf.apply(e.vertex2);
                Aabb::new(v1.min(v2), v1.max(v2)).expanded(POLYGON_RADIUS)
            }
            Shape::Polygon(p) => {
                let mut aabb = Aabb::empty();
                for v in &p.vertices {
                    aabb.extend(xf.apply(*v));
                }
                aabb.expanded(POLYGON_RADIUS)
            }
            Shape::Chain(chain) => {
                let v1 = xf.apply(chain.vertices[child_index]);
                let v2 = xf.apply(chain.vertices[child_index + 1]);
                Aabb::new(v1.min(v2), v1.max(v2)).expanded(POLYGON_RADIUS)
            }
        }
    }

    /// Mass properties at the given density. Edges and chains are
    /// boundary-only and contribute no mass.
    pub fn compute_mass(&self, density: f32) -> MassData {
        match self {
            Shape::Circle(c) => {
                let mass = density * std::f32::consts::PI * c.radius * c.radius;
                MassData {
                    mass,
                    center: c.position,
                    inertia: mass
                        * (0.5 * c.radius * c.radius + c.position.length_squared()),
                }
            }
            Shape::Edge(e) => MassData {
                mass: 0.0,
                center: 0.5 * (e.vertex1 + e.vertex2),
                inertia: 0.0,
            },
            Shape::Polygon(p) => compute_polygon_mass(p, density),
            Shape::Chain(_) => MassData::default(),
        }
    }

    pub fn test_point(&self, xf: &Transform, point: Vec2) -> bool {
        match self {
            Shape::Circle(c) => {
                let center = xf.apply(c.position);
                (point - center).length_squared() <= c.radius * c.radius
            }
            Shape::Polygon(p) => {
                let local = xf.apply_inv(point);
                p.vertices
                    .iter()
                    .zip(p.normals.iter())
                    .all(|(v, n)| n.dot(local - *v) <= 0.0)
            }
            // One-dimensional shapes enclose no area.
            Shape::Edge(_) | Shape::Chain(_) => false,
        }
    }

    pub fn ray_cast(
        &self,
        input: &RayCastInput,
        xf: &Transform,
        child_index: usize,
    ) -> Option<RayCastOutput> {
        match self {
            Shape::Circle(c) => ray_cast_circle(c, input, xf),
            Shape::Edge(e) => ray_cast_edge(e.vertex1, e.vertex2, input, xf),
            Shape::Polygon(p) => ray_cast_polygon(p, input, xf),
            Shape::Chain(chain) => ray_cast_edge(
                chain.vertices[child_index],
                chain.vertices[child_index + 1],
                input,
                xf,
            ),
        }
    }
}

fn compute_polygon_mass(polygon: &Polygon, density: f32) -> MassData {
    debug_assert!(polygon.count() >= 3);

    let vertices = &polygon.vertices;
    let origin = vertices.iter().copied().sum::<Vec2>() / vertices.len() as f32;

    let mut center = Vec2::ZERO;
    let mut area = 0.0;
    let mut inertia = 0.0;
    let inv3 = 1.0 / 3.0;

    for i in 0..vertices.len() {
        let e1 = vertices[i] - origin;
        let e2 = vertices[(i + 1) % vertices.len()] - origin;

        let d = cross_vv(e1, e2);
        let triangle_area = 0.5 * d;
        area += triangle_area;
        center += triangle_area * inv3 * (e1 + e2);

        let intx2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
        let inty2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
        inertia += (0.25 * inv3 * d) * (intx2 + inty2);
    }

    let mass = density * area;
    debug_assert!(area > f32::EPSILON);
    center *= 1.0 / area;
    let local_center = center + origin;

    // Shift inertia from the fan origin to the local body origin.
    let inertia = density * inertia
        + mass * (local_center.length_squared() - center.length_squared());

    MassData {
        mass,
        center: local_center,
        inertia,
    }
}

fn ray_cast_circle(circle: &Circle, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
    let position = xf.apply(circle.position);
    let s = input.p1 - position;
    let b = s.length_squared() - circle.radius * circle.radius;

    let r = input.p2 - input.p1;
    let c = s.dot(r);
    let rr = r.length_squared();
    let sigma = c * c - rr * b;

    if sigma < 0.0 || rr < f32::EPSILON {
        return None;
    }

    let t = -(c + sigma.sqrt());
    if 0.0 <= t && t <= input.max_fraction * rr {
        let t = t / rr;
        return Some(RayCastOutput {
            fraction: t,
            normal: (s + t * r).normalize(),
        });
    }
    None
}

fn ray_cast_edge(v1: Vec2, v2: Vec2, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
    // Work in the edge's frame.
    let p1 = xf.q.apply_inv(input.p1 - xf.p);
    let p2 = xf.q.apply_inv(input.p2 - xf.p);
    let d = p2 - p1;

    let e = v2 - v1;
    let length = e.length();
    if length < f32::EPSILON {
        return None;
    }
    let e_normalized = e / length;
    let normal = Vec2::new(e_normalized.y, -e_normalized.x);

    // q = p1 + t * d with dot(normal, q - v1) = 0
    let numerator = normal.dot(v1 - p1);
    let denominator = normal.dot(d);
    if denominator == 0.0 {
        return None;
    }

    let t = numerator / denominator;
    if t < 0.0 || input.max_fraction < t {
        return None;
    }

    let q = p1 + t * d;
    let s = (q - v1).dot(e_normalized);
    if s < 0.0 || length < s {
        return None;
    }

    let normal = if numerator > 0.0 { -normal } else { normal };
    Some(RayCastOutput {
        fraction: t,
        normal: xf.q.apply(normal),
    })
}

fn ray_cast_polygon(
    polygon: &Polygon,
    input: &RayCastInput,
    xf: &Transform,
) -> Option<RayCastOutput> {
    let p1 = xf.q.apply_inv(input.p1 - xf.p);
    let p2 = xf.q.apply_inv(input.p2 - xf.p);
    let d = p2 - p1;

    let mut lower = 0.0;
    let mut upper = input.max_fraction;
    let mut index: i32 = -1;

    for i in 0..polygon.count() {
        // p = p1 + a * d; separation: dot(normal, p - v) = 0
        let numerator = polygon.normals[i].dot(polygon.vertices[i] - p1);
        let denominator = polygon.normals[i].dot(d);

        if denominator == 0.0 {
            if numerator < 0.0 {
                return None;
            }
        } else {
            let t = numerator / denominator;
            if denominator < 0.0 && t > lower {
                lower = t;
                index = i as i32;
            } else if denominator > 0.0 && t < upper {
                upper = t;
            }
        }

        if upper < lower {
            return None;
        }
    }

    debug_assert!((0.0..=input.max_fraction).contains(&lower));
    if index >= 0 {
        return Some(RayCastOutput {
            fraction: lower,
            normal: xf.q.apply(polygon.normals[index as usize]),
        });
    }
    None
}

/// Point cloud view of a convex shape child used by GJK, shape casting,
/// and the TOI root finder.
#[derive(Debug, Clone)]
pub struct DistanceProxy {
    pub vertices: Vec<Vec2>,
    pub radius: f32,
}

impl DistanceProxy {
    pub fn new(shape: &Shape, child_index: usize) -> Self {
        match shape {
            Shape::Circle(c) => Self {
                vertices: vec![c.position],
                radius: c.radius,
            },
            Shape::Edge(e) => Self {
                vertices: vec![e.vertex1, e.vertex2],
                radius: POLYGON_RADIUS,
            },
            Shape::Polygon(p) => Self {
                vertices: p.vertices.clone(),
                radius: POLYGON_RADIUS,
            },
            Shape::Chain(chain) => {
                assert!(child_index < chain.child_count());
                Self {
                    vertices: vec![
                        chain.vertices[child_index],
                        chain.vertices[child_index + 1],
                    ],
                    radius: POLYGON_RADIUS,
                }
            }
        }
    }

    pub fn count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertex(&self, index: usize) -> Vec2 {
        self.vertices[index]
    }

    /// Index of the vertex with the largest projection onto `direction`.
    pub fn support(&self, direction: Vec2) -> usize {
        let mut best = 0;
        let mut best_value = self.vertices[0].dot(direction);
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let value = v.dot(direction);
            if value > best_value {
                best = i;
                best_value = value;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_mass_matches_closed_form() {
        let shape = Shape::cuboid(0.5, 0.5);
        let data = shape.compute_mass(1.0);
        assert_relative_eq!(data.mass, 1.0, epsilon = 1e-5);
        assert_relative_eq!(data.center.x, 0.0, epsilon = 1e-6);
        // I = m (w^2 + h^2) / 12 for a box about its center.
        assert_relative_eq!(data.inertia, 1.0 / 6.0, epsilon = 1e-5);
    }

    #[test]
    fn circle_mass_includes_offset_term() {
        let shape = Shape::circle_at(Vec2::new(1.0, 0.0), 0.5);
        let data = shape.compute_mass(2.0);
        let expected_mass = 2.0 * std::f32::consts::PI * 0.25;
        assert_relative_eq!(data.mass, expected_mass, epsilon = 1e-4);
        assert_relative_eq!(
            data.inertia,
            expected_mass * (0.5 * 0.25 + 1.0),
            epsilon = 1e-4
        );
    }

    #[test]
    fn hull_orders_vertices_ccw() {
        let points = [
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            // Interior point must be discarded by the hull.
            Vec2::new(0.0, 0.0),
        ];
        let polygon = Polygon::new(&points);
        assert_eq!(polygon.count(), 4);
        for i in 0..polygon.count() {
            let e = polygon.vertices[(i + 1) % polygon.count()] - polygon.vertices[i];
            let next = polygon.vertices[(i + 2) % polygon.count()]
                - polygon.vertices[(i + 1) % polygon.count()];
            assert!(cross_vv(e, next) > 0.0);
        }
    }

    #[test]
    fn degenerate_hull_falls_back_to_unit_box() {
        let collinear = [Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        let polygon = Polygon::new(&collinear);
        assert_eq!(polygon.count(), 4);
        let aabb = Shape::Polygon(polygon).compute_aabb(&Transform::IDENTITY, 0);
        assert!(aabb.extents().x > 0.9);
    }

    #[test]
    fn chain_children_carry_neighbor_ghosts() {
        let vertices = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.5),
            Vec2::new(3.0, 0.5),
        ];
        let chain = Chain::new(&vertices, Vec2::new(-1.0, 0.0), Vec2::new(4.0, 0.5));

        assert_eq!(chain.child_count(), 3);
        let middle = chain.child_edge(1);
        assert!(middle.one_sided);
        assert_eq!(middle.vertex0, vertices[0]);
        assert_eq!(middle.vertex3, vertices[3]);

        let first = chain.child_edge(0);
        assert_eq!(first.vertex0, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn polygon_ray_cast_hits_front_face() {
        let shape = Shape::cuboid(1.0, 1.0);
        let input = RayCastInput {
            p1: Vec2::new(-3.0, 0.0),
            p2: Vec2::new(3.0, 0.0),
            max_fraction: 1.0,
        };
        let out = shape.ray_cast(&input, &Transform::IDENTITY, 0).unwrap();
        assert_relative_eq!(out.fraction, 1.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(out.normal.x, -1.0, epsilon = 1e-6);
    }
}
