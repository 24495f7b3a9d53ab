//! Contact manifold generation for every supported shape pair.
//!
//! All generators produce at most [`MAX_MANIFOLD_POINTS`] contact points,
//! each tagged with a [`ContactFeature`] id that survives across steps so
//! impulses can be warm started.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    collision::{
        clipping::{clip_segment_to_line, ClipVertex},
        shapes::{Circle, Edge, Polygon},
    },
    config::{LINEAR_SLOP, MAX_MANIFOLD_POINTS, POLYGON_RADIUS},
    core::types::{cross_vs, cross_vv, Transform},
};

/// Which geometric feature a contact point comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Vertex,
    Face,
}

/// Identifies the pair of shape features a contact point lies on. Matching
/// ids across steps lets impulses persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactFeature {
    pub index_a: u8,
    pub index_b: u8,
    pub type_a: FeatureType,
    pub type_b: FeatureType,
}

impl ContactFeature {
    /// Packs the feature into a stable 32-bit key (little-endian layout).
    pub fn key(&self) -> u32 {
        (self.index_a as u32)
            | ((self.index_b as u32) << 8)
            | ((self.type_a as u32) << 16)
            | ((self.type_b as u32) << 24)
    }

    /// Swaps the roles of shape A and shape B.
    pub fn flipped(&self) -> Self {
        Self {
            index_a: self.index_b,
            index_b: self.index_a,
            type_a: self.type_b,
            type_b: self.type_a,
        }
    }
}

/// One persisted contact point. The meaning of `local_point` depends on
/// the manifold kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifoldPoint {
    pub local_point: Vec2,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    pub id: ContactFeature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifoldKind {
    /// `local_point` is A's center; point 0 carries B's center.
    #[default]
    Circles,
    /// `local_point`/`local_normal` are the face center/normal on A;
    /// clip points are in B's frame.
    FaceA,
    /// Mirror image of `FaceA` with the roles reversed.
    FaceB,
}

/// Compact contact description in shape-local coordinates, independent of
/// body motion so it stays valid across position iterations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Manifold {
    pub points: [ManifoldPoint; MAX_MANIFOLD_POINTS],
    pub local_normal: Vec2,
    pub local_point: Vec2,
    pub kind: ManifoldKind,
    pub point_count: usize,
}

/// World-space view of a manifold, rebuilt each frame from the current
/// transforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldManifold {
    pub normal: Vec2,
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
    pub separations: [f32; MAX_MANIFOLD_POINTS],
}

impl WorldManifold {
    pub fn initialize(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f32,
        xf_b: &Transform,
        radius_b: f32,
    ) -> Self {
        let mut world = WorldManifold::default();
        if manifold.point_count == 0 {
            return world;
        }

        match manifold.kind {
            ManifoldKind::Circles => {
                world.normal = Vec2::X;
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                if (point_a - point_b).length_squared() > f32::EPSILON * f32::EPSILON {
                    world.normal = (point_b - point_a).normalize();
                }

                let c_a = point_a + radius_a * world.normal;
                let c_b = point_b - radius_b * world.normal;
                world.points[0] = 0.5 * (c_a + c_b);
                world.separations[0] = (c_b - c_a).dot(world.normal);
            }
            ManifoldKind::FaceA => {
                world.normal = xf_a.q.apply(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);

                for i in 0..manifold.point_count {
                    let clip_point = xf_b.apply(manifold.points[i].local_point);
                    let c_a = clip_point
                        + (radius_a - (clip_point - plane_point).dot(world.normal)) * world.normal;
                    let c_b = clip_point - radius_b * world.normal;
                    world.points[i] = 0.5 * (c_a + c_b);
                    world.separations[i] = (c_b - c_a).dot(world.normal);
                }
            }
            ManifoldKind::FaceB => {
                world.normal = xf_b.q.apply(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);

                for i in 0..manifold.point_count {
                    let clip_point = xf_a.apply(manifold.points[i].local_point);
                    let c_b = clip_point
                        + (radius_b - (clip_point - plane_point).dot(world.normal)) * world.normal;
                    let c_a = clip_point - radius_a * world.normal;
                    world.points[i] = 0.5 * (c_a + c_b);
                    world.separations[i] = (c_a - c_b).dot(world.normal);
                }

                // Convention: the world normal points from A to B.
                world.normal = -world.normal;
            }
        }

        world
    }
}

/// How a manifold point evolved across a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointState {
    /// Point does not exist on this side.
    #[default]
    Null,
    /// Point was added this step.
    Add,
    /// Point persisted from the previous step (feature id match).
    Persist,
    /// Point was removed this step.
    Remove,
}

/// Classifies each old point as persist/remove and each new point as
/// persist/add by matching feature ids.
pub fn point_states(
    old_manifold: &Manifold,
    new_manifold: &Manifold,
) -> (
    [PointState; MAX_MANIFOLD_POINTS],
    [PointState; MAX_MANIFOLD_POINTS],
) {
    let mut state1 = [PointState::Null; MAX_MANIFOLD_POINTS];
    let mut state2 = [PointState::Null; MAX_MANIFOLD_POINTS];

    for i in 0..old_manifold.point_count {
        let id = old_manifold.points[i].id;
        state1[i] = PointState::Remove;
        for j in 0..new_manifold.point_count {
            if new_manifold.points[j].id == id {
                state1[i] = PointState::Persist;
                break;
            }
        }
    }

    for i in 0..new_manifold.point_count {
        let id = new_manifold.points[i].id;
        state2[i] = PointState::Add;
        for j in 0..old_manifold.point_count {
            if old_manifold.points[j].id == id {
                state2[i] = PointState::Persist;
                break;
            }
        }
    }

    (state1, state2)
}

/// Circle vs circle.
pub fn collide_circles(
    circle_a: &Circle,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    let p_a = xf_a.apply(circle_a.position);
    let p_b = xf_b.apply(circle_b.position);

    let d = p_b - p_a;
    let dist_sqr = d.length_squared();
    let r = circle_a.radius + circle_b.radius;
    if dist_sqr > r * r {
        return manifold;
    }

    manifold.kind = ManifoldKind::Circles;
    manifold.local_point = circle_a.position;
    manifold.local_normal = Vec2::ZERO;
    manifold.point_count = 1;
    manifold.points[0].local_point = circle_b.position;
    manifold.points[0].id = ContactFeature::default();
    manifold
}

/// Polygon vs circle.
pub fn collide_polygon_and_circle(
    polygon_a: &Polygon,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    // Circle center in the polygon's frame.
    let c = xf_a.apply_inv(xf_b.apply(circle_b.position));

    let radius = POLYGON_RADIUS + circle_b.radius;
    let count = polygon_a.count();

    let mut normal_index = 0;
    let mut separation = f32::MIN;
    for i in 0..count {
        let s = polygon_a.normals[i].dot(c - polygon_a.vertices[i]);
        if s > radius {
            return manifold;
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let v1 = polygon_a.vertices[normal_index];
    let v2 = polygon_a.vertices[(normal_index + 1) % count];

    if separation < f32::EPSILON {
        // Center inside the polygon: use the deepest face normal.
        manifold.point_count = 1;
        manifold.kind = ManifoldKind::FaceA;
        manifold.local_normal = polygon_a.normals[normal_index];
        manifold.local_point = 0.5 * (v1 + v2);
        manifold.points[0].local_point = circle_b.position;
        manifold.points[0].id = ContactFeature::default();
        return manifold;
    }

    // Voronoi region of the face: vertex, vertex, or edge interior.
    let u1 = (c - v1).dot(v2 - v1);
    let u2 = (c - v2).dot(v1 - v2);
    if u1 <= 0.0 {
        if (c - v1).length_squared() > radius * radius {
            return manifold;
        }
        manifold.point_count = 1;
        manifold.kind = ManifoldKind::FaceA;
        manifold.local_normal = (c - v1).normalize();
        manifold.local_point = v1;
    } else if u2 <= 0.0 {
        if (c - v2).length_squared() > radius * radius {
            return manifold;
        }
        manifold.point_count = 1;
        manifold.kind = ManifoldKind::FaceA;
        manifold.local_normal = (c - v2).normalize();
        manifold.local_point = v2;
    } else {
        let face_center = 0.5 * (v1 + v2);
        let s = (c - face_center).dot(polygon_a.normals[normal_index]);
        if s > radius {
            return manifold;
        }
        manifold.point_count = 1;
        manifold.kind = ManifoldKind::FaceA;
        manifold.local_normal = polygon_a.normals[normal_index];
        manifold.local_point = face_center;
    }

    manifold.points[0].local_point = circle_b.position;
    manifold.points[0].id = ContactFeature::default();
    manifold
}

/// Largest minimum separation of poly2's vertices from poly1's edges; the
/// SAT query of the polygon pair.
fn find_max_separation(
    poly1: &Polygon,
    xf1: &Transform,
    poly2: &Polygon,
    xf2: &Transform,
) -> (f32, usize) {
    // Work in poly2's frame.
    let xf = xf2.mul_t(*xf1);

    let mut best_index = 0;
    let mut max_separation = f32::MIN;
    for i in 0..poly1.count() {
        let n = xf.q.apply(poly1.normals[i]);
        let v1 = xf.apply(poly1.vertices[i]);

        let mut si = f32::MAX;
        for v2 in &poly2.vertices {
            let sij = n.dot(*v2 - v1);
            if sij < si {
                si = sij;
            }
        }

        if si > max_separation {
            max_separation = si;
            best_index = i;
        }
    }

    (max_separation, best_index)
}

/// Edge on poly2 whose normal most opposes the reference edge's normal.
fn find_incident_edge(
    poly1: &Polygon,
    xf1: &Transform,
    edge1: usize,
    poly2: &Polygon,
    xf2: &Transform,
) -> [ClipVertex; 2] {
    debug_assert!(edge1 < poly1.count());

    // Reference normal in poly2's frame.
    let normal1 = xf2.q.apply_inv(xf1.q.apply(poly1.normals[edge1]));

    let mut index = 0;
    let mut min_dot = f32::MAX;
    for (i, n) in poly2.normals.iter().enumerate() {
        let dot = normal1.dot(*n);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = (i1 + 1) % poly2.count();

    [
        ClipVertex {
            v: xf2.apply(poly2.vertices[i1]),
            id: ContactFeature {
                index_a: edge1 as u8,
                index_b: i1 as u8,
                type_a: FeatureType::Face,
                type_b: FeatureType::Vertex,
            },
        },
        ClipVertex {
            v: xf2.apply(poly2.vertices[i2]),
            id: ContactFeature {
                index_a: edge1 as u8,
                index_b: i2 as u8,
                type_a: FeatureType::Face,
                type_b: FeatureType::Vertex,
            },
        },
    ]
}

/// Polygon vs polygon: SAT reference/incident selection plus clipping.
pub fn collide_polygons(
    poly_a: &Polygon,
    xf_a: &Transform,
    poly_b: &Polygon,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();
    let total_radius = 2.0 * POLYGON_RADIUS;

    let (separation_a, edge_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    if separation_a > total_radius {
        return manifold;
    }

    let (separation_b, edge_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);
    if separation_b > total_radius {
        return manifold;
    }

    // Prefer the deeper reference face, with a small tolerance so the
    // choice does not flicker between frames.
    let (poly1, poly2, xf1, xf2, edge1, flip);
    if separation_b > separation_a + 0.1 * LINEAR_SLOP {
        poly1 = poly_b;
        poly2 = poly_a;
        xf1 = xf_b;
        xf2 = xf_a;
        edge1 = edge_b;
        manifold.kind = ManifoldKind::FaceB;
        flip = true;
    } else {
        poly1 = poly_a;
        poly2 = poly_b;
        xf1 = xf_a;
        xf2 = xf_b;
        edge1 = edge_a;
        manifold.kind = ManifoldKind::FaceA;
        flip = false;
    }

    let incident_edge = find_incident_edge(poly1, xf1, edge1, poly2, xf2);

    let iv1 = edge1;
    let iv2 = (edge1 + 1) % poly1.count();

    let mut v11 = poly1.vertices[iv1];
    let mut v12 = poly1.vertices[iv2];

    let local_tangent = (v12 - v11).normalize();
    let local_normal = cross_vs(local_tangent, 1.0);
    let plane_point = 0.5 * (v11 + v12);

    let tangent = xf1.q.apply(local_tangent);
    let normal = cross_vs(tangent, 1.0);

    v11 = xf1.apply(v11);
    v12 = xf1.apply(v12);

    let front_offset = normal.dot(v11);
    let side_offset1 = -tangent.dot(v11) + total_radius;
    let side_offset2 = tangent.dot(v12) + total_radius;

    // Clip the incident edge to the reference edge's side planes.
    let (clip_points1, np) = clip_segment_to_line(incident_edge, -tangent, side_offset1, iv1);
    if np < 2 {
        return manifold;
    }
    let (clip_points2, np) = clip_segment_to_line(clip_points1, tangent, side_offset2, iv2);
    if np < 2 {
        return manifold;
    }

    manifold.local_normal = local_normal;
    manifold.local_point = plane_point;

    let mut point_count = 0;
    for clip in clip_points2.iter().take(MAX_MANIFOLD_POINTS) {
        let separation = normal.dot(clip.v) - front_offset;
        if separation <= total_radius {
            let cp = &mut manifold.points[point_count];
            cp.local_point = xf2.apply_inv(clip.v);
            cp.id = if flip { clip.id.flipped() } else { clip.id };
            point_count += 1;
        }
    }

    manifold.point_count = point_count;
    manifold
}

/// Edge vs circle, honoring ghost vertices on one-sided edges so chain
/// interiors never produce spurious vertex contacts.
pub fn collide_edge_and_circle(
    edge_a: &Edge,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    // Circle center in the edge's frame.
    let q = xf_a.apply_inv(xf_b.apply(circle_b.position));

    let a = edge_a.vertex1;
    let b = edge_a.vertex2;
    let e = b - a;

    // The outward side of a CCW chain is to the right of the edge.
    let mut n = Vec2::new(e.y, -e.x);
    let offset = n.dot(q - a);

    if edge_a.one_sided && offset < 0.0 {
        return manifold;
    }

    // Barycentric coordinates.
    let u = e.dot(b - q);
    let v = e.dot(q - a);

    let radius = POLYGON_RADIUS + circle_b.radius;

    if v <= 0.0 {
        // Region A.
        let p = a;
        if (q - p).length_squared() > radius * radius {
            return manifold;
        }

        // The previous chain segment owns this vertex region.
        if edge_a.one_sided {
            let a1 = edge_a.vertex0;
            let b1 = a;
            let e1 = b1 - a1;
            let u1 = e1.dot(b1 - q);
            if u1 > 0.0 {
                return manifold;
            }
        }

        manifold.kind = ManifoldKind::Circles;
        manifold.point_count = 1;
        manifold.local_normal = Vec2::ZERO;
        manifold.local_point = p;
        manifold.points[0].local_point = circle_b.position;
        manifold.points[0].id = ContactFeature::default();
        return manifold;
    }

    if u <= 0.0 {
        // Region B.
        let p = b;
        if (q - p).length_squared() > radius * radius {
            return manifold;
        }

        // The next chain segment owns this vertex region.
        if edge_a.one_sided {
            let b2 = edge_a.vertex3;
            let a2 = b;
            let e2 = b2 - a2;
            let v2 = e2.dot(q - a2);
            if v2 > 0.0 {
                return manifold;
            }
        }

        manifold.kind = ManifoldKind::Circles;
        manifold.point_count = 1;
        manifold.local_normal = Vec2::ZERO;
        manifold.local_point = p;
        manifold.points[0].local_point = circle_b.position;
        manifold.points[0].id = ContactFeature {
            index_a: 1,
            ..ContactFeature::default()
        };
        return manifold;
    }

    // Region AB.
    let den = e.length_squared();
    debug_assert!(den > 0.0);
    let p = (1.0 / den) * (u * a + v * b);
    if (q - p).length_squared() > radius * radius {
        return manifold;
    }

    if offset < 0.0 {
        n = -n;
    }
    n = n.normalize();

    manifold.kind = ManifoldKind::FaceA;
    manifold.point_count = 1;
    manifold.local_normal = n;
    manifold.local_point = a;
    manifold.points[0].local_point = circle_b.position;
    manifold.points[0].id = ContactFeature {
        type_a: FeatureType::Face,
        ..ContactFeature::default()
    };
    manifold
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpAxisKind {
    EdgeA,
    EdgeB,
}

#[derive(Debug, Clone, Copy)]
struct EpAxis {
    kind: EpAxisKind,
    index: usize,
    separation: f32,
    normal: Vec2,
}

struct TempPolygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
}

fn compute_edge_separation(polygon_b: &TempPolygon, v1: Vec2, normal1: Vec2) -> EpAxis {
    let mut axis = EpAxis {
        kind: EpAxisKind::EdgeA,
        index: 0,
        separation: f32::MIN,
        normal: Vec2::ZERO,
    };

    let axes = [normal1, -normal1];
    for (j, axis_j) in axes.iter().enumerate() {
        let mut sj = f32::MAX;
        for v in &polygon_b.vertices {
            let si = axis_j.dot(*v - v1);
            if si < sj {
                sj = si;
            }
        }
        if sj > axis.separation {
            axis.index = j;
            axis.separation = sj;
            axis.normal = *axis_j;
        }
    }
    axis
}

fn compute_polygon_separation(polygon_b: &TempPolygon, v1: Vec2, v2: Vec2) -> EpAxis {
    let mut axis = EpAxis {
        kind: EpAxisKind::EdgeB,
        index: 0,
        separation: f32::MIN,
        normal: Vec2::ZERO,
    };

    for i in 0..polygon_b.vertices.len() {
        let n = -polygon_b.normals[i];
        let s1 = n.dot(polygon_b.vertices[i] - v1);
        let s2 = n.dot(polygon_b.vertices[i] - v2);
        let s = s1.min(s2);

        if s > axis.separation {
            axis.kind = EpAxisKind::EdgeB;
            axis.index = i;
            axis.separation = s;
            axis.normal = n;
        }
    }
    axis
}

/// Edge vs polygon with Gauss-map filtering of ghost regions on one-sided
/// edges (see chains).
pub fn collide_edge_and_polygon(
    edge_a: &Edge,
    xf_a: &Transform,
    polygon_b: &Polygon,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    // Work entirely in the edge's frame.
    let xf = xf_a.mul_t(*xf_b);
    let centroid_b = xf.apply(polygon_b.centroid);

    let v1 = edge_a.vertex1;
    let v2 = edge_a.vertex2;

    let edge1 = (v2 - v1).normalize();

    // Normal points to the right for CCW winding.
    let normal1 = Vec2::new(edge1.y, -edge1.x);
    let offset1 = normal1.dot(centroid_b - v1);

    let one_sided = edge_a.one_sided;
    if one_sided && offset1 < 0.0 {
        return manifold;
    }

    let temp_b = TempPolygon {
        vertices: polygon_b.vertices.iter().map(|v| xf.apply(*v)).collect(),
        normals: polygon_b.normals.iter().map(|n| xf.q.apply(*n)).collect(),
    };

    let radius = 2.0 * POLYGON_RADIUS;

    let edge_axis = compute_edge_separation(&temp_b, v1, normal1);
    if edge_axis.separation > radius {
        return manifold;
    }

    let polygon_axis = compute_polygon_separation(&temp_b, v1, v2);
    if polygon_axis.separation > radius {
        return manifold;
    }

    // Hysteresis for jitter reduction.
    const RELATIVE_TOL: f32 = 0.98;
    const ABSOLUTE_TOL: f32 = 0.001;

    let mut primary_axis =
        if polygon_axis.separation - radius > RELATIVE_TOL * (edge_axis.separation - radius) + ABSOLUTE_TOL {
            polygon_axis
        } else {
            edge_axis
        };

    if one_sided {
        // Gauss-map check against the neighboring segments so contacts
        // never push toward the chain interior.
        let edge0 = (v1 - edge_a.vertex0).normalize();
        let normal0 = Vec2::new(edge0.y, -edge0.x);
        let convex1 = cross_vv(edge0, edge1) >= 0.0;

        let edge2 = (edge_a.vertex3 - v2).normalize();
        let normal2 = Vec2::new(edge2.y, -edge2.x);
        let convex2 = cross_vv(edge1, edge2) >= 0.0;

        const SIN_TOL: f32 = 0.1;
        let side1 = primary_axis.normal.dot(edge1) <= 0.0;

        if side1 {
            if convex1 {
                if cross_vv(primary_axis.normal, normal0) > SIN_TOL {
                    // Skip region owned by the previous segment.
                    return manifold;
                }
            } else {
                // Concave corner: snap to the edge normal.
                primary_axis = edge_axis;
            }
        } else if convex2 {
            if cross_vv(normal2, primary_axis.normal) > SIN_TOL {
                return manifold;
            }
        } else {
            primary_axis = edge_axis;
        }
    }

    struct ReferenceFace {
        i1: usize,
        i2: usize,
        v1: Vec2,
        v2: Vec2,
        normal: Vec2,
        side_normal1: Vec2,
        side_offset1: f32,
        side_normal2: Vec2,
        side_offset2: f32,
    }

    let mut clip_points = [ClipVertex::default(); 2];
    let reference;

    if primary_axis.kind == EpAxisKind::EdgeA {
        manifold.kind = ManifoldKind::FaceA;

        // Incident face: the polygon normal most anti-parallel to the axis.
        let mut best_index = 0;
        let mut best_value = primary_axis.normal.dot(temp_b.normals[0]);
        for (i, n) in temp_b.normals.iter().enumerate().skip(1) {
            let value = primary_axis.normal.dot(*n);
            if value < best_value {
                best_value = value;
                best_index = i;
            }
        }

        let i1 = best_index;
        let i2 = (i1 + 1) % temp_b.vertices.len();

        clip_points[0] = ClipVertex {
            v: temp_b.vertices[i1],
            id: ContactFeature {
                index_a: 0,
                index_b: i1 as u8,
                type_a: FeatureType::Face,
                type_b: FeatureType::Vertex,
            },
        };
        clip_points[1] = ClipVertex {
            v: temp_b.vertices[i2],
            id: ContactFeature {
                index_a: 0,
                index_b: i2 as u8,
                type_a: FeatureType::Face,
                type_b: FeatureType::Vertex,
            },
        };

        reference = if offset1 >= 0.0 {
            ReferenceFace {
                i1: 0,
                i2: 1,
                v1,
                v2,
                normal: primary_axis.normal,
                side_normal1: -edge1,
                side_offset1: (-edge1).dot(v1),
                side_normal2: edge1,
                side_offset2: edge1.dot(v2),
            }
        } else {
            ReferenceFace {
                i1: 1,
                i2: 0,
                v1: v2,
                v2: v1,
                normal: -primary_axis.normal,
                side_normal1: edge1,
                side_offset1: edge1.dot(v2),
                side_normal2: -edge1,
                side_offset2: (-edge1).dot(v1),
            }
        };
    } else {
        manifold.kind = ManifoldKind::FaceB;

        clip_points[0] = ClipVertex {
            v: v2,
            id: ContactFeature {
                index_a: 1,
                index_b: primary_axis.index as u8,
                type_a: FeatureType::Vertex,
                type_b: FeatureType::Face,
            },
        };
        clip_points[1] = ClipVertex {
            v: v1,
            id: ContactFeature {
                index_a: 0,
                index_b: primary_axis.index as u8,
                type_a: FeatureType::Vertex,
                type_b: FeatureType::Face,
            },
        };

        let i1 = primary_axis.index;
        let i2 = (i1 + 1) % temp_b.vertices.len();
        let normal = temp_b.normals[i1];
        let side_normal1 = Vec2::new(normal.y, -normal.x);
        reference = ReferenceFace {
            i1,
            i2,
            v1: temp_b.vertices[i1],
            v2: temp_b.vertices[i2],
            normal,
            side_normal1,
            side_offset1: side_normal1.dot(temp_b.vertices[i1]),
            side_normal2: -side_normal1,
            side_offset2: (-side_normal1).dot(temp_b.vertices[i2]),
        };
    }

    let (clip_points1, np) = clip_segment_to_line(
        clip_points,
        reference.side_normal1,
        reference.side_offset1,
        reference.i1,
    );
    if np < MAX_MANIFOLD_POINTS {
        return manifold;
    }

    let (clip_points2, np) = clip_segment_to_line(
        clip_points1,
        reference.side_normal2,
        reference.side_offset2,
        reference.i2,
    );
    if np < MAX_MANIFOLD_POINTS {
        return manifold;
    }

    if primary_axis.kind == EpAxisKind::EdgeA {
        manifold.local_normal = reference.normal;
        manifold.local_point = reference.v1;
    } else {
        manifold.local_normal = polygon_b.normals[reference.i1];
        manifold.local_point = polygon_b.vertices[reference.i1];
    }

    let mut point_count = 0;
    for clip in clip_points2.iter().take(MAX_MANIFOLD_POINTS) {
        let separation = reference.normal.dot(clip.v - reference.v1);
        if separation <= radius {
            let cp = &mut manifold.points[point_count];
            if primary_axis.kind == EpAxisKind::EdgeA {
                cp.local_point = xf.apply_inv(clip.v);
                cp.id = clip.id;
            } else {
                cp.local_point = clip.v;
                cp.id = clip.id.flipped();
            }
            point_count += 1;
        }
    }

    manifold.point_count = point_count;
    manifold
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn touching_circles_produce_single_point() {
        let a = Circle::new(0.5);
        let b = Circle::new(0.5);
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(0.9, 0.0), 0.0);

        let manifold = collide_circles(&a, &xf_a, &b, &xf_b);
        assert_eq!(manifold.point_count, 1);
        assert_eq!(manifold.kind, ManifoldKind::Circles);

        let world = WorldManifold::initialize(&manifold, &xf_a, 0.5, &xf_b, 0.5);
        assert_relative_eq!(world.normal.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(world.separations[0], -0.1, epsilon = 1e-6);
    }

    #[test]
    fn distant_circles_produce_nothing() {
        let a = Circle::new(0.5);
        let b = Circle::new(0.5);
        let manifold = collide_circles(
            &a,
            &Transform::IDENTITY,
            &b,
            &Transform::new(Vec2::new(3.0, 0.0), 0.0),
        );
        assert_eq!(manifold.point_count, 0);
    }

    #[test]
    fn stacked_boxes_produce_two_point_face_manifold() {
        let a = Polygon::new_box(0.5, 0.5);
        let b = Polygon::new_box(0.5, 0.5);
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(0.0, 0.99), 0.0);

        let manifold = collide_polygons(&a, &xf_a, &b, &xf_b);
        assert_eq!(manifold.point_count, 2);

        let world =
            WorldManifold::initialize(&manifold, &xf_a, POLYGON_RADIUS, &xf_b, POLYGON_RADIUS);
        assert_relative_eq!(world.normal.y.abs(), 1.0, epsilon = 1e-5);
        for i in 0..2 {
            assert!(world.separations[i] < 0.0);
        }
    }

    #[test]
    fn manifold_points_keep_ids_across_small_motion() {
        let a = Polygon::new_box(0.5, 0.5);
        let b = Polygon::new_box(0.5, 0.5);
        let xf_a = Transform::IDENTITY;

        let m1 = collide_polygons(&a, &xf_a, &b, &Transform::new(Vec2::new(0.0, 0.99), 0.0));
        let m2 = collide_polygons(&a, &xf_a, &b, &Transform::new(Vec2::new(0.001, 0.989), 0.0));

        let (old_states, new_states) = point_states(&m1, &m2);
        for i in 0..m1.point_count {
            assert_eq!(old_states[i], PointState::Persist);
        }
        for i in 0..m2.point_count {
            assert_eq!(new_states[i], PointState::Persist);
        }
    }

    #[test]
    fn polygon_circle_vertex_region() {
        let a = Polygon::new_box(0.5, 0.5);
        let b = Circle::new(0.2);
        // Circle near the top-right corner, outside both faces.
        let xf_b = Transform::new(Vec2::new(0.6, 0.6), 0.0);
        let manifold = collide_polygon_and_circle(&a, &Transform::IDENTITY, &b, &xf_b);
        assert_eq!(manifold.point_count, 1);
        let n = manifold.local_normal;
        assert_relative_eq!(n.x, n.y, epsilon = 1e-5);
    }

    #[test]
    fn one_sided_edge_ignores_back_side_circle() {
        let edge = Edge::one_sided(
            Vec2::new(-2.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
        );
        let circle = Circle::new(0.3);

        let behind = Transform::new(Vec2::new(0.0, -0.2), 0.0);
        let manifold =
            collide_edge_and_circle(&edge, &Transform::IDENTITY, &circle, &behind);
        assert_eq!(manifold.point_count, 0);

        let front = Transform::new(Vec2::new(0.0, 0.2), 0.0);
        let manifold = collide_edge_and_circle(&edge, &Transform::IDENTITY, &circle, &front);
        assert_eq!(manifold.point_count, 1);
    }

    #[test]
    fn edge_polygon_resting_contact() {
        let edge = Edge::two_sided(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0));
        let polygon = Polygon::new_box(0.5, 0.5);
        let xf_b = Transform::new(Vec2::new(0.0, 0.49), 0.0);

        let manifold =
            collide_edge_and_polygon(&edge, &Transform::IDENTITY, &polygon, &xf_b);
        assert_eq!(manifold.point_count, 2);
        assert_eq!(manifold.kind, ManifoldKind::FaceA);

        let world =
            WorldManifold::initialize(&manifold, &Transform::IDENTITY, POLYGON_RADIUS, &xf_b, POLYGON_RADIUS);
        assert_relative_eq!(world.normal.y, 1.0, epsilon = 1e-5);
    }
}
