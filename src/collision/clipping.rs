use glam::Vec2;

use crate::collision::narrowphase::{ContactFeature, FeatureType};

/// Vertex carried through the incident-edge clipping passes, tagged with
/// the contact feature it originated from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipVertex {
    pub v: Vec2,
    pub id: ContactFeature,
}

/// Clips the two-vertex segment `v_in` against the half plane
/// `dot(normal, p) − offset <= 0` (Sutherland–Hodgman, segment form).
/// An inserted intersection vertex records `vertex_index_a` as the clip
/// plane's feature. Postcondition: the returned count is at most 2.
pub fn clip_segment_to_line(
    v_in: [ClipVertex; 2],
    normal: Vec2,
    offset: f32,
    vertex_index_a: usize,
) -> ([ClipVertex; 2], usize) {
    let mut v_out = [ClipVertex::default(); 2];
    let mut count = 0;

    let distance0 = normal.dot(v_in[0].v) - offset;
    let distance1 = normal.dot(v_in[1].v) - offset;

    if distance0 <= 0.0 {
        v_out[count] = v_in[0];
        count += 1;
    }
    if distance1 <= 0.0 {
        v_out[count] = v_in[1];
        count += 1;
    }

    if distance0 * distance1 < 0.0 {
        let interp = distance0 / (distance0 - distance1);
        v_out[count].v = v_in[0].v + interp * (v_in[1].v - v_in[0].v);
        v_out[count].id = ContactFeature {
            index_a: vertex_index_a as u8,
            index_b: v_in[0].id.index_b,
            type_a: FeatureType::Vertex,
            type_b: FeatureType::Face,
        };
        count += 1;
    }

    (v_out, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_fully_inside_is_kept() {
        let v_in = [
            ClipVertex {
                v: Vec2::new(-1.0, 0.0),
                id: ContactFeature::default(),
            },
            ClipVertex {
                v: Vec2::new(1.0, 0.0),
                id: ContactFeature::default(),
            },
        ];
        let (_, count) = clip_segment_to_line(v_in, Vec2::X, 2.0, 0);
        assert_eq!(count, 2);
    }

    #[test]
    fn crossing_segment_inserts_intersection_with_feature() {
        let v_in = [
            ClipVertex {
                v: Vec2::new(-1.0, 0.0),
                id: ContactFeature::default(),
            },
            ClipVertex {
                v: Vec2::new(3.0, 0.0),
                id: ContactFeature::default(),
            },
        ];
        let (out, count) = clip_segment_to_line(v_in, Vec2::X, 1.0, 7);
        assert_eq!(count, 2);
        assert_eq!(out[1].v, Vec2::new(1.0, 0.0));
        assert_eq!(out[1].id.index_a, 7);
        assert_eq!(out[1].id.type_a, FeatureType::Vertex);
        assert_eq!(out[1].id.type_b, FeatureType::Face);
    }

    #[test]
    fn segment_fully_outside_is_dropped() {
        let v_in = [
            ClipVertex {
                v: Vec2::new(2.0, 0.0),
                id: ContactFeature::default(),
            },
            ClipVertex {
                v: Vec2::new(3.0, 0.0),
                id: ContactFeature::default(),
            },
        ];
        let (_, count) = clip_segment_to_line(v_in, Vec2::X, 1.0, 0);
        assert_eq!(count, 0);
    }
}
