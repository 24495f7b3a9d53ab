use glam::Vec2;
use kinetic2d::{
    collision::{
        distance::{distance, test_overlap, DistanceInput, SimplexCache},
        narrowphase::{collide_polygons, point_states, PointState},
        shapes::{DistanceProxy, Polygon},
    },
    Shape, Transform,
};

struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f32) / (u32::MAX >> 1) as f32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}

fn random_convex(rng: &mut Lcg) -> Shape {
    let mut points = Vec::new();
    for _ in 0..8 {
        points.push(Vec2::new(rng.range(-1.0, 1.0), rng.range(-1.0, 1.0)));
    }
    Shape::polygon(&points)
}

#[test]
fn gjk_terminates_on_random_convex_pairs() {
    let mut rng = Lcg(777);

    for _ in 0..200 {
        let shape_a = random_convex(&mut rng);
        let shape_b = random_convex(&mut rng);
        let xf_a = Transform::new(
            Vec2::new(rng.range(-3.0, 3.0), rng.range(-3.0, 3.0)),
            rng.range(-3.0, 3.0),
        );
        let xf_b = Transform::new(
            Vec2::new(rng.range(-3.0, 3.0), rng.range(-3.0, 3.0)),
            rng.range(-3.0, 3.0),
        );

        let input = DistanceInput {
            proxy_a: DistanceProxy::new(&shape_a, 0),
            proxy_b: DistanceProxy::new(&shape_b, 0),
            transform_a: xf_a,
            transform_b: xf_b,
            use_radii: false,
        };
        let mut cache = SimplexCache::default();
        let output = distance(&input, &mut cache);

        assert!(output.iterations <= 20, "GJK ran {} iterations", output.iterations);
        assert!(output.distance >= 0.0);
        assert!(output.distance.is_finite());

        // Witness points must realize the reported distance.
        let witness_distance = (output.point_a - output.point_b).length();
        assert!((witness_distance - output.distance).abs() < 1e-4);
    }
}

#[test]
fn overlapping_unit_squares_report_contact() {
    // Two unit squares offset by half a side must overlap, with the
    // witness midpoint inside both.
    let square = Shape::cuboid(0.5, 0.5);
    let xf_a = Transform::IDENTITY;
    let xf_b = Transform::new(Vec2::new(0.5, 0.5), 0.0);

    assert!(test_overlap(&square, 0, &square, 0, &xf_a, &xf_b));

    let input = DistanceInput {
        proxy_a: DistanceProxy::new(&square, 0),
        proxy_b: DistanceProxy::new(&square, 0),
        transform_a: xf_a,
        transform_b: xf_b,
        use_radii: true,
    };
    let mut cache = SimplexCache::default();
    let output = distance(&input, &mut cache);

    assert_eq!(output.distance, 0.0);
    let midpoint = 0.5 * (output.point_a + output.point_b);
    assert!(square.test_point(&xf_a, midpoint));
    assert!(square.test_point(&xf_b, midpoint));
}

#[test]
fn gjk_distance_between_separated_circles() {
    let a = Shape::circle(0.5);
    let b = Shape::circle(0.25);
    let xf_a = Transform::IDENTITY;
    let xf_b = Transform::new(Vec2::new(3.0, 4.0), 0.0);

    let input = DistanceInput {
        proxy_a: DistanceProxy::new(&a, 0),
        proxy_b: DistanceProxy::new(&b, 0),
        transform_a: xf_a,
        transform_b: xf_b,
        use_radii: true,
    };
    let mut cache = SimplexCache::default();
    let output = distance(&input, &mut cache);

    // Center distance 5 minus both radii.
    assert!((output.distance - 4.25).abs() < 1e-4);
}

#[test]
fn sliding_box_keeps_manifold_ids() {
    let a = Polygon::new_box(2.0, 0.5);
    let b = Polygon::new_box(0.5, 0.5);
    let xf_a = Transform::IDENTITY;

    let mut previous = collide_polygons(
        &a,
        &xf_a,
        &b,
        &Transform::new(Vec2::new(-0.5, 0.99), 0.0),
    );
    assert_eq!(previous.point_count, 2);

    // Slide along the face; ids should persist frame over frame.
    for i in 1..10 {
        let x = -0.5 + 0.05 * i as f32;
        let current = collide_polygons(&a, &xf_a, &b, &Transform::new(Vec2::new(x, 0.99), 0.0));
        assert_eq!(current.point_count, 2);

        let (old_states, new_states) = point_states(&previous, &current);
        for state in old_states.iter().take(previous.point_count) {
            assert_eq!(*state, PointState::Persist);
        }
        for state in new_states.iter().take(current.point_count) {
            assert_eq!(*state, PointState::Persist);
        }
        previous = current;
    }
}

#[test]
fn separating_boxes_remove_points() {
    let a = Polygon::new_box(0.5, 0.5);
    let b = Polygon::new_box(0.5, 0.5);
    let xf_a = Transform::IDENTITY;

    let touching = collide_polygons(&a, &xf_a, &b, &Transform::new(Vec2::new(0.0, 0.99), 0.0));
    assert_eq!(touching.point_count, 2);

    let separated = collide_polygons(&a, &xf_a, &b, &Transform::new(Vec2::new(0.0, 3.0), 0.0));
    assert_eq!(separated.point_count, 0);

    let (old_states, _) = point_states(&touching, &separated);
    for state in old_states.iter().take(touching.point_count) {
        assert_eq!(*state, PointState::Remove);
    }
}

#[test]
fn rotated_boxes_collide_symmetrically() {
    let a = Polygon::new_box(0.5, 0.5);
    let b = Polygon::new_box(0.5, 0.5);

    // 45-degree box resting corner-down on a flat box.
    let manifold = collide_polygons(
        &a,
        &Transform::IDENTITY,
        &b,
        &Transform::new(Vec2::new(0.0, 1.2), std::f32::consts::FRAC_PI_4),
    );
    assert!(manifold.point_count >= 1);
}
