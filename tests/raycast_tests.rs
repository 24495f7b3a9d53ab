use glam::Vec2;
use kinetic2d::{BodyDef, BodyType, FixtureDef, PhysicsWorld, RaycastQuery, Shape};

fn make_world() -> PhysicsWorld {
    PhysicsWorld::builder().gravity(Vec2::ZERO).build()
}

#[test]
fn closest_hit_prefers_the_nearer_fixture() {
    let mut world = make_world();

    let near = world.create_body(&BodyDef::builder().position(Vec2::new(2.0, 0.0)).build());
    world.create_fixture(near, &FixtureDef::new(Shape::circle(0.5)));

    let far = world.create_body(&BodyDef::builder().position(Vec2::new(6.0, 0.0)).build());
    world.create_fixture(far, &FixtureDef::new(Shape::circle(0.5)));

    // Register the fresh proxies with the pair manager.
    world.step(0.0, 1, 1);

    let hit = world
        .raycast_closest(&RaycastQuery::new(Vec2::new(-2.0, 0.0), Vec2::X, 20.0))
        .expect("ray should hit the near circle");

    assert_eq!(hit.body_id, near);
    assert!((hit.point.x - 1.5).abs() < 1e-3, "hit at {}", hit.point.x);
    assert!(hit.normal.x < -0.99);
}

#[test]
fn visitor_sees_every_fixture_on_the_segment() {
    let mut world = make_world();

    for i in 0..3 {
        let body = world.create_body(
            &BodyDef::builder()
                .position(Vec2::new(2.0 * i as f32, 0.0))
                .build(),
        );
        world.create_fixture(body, &FixtureDef::new(Shape::cuboid(0.25, 0.25)));
    }
    world.step(0.0, 1, 1);

    let mut hits = 0;
    world.ray_cast(Vec2::new(-2.0, 0.0), Vec2::new(10.0, 0.0), |_, _, _, _| {
        hits += 1;
        // Keep the segment un-clipped to visit everything.
        1.0
    });
    assert_eq!(hits, 3);
}

#[test]
fn visitor_zero_return_stops_the_cast() {
    let mut world = make_world();

    for i in 0..3 {
        let body = world.create_body(
            &BodyDef::builder()
                .position(Vec2::new(2.0 * i as f32, 0.0))
                .build(),
        );
        world.create_fixture(body, &FixtureDef::new(Shape::cuboid(0.25, 0.25)));
    }
    world.step(0.0, 1, 1);

    let mut hits = 0;
    world.ray_cast(Vec2::new(-2.0, 0.0), Vec2::new(10.0, 0.0), |_, _, _, _| {
        hits += 1;
        0.0
    });
    assert_eq!(hits, 1);
}

#[test]
fn sensors_can_be_skipped() {
    let mut world = make_world();

    let sensor = world.create_body(&BodyDef::builder().position(Vec2::new(2.0, 0.0)).build());
    world.create_fixture(sensor, &FixtureDef::new(Shape::circle(0.5)).sensor(true));

    let solid = world.create_body(&BodyDef::builder().position(Vec2::new(5.0, 0.0)).build());
    world.create_fixture(solid, &FixtureDef::new(Shape::circle(0.5)));

    world.step(0.0, 1, 1);

    let query = RaycastQuery {
        origin: Vec2::new(-2.0, 0.0),
        direction: Vec2::X,
        max_distance: 20.0,
        ignore_sensors: true,
    };
    let hit = world.raycast_closest(&query).expect("should hit the solid");
    assert_eq!(hit.body_id, solid);
}

#[test]
fn ray_misses_report_nothing() {
    let mut world = make_world();
    let body = world.create_body(&BodyDef::builder().position(Vec2::new(0.0, 5.0)).build());
    world.create_fixture(body, &FixtureDef::new(Shape::circle(0.5)));
    world.step(0.0, 1, 1);

    assert!(world
        .raycast_closest(&RaycastQuery::new(Vec2::new(-2.0, 0.0), Vec2::X, 10.0))
        .is_none());
}

#[test]
fn query_aabb_reports_overlapping_fixtures() {
    let mut world = make_world();

    let inside = world.create_body(&BodyDef::builder().position(Vec2::ZERO).build());
    let inside_fixture = world.create_fixture(inside, &FixtureDef::new(Shape::circle(0.5)));

    let outside = world.create_body(&BodyDef::builder().position(Vec2::new(50.0, 0.0)).build());
    world.create_fixture(outside, &FixtureDef::new(Shape::circle(0.5)));

    world.step(0.0, 1, 1);

    let mut found = Vec::new();
    world.query_aabb(
        kinetic2d::Aabb::new(Vec2::splat(-2.0), Vec2::splat(2.0)),
        |fixture| {
            found.push(fixture);
            true
        },
    );
    assert_eq!(found, vec![inside_fixture]);

    let body = world.body(world.fixture(found[0]).unwrap().body_id()).unwrap();
    assert_eq!(body.transform.p, Vec2::ZERO);
}

#[test]
fn chain_segments_are_individually_hittable() {
    let mut world = make_world();

    let chain = kinetic2d::Chain::new(
        &[
            Vec2::new(-4.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 2.0),
        ],
        Vec2::new(-8.0, 0.0),
        Vec2::new(8.0, 2.0),
    );
    let body = world.create_body(&BodyDef::builder().body_type(BodyType::Static).build());
    world.create_fixture(body, &FixtureDef::new(Shape::Chain(chain)));
    world.step(0.0, 1, 1);

    // Vertical ray through the first segment.
    let hit = world
        .raycast_closest(&RaycastQuery::new(Vec2::new(-2.0, 3.0), Vec2::new(0.0, -1.0), 10.0))
        .expect("should hit the chain");
    assert!((hit.point.y - 0.0).abs() < 1e-3);
    assert!((hit.point.x + 2.0).abs() < 1e-3);
}
