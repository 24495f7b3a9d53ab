use glam::Vec2;
use kinetic2d::{
    config::LINEAR_SLOP, BodyDef, BodyType, FixtureDef, PhysicsWorld, Shape,
};

const DT: f32 = 1.0 / 60.0;

fn thin_wall_world() -> (PhysicsWorld, kinetic2d::EntityId) {
    let mut world = PhysicsWorld::builder().gravity(Vec2::ZERO).build();

    let wall = world.create_body(&BodyDef::builder().position(Vec2::ZERO).build());
    world.create_fixture(wall, &FixtureDef::new(Shape::cuboid(0.05, 10.0)));

    (world, wall)
}

#[test]
fn bullet_does_not_tunnel_through_thin_wall() {
    let (mut world, _wall) = thin_wall_world();

    let bullet = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(-5.0, 0.0))
            .linear_velocity(Vec2::new(1000.0, 0.0))
            .bullet(true)
            .build(),
    );
    world.create_fixture(bullet, &FixtureDef::new(Shape::circle(0.25)).density(1.0));

    world.step(DT, 8, 3);

    let x = world.body(bullet).unwrap().transform.p.x;
    // One step would carry the bullet ~16 units; TOI must park it at the
    // near face of the wall.
    assert!(
        x <= -(0.05 / 2.0 + LINEAR_SLOP),
        "bullet ended up at x = {x}"
    );
    assert!(x > -5.0, "bullet never moved");
    assert!(x > -1.0, "bullet stopped far from the wall: x = {x}");
}

#[test]
fn fast_body_against_static_wall_is_also_swept() {
    // Continuous collision covers dynamic-vs-static even without the
    // bullet flag.
    let (mut world, _wall) = thin_wall_world();

    let body = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(-5.0, 0.0))
            .linear_velocity(Vec2::new(600.0, 0.0))
            .build(),
    );
    world.create_fixture(body, &FixtureDef::new(Shape::circle(0.25)).density(1.0));

    world.step(DT, 8, 3);

    let x = world.body(body).unwrap().transform.p.x;
    assert!(x < 0.0, "body tunneled to x = {x}");
}

#[test]
fn slow_bodies_do_not_trigger_toi_stops() {
    let (mut world, _wall) = thin_wall_world();

    let body = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(-5.0, 0.0))
            .linear_velocity(Vec2::new(1.0, 0.0))
            .bullet(true)
            .build(),
    );
    world.create_fixture(body, &FixtureDef::new(Shape::circle(0.25)).density(1.0));

    for _ in 0..60 {
        world.step(DT, 8, 3);
    }

    let body_ref = world.body(body).unwrap();
    // One second at 1 m/s; still far from the wall and unhindered.
    assert!(
        (body_ref.transform.p.x + 4.0).abs() < 0.05,
        "free flight disturbed: x = {}",
        body_ref.transform.p.x
    );
    assert!((body_ref.linear_velocity.x - 1.0).abs() < 1e-3);
}

#[test]
fn bullet_hits_are_not_deeper_than_slop() {
    let (mut world, _wall) = thin_wall_world();

    let bullet = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(-5.0, 0.0))
            .linear_velocity(Vec2::new(1000.0, 0.0))
            .bullet(true)
            .build(),
    );
    world.create_fixture(
        bullet,
        &FixtureDef::new(Shape::circle(0.25)).density(1.0).restitution(0.5),
    );

    for _ in 0..10 {
        world.step(DT, 8, 3);

        let x = world.body(bullet).unwrap().transform.p.x;
        // Never intrude past the wall face by more than the slop budget.
        assert!(
            x <= -(0.05 / 2.0 + 0.25) + 5.0 * LINEAR_SLOP,
            "penetrated to x = {x}"
        );
    }
}

#[test]
fn two_bullets_collide_mid_flight() {
    let mut world = PhysicsWorld::builder().gravity(Vec2::ZERO).build();

    let left = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(-10.0, 0.0))
            .linear_velocity(Vec2::new(300.0, 0.0))
            .bullet(true)
            .build(),
    );
    world.create_fixture(left, &FixtureDef::new(Shape::circle(0.25)).density(1.0));

    let right = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(10.0, 0.0))
            .linear_velocity(Vec2::new(-300.0, 0.0))
            .bullet(true)
            .build(),
    );
    world.create_fixture(right, &FixtureDef::new(Shape::circle(0.25)).density(1.0));

    for _ in 0..10 {
        world.step(DT, 8, 3);
    }

    // The head-on pair must interact instead of passing through.
    let left_body = world.body(left).unwrap();
    let right_body = world.body(right).unwrap();
    assert!(
        left_body.transform.p.x < right_body.transform.p.x + 0.5,
        "bullets crossed: {} vs {}",
        left_body.transform.p.x,
        right_body.transform.p.x
    );
    assert!(left_body.linear_velocity.x < 300.0);
}
