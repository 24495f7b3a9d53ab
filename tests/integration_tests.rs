use glam::Vec2;
use kinetic2d::{
    config::{LINEAR_SLEEP_TOLERANCE, LINEAR_SLOP},
    BodyDef, BodyType, FixtureDef, PhysicsWorld, Shape,
};

const DT: f32 = 1.0 / 60.0;

fn make_world(gravity: Vec2) -> PhysicsWorld {
    PhysicsWorld::builder().gravity(gravity).build()
}

#[test]
fn bodies_fall_under_gravity() {
    let mut world = make_world(Vec2::new(0.0, -10.0));
    let body_id = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, 10.0))
            .build(),
    );
    world.create_fixture(body_id, &FixtureDef::new(Shape::circle(0.5)));

    world.step(DT, 8, 3);

    let position_y = world.body(body_id).expect("body should exist").transform.p.y;
    assert!(position_y < 10.0, "body should start falling, y = {}", position_y);
}

#[test]
fn falling_disk_matches_ballistic_solution() {
    let mut world = make_world(Vec2::new(0.0, -10.0));
    let body_id = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, 10.0))
            .build(),
    );
    world.create_fixture(body_id, &FixtureDef::new(Shape::circle(0.5)).density(1.0));

    for _ in 0..60 {
        world.step(DT, 8, 3);
    }

    let body = world.body(body_id).unwrap();
    // Semi-implicit Euler accumulates one extra gravity kick per step, so
    // allow the discretization error on the position.
    assert!(
        (body.transform.p.y - 5.0).abs() < 0.1,
        "y = {}",
        body.transform.p.y
    );
    assert!(
        (body.linear_velocity.y + 10.0).abs() < 0.2,
        "v = {}",
        body.linear_velocity.y
    );
}

#[test]
fn free_body_integration_is_symplectic_exact() {
    let mut world = make_world(Vec2::ZERO);
    let body_id = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(1.0, 2.0))
            .linear_velocity(Vec2::new(3.0, -2.0))
            .angular_velocity(0.7)
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(body_id, &FixtureDef::new(Shape::circle(0.5)));

    let before = world.body(body_id).unwrap().world_center();
    let angle_before = world.body(body_id).unwrap().sweep.a;

    world.step(DT, 8, 3);

    let body = world.body(body_id).unwrap();
    assert_eq!(body.world_center(), before + DT * Vec2::new(3.0, -2.0));
    assert_eq!(body.sweep.a, angle_before + DT * 0.7);
}

#[test]
fn box_rests_on_ground_and_sleeps() {
    let mut world = make_world(Vec2::new(0.0, -10.0));

    let ground = world.create_body(
        &BodyDef::builder().position(Vec2::new(0.0, -10.0)).build(),
    );
    world.create_fixture(ground, &FixtureDef::new(Shape::cuboid(50.0, 10.0)));

    let box_id = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, 4.0))
            .build(),
    );
    world.create_fixture(box_id, &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(1.0));

    for _ in 0..180 {
        world.step(DT, 8, 3);
    }

    let body = world.body(box_id).unwrap();
    // Ground top is at y = 0; the box rests half a height above it, with
    // the polygon skin keeping a gap of a few slops.
    assert!(
        body.transform.p.y > 0.5 - 2.0 * LINEAR_SLOP && body.transform.p.y < 0.5 + 6.0 * LINEAR_SLOP,
        "resting height {}",
        body.transform.p.y
    );
    assert!(body.linear_velocity.length() < LINEAR_SLEEP_TOLERANCE);
    assert!(!body.is_awake(), "resting body should be asleep");
}

#[test]
fn stack_of_three_boxes_falls_asleep() {
    let mut world = make_world(Vec2::new(0.0, -10.0));

    let ground = world.create_body(
        &BodyDef::builder().position(Vec2::new(0.0, -10.0)).build(),
    );
    world.create_fixture(ground, &FixtureDef::new(Shape::cuboid(50.0, 10.0)));

    let mut boxes = Vec::new();
    for i in 0..3 {
        let body_id = world.create_body(
            &BodyDef::builder()
                .body_type(BodyType::Dynamic)
                .position(Vec2::new(0.0, 0.55 + 1.05 * i as f32))
                .build(),
        );
        world.create_fixture(
            body_id,
            &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(1.0).friction(0.5),
        );
        boxes.push(body_id);
    }

    // Settle plus more than TIME_TO_SLEEP of quiet time.
    for _ in 0..300 {
        world.step(DT, 8, 3);
    }

    for body_id in boxes {
        let body = world.body(body_id).unwrap();
        assert!(!body.is_awake(), "stacked body still awake");
    }
}

#[test]
fn restitution_bounces_with_expected_speed() {
    let mut world = make_world(Vec2::new(0.0, -10.0));

    let ground = world.create_body(
        &BodyDef::builder().position(Vec2::new(0.0, -10.0)).build(),
    );
    world.create_fixture(ground, &FixtureDef::new(Shape::cuboid(50.0, 10.0)));

    let h = 2.0;
    let e = 0.8;
    let ball = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, h + 0.5))
            .build(),
    );
    world.create_fixture(
        ball,
        &FixtureDef::new(Shape::circle(0.5)).density(1.0).restitution(e),
    );

    let mut outgoing: f32 = 0.0;
    for _ in 0..240 {
        world.step(DT, 8, 3);
        let v = world.body(ball).unwrap().linear_velocity.y;
        outgoing = outgoing.max(v);
    }

    let expected = e * (2.0f32 * 10.0 * h).sqrt();
    assert!(
        (outgoing - expected).abs() < 0.1 * expected,
        "outgoing {} expected {}",
        outgoing,
        expected
    );
}

#[test]
fn resting_contact_impulses_persist_across_steps() {
    let mut world = make_world(Vec2::new(0.0, -10.0));

    let ground = world.create_body(
        &BodyDef::builder().position(Vec2::new(0.0, -10.0)).build(),
    );
    world.create_fixture(ground, &FixtureDef::new(Shape::cuboid(50.0, 10.0)));

    let box_id = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, 0.52))
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(box_id, &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(1.0));

    // Settle into steady resting contact.
    for _ in 0..120 {
        world.step(DT, 8, 3);
    }

    let snapshot: Vec<(u32, f32)> = world
        .contact_ids()
        .iter()
        .filter_map(|&id| world.contact(id))
        .flat_map(|contact| {
            let m = contact.manifold();
            (0..m.point_count)
                .map(|i| (m.points[i].id.key(), m.points[i].normal_impulse))
                .collect::<Vec<_>>()
        })
        .collect();
    assert!(!snapshot.is_empty(), "expected a resting contact");

    world.step(DT, 8, 3);

    let after: Vec<(u32, f32)> = world
        .contact_ids()
        .iter()
        .filter_map(|&id| world.contact(id))
        .flat_map(|contact| {
            let m = contact.manifold();
            (0..m.point_count)
                .map(|i| (m.points[i].id.key(), m.points[i].normal_impulse))
                .collect::<Vec<_>>()
        })
        .collect();

    assert_eq!(snapshot.len(), after.len());
    for ((id_before, impulse_before), (id_after, impulse_after)) in
        snapshot.iter().zip(after.iter())
    {
        // Feature ids survive and the steady-state impulse barely moves.
        assert_eq!(id_before, id_after);
        assert!(
            (impulse_before - impulse_after).abs() < 0.05 * impulse_before.abs().max(1e-3),
            "impulse drifted: {} -> {}",
            impulse_before,
            impulse_after
        );
    }
}

#[test]
fn pendulum_conserves_kinetic_energy() {
    let mut world = make_world(Vec2::ZERO);

    let anchor = world.create_body(&BodyDef::default());

    let bob = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, -1.0))
            .angular_velocity(1.0)
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(bob, &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(1.0));

    let def = kinetic2d::RevoluteJointDef::new(
        anchor,
        bob,
        Vec2::ZERO,
        // Pivot expressed in the bob's local frame.
        Vec2::new(0.0, 1.0),
    );
    world.create_joint(&kinetic2d::JointDef::Revolute(def));

    // Spin the bob about the pivot: v = w × r at the center of mass.
    world.body_mut(bob).unwrap().linear_velocity = Vec2::new(1.0, 0.0);

    let kinetic = |world: &PhysicsWorld| {
        let body = world.body(bob).unwrap();
        0.5 * body.mass * body.linear_velocity.length_squared()
            + 0.5 * body.inertia * body.angular_velocity * body.angular_velocity
    };

    let initial = kinetic(&world);
    for _ in 0..600 {
        world.step(DT, 8, 3);
    }
    let final_energy = kinetic(&world);

    assert!(
        (final_energy - initial).abs() / initial < 0.05,
        "energy drifted from {} to {}",
        initial,
        final_energy
    );
}

#[test]
fn forces_are_cleared_after_each_step() {
    let mut world = make_world(Vec2::ZERO);
    let body_id = world.create_body(
        &BodyDef::builder().body_type(BodyType::Dynamic).build(),
    );
    world.create_fixture(body_id, &FixtureDef::new(Shape::circle(0.5)));

    world
        .body_mut(body_id)
        .unwrap()
        .apply_force_to_center(Vec2::new(60.0, 0.0), true);
    world.step(DT, 8, 3);

    let body = world.body(body_id).unwrap();
    assert_eq!(body.force, Vec2::ZERO);
    // F = m·a with unit-ish mass: one step of acceleration.
    assert!(body.linear_velocity.x > 0.0);

    let vx = body.linear_velocity.x;
    world.step(DT, 8, 3);
    // No further acceleration without a fresh force.
    assert!((world.body(body_id).unwrap().linear_velocity.x - vx).abs() < 1e-6);
}
