use glam::Vec2;
use kinetic2d::{
    config::LINEAR_SLOP, BodyDef, BodyType, DistanceJointDef, FixtureDef, GearJointDef, Joint,
    JointDef, MotorJointDef, MouseJointDef, PhysicsWorld, PrismaticJointDef, PulleyJointDef,
    RevoluteJointDef, Shape, WeldJointDef, WheelJointDef,
};

const DT: f32 = 1.0 / 60.0;

fn make_world() -> PhysicsWorld {
    PhysicsWorld::builder().gravity(Vec2::ZERO).build()
}

fn dynamic_box(world: &mut PhysicsWorld, position: Vec2) -> kinetic2d::EntityId {
    let body = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(position)
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(body, &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(1.0));
    body
}

#[test]
fn revolute_motor_spins_up_against_torque_limit() {
    let mut world = make_world();

    let base = world.create_body(&BodyDef::default());
    let wheel = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .allow_sleep(false)
            .build(),
    );
    // Disk with unit-ish inertia so the spin-up time is predictable.
    world.create_fixture(
        wheel,
        &FixtureDef::new(Shape::circle(1.0)).density(2.0 / std::f32::consts::PI),
    );
    let inertia = world.body(wheel).unwrap().inertia;

    let mut def = RevoluteJointDef::new(base, wheel, Vec2::ZERO, Vec2::ZERO);
    def.enable_motor = true;
    def.motor_speed = 10.0;
    def.max_motor_torque = 5.0;
    world.create_joint(&JointDef::Revolute(def));

    // alpha = tau / I, so the time to reach 5 rad/s is I / tau seconds.
    let alpha = 5.0 / inertia;
    let steps_to_half = (5.0 / alpha / DT).round() as usize;
    for _ in 0..steps_to_half {
        world.step(DT, 8, 3);
    }

    let speed = world.body(wheel).unwrap().angular_velocity;
    println!("speed at half time: {speed}");
    assert!(speed > 4.5 && speed < 5.5, "speed {speed} expected ~5.0");

    // Keep running; the motor must clamp at the target speed.
    for _ in 0..(2 * steps_to_half) {
        world.step(DT, 8, 3);
    }
    let speed = world.body(wheel).unwrap().angular_velocity;
    assert!((speed - 10.0).abs() < 0.2, "speed {speed} should clamp to 10.0");
}

#[test]
fn revolute_limits_stop_the_swing() {
    let mut world = make_world();

    let base = world.create_body(&BodyDef::default());
    let arm = dynamic_box(&mut world, Vec2::ZERO);
    world.body_mut(arm).unwrap().angular_velocity = 4.0;

    let mut def = RevoluteJointDef::new(base, arm, Vec2::ZERO, Vec2::ZERO);
    def.enable_limit = true;
    def.lower_angle = -0.25;
    def.upper_angle = 0.5;
    world.create_joint(&JointDef::Revolute(def));

    for _ in 0..120 {
        world.step(DT, 8, 3);
    }

    let angle = world.body(arm).unwrap().sweep.a;
    assert!(angle <= 0.5 + 0.02, "upper limit violated: {angle}");
    assert!(angle >= 0.4, "arm should rest near the upper limit: {angle}");
}

#[test]
fn prismatic_limit_holds_against_constant_force() {
    let mut world = make_world();

    let ground = world.create_body(&BodyDef::default());
    let slider = dynamic_box(&mut world, Vec2::ZERO);

    let mut def = PrismaticJointDef::new(ground, slider, Vec2::ZERO, Vec2::ZERO, Vec2::X);
    def.enable_limit = true;
    def.lower_translation = -1.0;
    def.upper_translation = 1.0;
    def.enable_motor = true;
    def.motor_speed = 0.0;
    def.max_motor_force = 2.0;
    let joint_id = world.create_joint(&JointDef::Prismatic(def));

    // Push toward +2; the limit must stop the body at +1.
    for _ in 0..240 {
        world
            .body_mut(slider)
            .unwrap()
            .apply_force_to_center(Vec2::new(10.0, 0.0), true);
        world.step(DT, 8, 3);
    }

    let x = world.body(slider).unwrap().transform.p.x;
    assert!(
        (x - 1.0).abs() <= 5.0 * LINEAR_SLOP,
        "slider settled at {x}, expected the +1 limit"
    );

    // The motor resists with no more than its configured force.
    if let Some(Joint::Prismatic(prismatic)) = world.joint(joint_id) {
        let motor_force = prismatic.motor_force(1.0 / DT).abs();
        assert!(
            motor_force <= 2.0 + 1e-3,
            "motor force {motor_force} exceeds the configured maximum"
        );
    } else {
        panic!("expected a prismatic joint");
    }
}

#[test]
fn distance_joint_keeps_bodies_apart() {
    let mut world = make_world();

    let a = dynamic_box(&mut world, Vec2::ZERO);
    let b = dynamic_box(&mut world, Vec2::new(3.0, 0.0));

    let def = DistanceJointDef::new(a, b, Vec2::ZERO, Vec2::ZERO, 3.0);
    world.create_joint(&JointDef::Distance(def));

    // Fling one body; the rod must keep the distance fixed.
    world.body_mut(b).unwrap().linear_velocity = Vec2::new(0.0, 5.0);
    for _ in 0..120 {
        world.step(DT, 8, 3);
    }

    let pa = world.body(a).unwrap().world_center();
    let pb = world.body(b).unwrap().world_center();
    assert!(
        ((pa - pb).length() - 3.0).abs() < 0.05,
        "rod length drifted to {}",
        (pa - pb).length()
    );
}

#[test]
fn pulley_trades_length_at_the_ratio() {
    let mut world = PhysicsWorld::builder()
        .gravity(Vec2::new(0.0, -10.0))
        .build();

    let a = dynamic_box(&mut world, Vec2::new(-2.0, 0.0));
    let b = dynamic_box(&mut world, Vec2::new(2.0, 0.0));
    // Unbalance the pulley so it actually moves.
    world.create_fixture(b, &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(3.0));

    let ground_a = Vec2::new(-2.0, 4.0);
    let ground_b = Vec2::new(2.0, 4.0);
    let ratio = 2.0;
    let def = PulleyJointDef::new(a, b, ground_a, ground_b, Vec2::ZERO, Vec2::ZERO, 4.0, 4.0, ratio);
    world.create_joint(&JointDef::Pulley(def));

    // Half a second: enough to move, short of slamming into the anchors.
    for _ in 0..30 {
        world.step(DT, 8, 3);
    }

    let length_a = (world.body(a).unwrap().world_center() - ground_a).length();
    let length_b = (world.body(b).unwrap().world_center() - ground_b).length();

    // The heavy side dropped, and the constraint held the combination.
    assert!(length_b > 4.01, "heavy side should descend, length_b = {length_b}");
    assert!(
        ((length_a + ratio * length_b) - (4.0 + ratio * 4.0)).abs() < 0.05,
        "pulley constant violated: {} + {ratio}*{}",
        length_a,
        length_b
    );
}

#[test]
fn mouse_joint_drags_body_to_target() {
    let mut world = make_world();

    let ground = world.create_body(&BodyDef::default());
    let body = dynamic_box(&mut world, Vec2::ZERO);

    let (stiffness, damping) =
        kinetic2d::dynamics::joints::linear_stiffness(5.0, 0.7, world.body(body).unwrap().mass, 0.0);
    let def = MouseJointDef {
        body_a: ground,
        body_b: body,
        target: Vec2::new(4.0, 2.0),
        local_anchor_b: Vec2::ZERO,
        max_force: 1000.0,
        stiffness,
        damping,
        collide_connected: false,
    };
    world.create_joint(&JointDef::Mouse(def));

    for _ in 0..300 {
        world.step(DT, 8, 3);
    }

    let p = world.body(body).unwrap().world_center();
    assert!(
        (p - Vec2::new(4.0, 2.0)).length() < 0.05,
        "body settled at {p:?}"
    );
}

#[test]
fn gear_couples_two_revolute_wheels() {
    let mut world = make_world();

    let ground = world.create_body(&BodyDef::default());

    let wheel_a = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(-1.0, 0.0))
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(wheel_a, &FixtureDef::new(Shape::circle(0.5)).density(1.0));

    let wheel_b = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(1.0, 0.0))
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(wheel_b, &FixtureDef::new(Shape::circle(0.5)).density(1.0));

    let rev_a = world.create_joint(&JointDef::Revolute(RevoluteJointDef::new(
        ground,
        wheel_a,
        Vec2::new(-1.0, 0.0),
        Vec2::ZERO,
    )));
    let rev_b = world.create_joint(&JointDef::Revolute(RevoluteJointDef::new(
        ground,
        wheel_b,
        Vec2::new(1.0, 0.0),
        Vec2::ZERO,
    )));

    let ratio = 2.0;
    world.create_joint(&JointDef::Gear(GearJointDef {
        joint1: rev_a,
        joint2: rev_b,
        ratio,
        collide_connected: false,
    }));

    world.body_mut(wheel_a).unwrap().angular_velocity = 4.0;
    for _ in 0..60 {
        world.step(DT, 8, 3);
    }

    let w_a = world.body(wheel_a).unwrap().angular_velocity;
    let w_b = world.body(wheel_b).unwrap().angular_velocity;
    // Gear constraint: w_a + ratio * w_b stays zero.
    assert!(
        (w_a + ratio * w_b).abs() < 0.05,
        "gear velocities w_a={w_a}, w_b={w_b}"
    );
}

#[test]
fn weld_joint_locks_relative_motion() {
    let mut world = make_world();

    let a = dynamic_box(&mut world, Vec2::ZERO);
    let b = dynamic_box(&mut world, Vec2::new(1.0, 0.0));

    let def = WeldJointDef::new(a, b, Vec2::new(0.5, 0.0), Vec2::new(-0.5, 0.0));
    world.create_joint(&JointDef::Weld(def));

    world.body_mut(a).unwrap().linear_velocity = Vec2::new(0.0, 3.0);
    world.body_mut(a).unwrap().angular_velocity = 1.0;

    for _ in 0..120 {
        world.step(DT, 8, 3);
    }

    let body_a = world.body(a).unwrap();
    let body_b = world.body(b).unwrap();
    let offset = body_b.world_center() - body_a.world_center();
    assert!((offset.length() - 1.0).abs() < 0.02, "weld stretched to {}", offset.length());
    assert!(
        (body_a.sweep.a - body_b.sweep.a).abs() < 0.05,
        "weld twisted: {} vs {}",
        body_a.sweep.a,
        body_b.sweep.a
    );
}

#[test]
fn wheel_spring_supports_the_chassis() {
    let mut world = PhysicsWorld::builder()
        .gravity(Vec2::new(0.0, -10.0))
        .build();

    let ground = world.create_body(&BodyDef::default());
    world.create_fixture(ground, &FixtureDef::new(Shape::edge(Vec2::new(-20.0, 0.0), Vec2::new(20.0, 0.0))));

    let wheel = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, 0.5))
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(wheel, &FixtureDef::new(Shape::circle(0.5)).density(1.0).friction(0.9));

    let chassis = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, 1.5))
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(chassis, &FixtureDef::new(Shape::cuboid(1.0, 0.25)).density(1.0));

    let mass = world.body(chassis).unwrap().mass + world.body(wheel).unwrap().mass;
    let (stiffness, damping) = kinetic2d::dynamics::joints::linear_stiffness(4.0, 0.7, mass, 0.0);
    let mut def = WheelJointDef::new(
        chassis,
        wheel,
        Vec2::new(0.0, -1.0),
        Vec2::ZERO,
        Vec2::new(0.0, 1.0),
    );
    def.stiffness = stiffness;
    def.damping = damping;
    world.create_joint(&JointDef::Wheel(def));

    for _ in 0..300 {
        world.step(DT, 8, 3);
    }

    let chassis_y = world.body(chassis).unwrap().transform.p.y;
    // The suspension sags but must keep the chassis well off the ground.
    assert!(chassis_y > 0.9, "chassis sank to {chassis_y}");
    assert!(chassis_y < 1.6, "chassis did not settle: {chassis_y}");
}

#[test]
fn motor_joint_tracks_its_offset() {
    let mut world = make_world();

    let ground = world.create_body(&BodyDef::default());
    let body = dynamic_box(&mut world, Vec2::ZERO);

    let mut def = MotorJointDef::new(ground, body);
    def.linear_offset = Vec2::new(2.0, 1.0);
    def.max_force = 500.0;
    def.max_torque = 500.0;
    world.create_joint(&JointDef::Motor(def));

    for _ in 0..300 {
        world.step(DT, 8, 3);
    }

    let p = world.body(body).unwrap().world_center();
    assert!(
        (p - Vec2::new(2.0, 1.0)).length() < 0.05,
        "motor joint settled at {p:?}"
    );
}

#[test]
fn reaction_force_reports_the_supporting_load() {
    let mut world = PhysicsWorld::builder()
        .gravity(Vec2::new(0.0, -10.0))
        .build();

    let anchor = world.create_body(&BodyDef::default());
    let bob = world.create_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, -2.0))
            .allow_sleep(false)
            .build(),
    );
    world.create_fixture(bob, &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(1.0));
    let mass = world.body(bob).unwrap().mass;

    let def = DistanceJointDef::new(anchor, bob, Vec2::ZERO, Vec2::ZERO, 2.0);
    let joint_id = world.create_joint(&JointDef::Distance(def));

    for _ in 0..120 {
        world.step(DT, 8, 3);
    }

    let force = world.joint(joint_id).unwrap().reaction_force(1.0 / DT);
    // The rod carries the hanging weight.
    assert!(
        (force.y.abs() - mass * 10.0).abs() < 0.5,
        "reaction {force:?} vs weight {}",
        mass * 10.0
    );
}
