use glam::Vec2;
use kinetic2d::*;

fn main() {
    let mut world = PhysicsWorld::builder()
        .gravity(Vec2::new(0.0, -10.0))
        .build();

    let ground = world.create_body(&BodyDef::builder().position(Vec2::new(0.0, -10.0)).build());
    world.create_fixture(ground, &FixtureDef::new(Shape::cuboid(50.0, 10.0)));

    let mut boxes = Vec::new();
    for i in 0..10 {
        let body = world.create_body(
            &BodyDef::builder()
                .body_type(BodyType::Dynamic)
                .position(Vec2::new(0.0, 0.55 + 1.02 * i as f32))
                .build(),
        );
        world.create_fixture(
            body,
            &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(1.0).friction(0.5),
        );
        boxes.push(body);
    }

    // Let the stack settle and fall asleep.
    for _ in 0..600 {
        world.step(1.0 / 60.0, 8, 3);
    }

    println!("awake bodies after 10s: {}", world.awake_body_count());
    for (i, body_id) in boxes.iter().enumerate() {
        let body = world.body(*body_id).unwrap();
        println!(
            "box {:>2}: y = {:.3}  asleep = {}",
            i,
            body.transform.p.y,
            !body.is_awake()
        );
    }
}
