use glam::Vec2;
use kinetic2d::*;

fn main() {
    let mut world = PhysicsWorld::builder().gravity(Vec2::ZERO).build();

    for i in 0..5 {
        let body = world.create_body(
            &BodyDef::builder()
                .position(Vec2::new(3.0 * i as f32, (i % 2) as f32 * 2.0))
                .build(),
        );
        world.create_fixture(body, &FixtureDef::new(Shape::circle(0.75)));
    }

    let query = RaycastQuery::new(Vec2::new(-5.0, 0.5), Vec2::X, 30.0);
    match world.raycast_closest(&query) {
        Some(hit) => println!(
            "closest hit at ({:.3}, {:.3}), normal ({:.2}, {:.2}), fraction {:.3}",
            hit.point.x, hit.point.y, hit.normal.x, hit.normal.y, hit.fraction
        ),
        None => println!("no hit"),
    }

    // Count everything along the segment with the visitor form.
    let mut hits = 0;
    world.ray_cast(Vec2::new(-5.0, 0.5), Vec2::new(25.0, 0.5), |_, point, _, _| {
        hits += 1;
        println!("pierced a fixture at ({:.3}, {:.3})", point.x, point.y);
        1.0
    });
    println!("{hits} fixtures on the segment");
}
