use glam::Vec2;
use kinetic2d::*;

fn main() {
    let mut engine = PhysicsEngine::new(Vec2::new(0.0, -10.0));

    let ground = engine.add_body(&BodyDef::builder().position(Vec2::new(0.0, -10.0)).build());
    engine.add_fixture(ground, &FixtureDef::new(Shape::cuboid(50.0, 10.0)));

    let ball = engine.add_body(
        &BodyDef::builder()
            .body_type(BodyType::Dynamic)
            .position(Vec2::new(0.0, 4.0))
            .build(),
    );
    engine.add_fixture(ball, &FixtureDef::new(Shape::circle(0.5)).restitution(0.6));

    for tick in 0..120 {
        engine.step(1.0 / 60.0);
        if tick % 20 == 0 {
            if let Some(body) = engine.get_body(ball) {
                println!(
                    "t = {:.2}s  position = ({:.3}, {:.3})  velocity = ({:.3}, {:.3})",
                    tick as f32 / 60.0,
                    body.transform.p.x,
                    body.transform.p.y,
                    body.linear_velocity.x,
                    body.linear_velocity.y,
                );
            }
        }
    }
}
