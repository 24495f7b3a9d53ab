use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;
use kinetic2d::{BodyDef, BodyType, FixtureDef, PhysicsWorld, Shape};

fn build_pyramid(world: &mut PhysicsWorld, base: usize) {
    let ground = world.create_body(&BodyDef::builder().position(Vec2::new(0.0, -10.0)).build());
    world.create_fixture(ground, &FixtureDef::new(Shape::cuboid(50.0, 10.0)));

    for row in 0..base {
        for column in 0..(base - row) {
            let x = (column as f32 - (base - row) as f32 * 0.5) * 1.05;
            let y = 0.55 + row as f32 * 1.05;
            let body = world.create_body(
                &BodyDef::builder()
                    .body_type(BodyType::Dynamic)
                    .position(Vec2::new(x, y))
                    .build(),
            );
            world.create_fixture(
                body,
                &FixtureDef::new(Shape::cuboid(0.5, 0.5)).density(1.0).friction(0.5),
            );
        }
    }
}

fn bench_pyramid_step(c: &mut Criterion) {
    c.bench_function("pyramid_10_rows_step", |b| {
        let mut world = PhysicsWorld::builder()
            .gravity(Vec2::new(0.0, -10.0))
            .build();
        build_pyramid(&mut world, 10);

        b.iter(|| {
            world.step(black_box(1.0 / 60.0), 8, 3);
        })
    });
}

fn bench_broad_phase(c: &mut Criterion) {
    c.bench_function("broad_phase_200_bodies", |b| {
        b.iter(|| {
            let mut world = PhysicsWorld::builder().gravity(Vec2::ZERO).build();
            for i in 0..200 {
                let body = world.create_body(
                    &BodyDef::builder()
                        .body_type(BodyType::Dynamic)
                        .position(Vec2::new((i % 20) as f32 * 1.5, (i / 20) as f32 * 1.5))
                        .build(),
                );
                world.create_fixture(body, &FixtureDef::new(Shape::circle(0.5)));
            }
            world.step(black_box(1.0 / 60.0), 8, 3);
        })
    });
}

fn bench_ray_casts(c: &mut Criterion) {
    c.bench_function("ray_cast_100_fixtures", |b| {
        let mut world = PhysicsWorld::builder().gravity(Vec2::ZERO).build();
        for i in 0..100 {
            let body = world.create_body(
                &BodyDef::builder()
                    .position(Vec2::new((i % 10) as f32 * 2.0, (i / 10) as f32 * 2.0))
                    .build(),
            );
            world.create_fixture(body, &FixtureDef::new(Shape::cuboid(0.4, 0.4)));
        }
        world.step(0.0, 1, 1);

        b.iter(|| {
            let mut count = 0;
            world.ray_cast(
                black_box(Vec2::new(-5.0, 3.0)),
                black_box(Vec2::new(25.0, 12.0)),
                |_, _, _, _| {
                    count += 1;
                    1.0
                },
            );
            count
        })
    });
}

criterion_group!(benches, bench_pyramid_step, bench_broad_phase, bench_ray_casts);
criterion_main!(benches);
