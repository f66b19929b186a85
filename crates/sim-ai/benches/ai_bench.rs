use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sim_runtime::{scenario, Game};

fn bench_month(c: &mut Criterion) {
    let world = scenario::default_scenario(42);
    c.bench_function("company ai x 30 days", |b| {
        b.iter(|| {
            let mut game = Game::new(world.clone());
            game.run_days(30);
            black_box(game.world.date);
        })
    });
}

criterion_group!(benches, bench_month);
criterion_main!(benches);
