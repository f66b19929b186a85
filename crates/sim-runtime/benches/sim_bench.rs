use criterion::{criterion_group, criterion_main, Criterion};
use sim_runtime::{scenario, Game};

fn bench_days(c: &mut Criterion) {
    let world = scenario::default_scenario(42);
    let mut game = Game::new(world);
    c.bench_function("simulate_day", |b| {
        b.iter(|| {
            game.simulate_day();
        })
    });
}

criterion_group!(benches, bench_days);
criterion_main!(benches);
