//! Battle simulation benchmarks
//!
//! Run with: cargo bench
//!
//! This will generate HTML reports in target/criterion/

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use duel_sim::batch::run_batch;
use duel_sim::battle::{replay_battle, BattleRng};
use duel_sim::prediction::calculate_win_probability;
use duel_sim::registry::{load_registry, Registry};
use duel_sim::SimulationConfig;

fn registry() -> Registry {
    load_registry(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
        .expect("data directory should load")
}

fn bench_single_battle(c: &mut Criterion) {
    let registry = registry();
    let config = SimulationConfig::default().with_seed(7);

    c.bench_function("battle_zuko_vs_azula", |b| {
        b.iter(|| {
            let result = registry
                .simulate("zuko", "azula", "fire_nation_palace", black_box(&config))
                .expect("battle should run");
            black_box(result)
        });
    });
}

fn bench_replay(c: &mut Criterion) {
    let registry = registry();
    let config = SimulationConfig::default().with_seed(7);
    let original = registry
        .simulate("katara", "toph", "ba_sing_se", &config)
        .expect("battle should run");
    let f1 = registry.fighter("katara").expect("katara");
    let f2 = registry.fighter("toph").expect("toph");
    let location = registry.location("ba_sing_se").expect("ba_sing_se");

    c.bench_function("replay_katara_vs_toph", |b| {
        b.iter(|| {
            let result = replay_battle(
                f1,
                f2,
                location,
                &config,
                registry.rules(),
                black_box(&original.events),
            )
            .expect("replay should match");
            black_box(result)
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let registry = registry();
    let config = SimulationConfig::default();
    let f1 = registry.fighter("aang").expect("aang");
    let f2 = registry.fighter("azula").expect("azula");
    let location = registry.location("western_air_temple").expect("western_air_temple");

    let mut group = c.benchmark_group("batch");
    group.sample_size(10);
    for count in [10usize, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let results = run_batch(f1, f2, location, &config, registry.rules(), count, 0);
                black_box(results)
            });
        });
    }
    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let registry = registry();
    let f1 = registry.fighter("toph").expect("toph");
    let f2 = registry.fighter("sokka").expect("sokka");
    let location = registry.location("ba_sing_se").expect("ba_sing_se");
    let mut rng = BattleRng::seeded(1);

    c.bench_function("win_probability", |b| {
        b.iter(|| {
            let prediction = calculate_win_probability(f1, f2, location, None, &mut rng)
                .expect("prediction should succeed");
            black_box(prediction)
        });
    });
}

criterion_group!(
    benches,
    bench_single_battle,
    bench_replay,
    bench_batch,
    bench_prediction,
);
criterion_main!(benches);
