//! Forecast and live-loop benchmarks for lane_core.
//!
//! Run with: `cargo bench -p lane_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lane_core::ai::{AiConfig, EnemyAi};
use lane_core::battle::GameSpeed;
use lane_core::combat::NoHooks;
use lane_core::forecast::ForecastConfig;
use lane_core::math::Fixed;
use lane_test_utils::determinism::frame;
use lane_test_utils::fixtures::{skirmish, walled_grid};

/// Full-round forecast over the skirmish fixture.
pub fn forecast_benchmark(c: &mut Criterion) {
    let battle = skirmish();
    let config = ForecastConfig::default();
    c.bench_function("forecast_30s", |b| {
        b.iter(|| black_box(battle.forecast(Fixed::from_num(30), &config)))
    });
}

/// Live loop: ten seconds of the skirmish at 100 ms frames.
pub fn tick_benchmark(c: &mut Criterion) {
    c.bench_function("battle_100_ticks", |b| {
        b.iter(|| {
            let mut battle = skirmish();
            for _ in 0..100 {
                battle.tick(frame(), GameSpeed::Normal, &mut NoHooks);
            }
            black_box(battle.state_hash())
        })
    });
}

/// AI planning including its forecast.
pub fn planner_benchmark(c: &mut Criterion) {
    let battle = skirmish();
    let config = AiConfig::default().with_deck(["soldier", "archer", "brute", "sneak", "fireball"]);
    c.bench_function("ai_plan_round", |b| {
        b.iter(|| {
            let mut ai = EnemyAi::new(config.clone());
            black_box(ai.plan_for_battle(&battle, &ForecastConfig::default(), 1, 1))
        })
    });
}

/// Unbounded A* across the walled fixture grid.
pub fn pathfinding_benchmark(c: &mut Criterion) {
    let grid = walled_grid();
    c.bench_function("find_path_around_wall", |b| {
        b.iter(|| black_box(lane_core::pathfinding::find_path(&grid, (2, 7), (37, 7))))
    });
}

criterion_group!(
    benches,
    forecast_benchmark,
    tick_benchmark,
    planner_benchmark,
    pathfinding_benchmark
);
criterion_main!(benches);
