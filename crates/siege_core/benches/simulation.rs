//! Simulation benchmarks for siege_core.
//!
//! Run with: `cargo bench -p siege_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use siege_core::prelude::*;

fn full_rosters() -> [ArmyRoster; 2] {
    let mut player = ArmyRoster::new();
    let mut enemy = ArmyRoster::new();
    for unit_type in UnitType::ALL {
        player.set(unit_type, 10);
        enemy.set(unit_type, 10);
    }
    [player, enemy]
}

fn crowded_battle() -> Battle {
    let mut config = BattleConfig::default();
    config.enemy.spawn_interval = 10;
    config.enemy.first_spawn = 0;
    config.catapult.spawn_interval = 100;
    let mut battle = Battle::start(config, full_rosters(), 200, 7).expect("default config is valid");
    for lane in Lane::ALL {
        battle
            .deploy_battalion(UnitType::Swordsman, lane)
            .expect("mana and roster cover three swordsmen");
    }
    for _ in 0..200 {
        battle.tick();
    }
    battle
}

/// Runs tick and snapshot benchmarks for a busy three-lane battle.
pub fn simulation_benchmark(c: &mut Criterion) {
    let battle = crowded_battle();

    c.bench_function("tick_three_lanes", |b| {
        b.iter_batched(
            || battle.clone(),
            |mut battle| black_box(battle.tick()),
            criterion::BatchSize::SmallInput,
        )
    });

    c.bench_function("snapshot", |b| b.iter(|| black_box(battle.snapshot())));

    c.bench_function("state_hash", |b| b.iter(|| black_box(battle.state_hash())));
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
