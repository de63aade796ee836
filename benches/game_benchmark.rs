//! Benchmarks for running complete matches.
//!
//! This benchmarks the full world tick - unit planning, colony economy and
//! combat - which is the hot path of tournaments.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use antwar::config::{MatchConfig, Variant};
use antwar::game::Discard;
use antwar::tournament::{Match, generate_arena, run_match};
use criterion::{Criterion, criterion_group, criterion_main};

fn config(max_ticks: u64) -> MatchConfig {
    MatchConfig {
        max_ticks,
        ..MatchConfig::default()
    }
}

fn bench_single_match(c: &mut Criterion) {
    let scenario = generate_arena(42, 2, Variant::Singleplayer);
    let config = config(1200);

    c.bench_function("single_match_2c", |b| {
        b.iter(|| {
            let result = run_match(black_box(42), black_box(&scenario), black_box(&config));
            black_box(result)
        });
    });
}

fn bench_single_match_4c(c: &mut Criterion) {
    // Four colonies for a more crowded field
    let scenario = generate_arena(42, 4, Variant::Multiplayer);
    let config = MatchConfig {
        max_ticks: 1200,
        ..MatchConfig::for_variant(Variant::Multiplayer)
    };

    c.bench_function("single_match_4c", |b| {
        b.iter(|| {
            let result = run_match(black_box(42), black_box(&scenario), black_box(&config));
            black_box(result)
        });
    });
}

fn bench_match_batch(c: &mut Criterion) {
    // 10 matches sequentially (without parallel overhead)
    let config = config(600);
    let arenas: Vec<_> = (0..10u64)
        .map(|seed| generate_arena(seed, 2, Variant::Singleplayer))
        .collect();

    c.bench_function("10_matches_sequential", |b| {
        b.iter(|| {
            for (seed, scenario) in (0..10u64).zip(&arenas) {
                let result = run_match(black_box(seed), black_box(scenario), black_box(&config));
                let _ = black_box(result);
            }
        });
    });
}

fn bench_crowded_tick(c: &mut Criterion) {
    // One tick of a mid-game world with many ants on the field
    let scenario = generate_arena(7, 4, Variant::Singleplayer);
    let config = config(u64::MAX);
    let mut game = Match::new(7, &scenario, &config, &mut Discard).unwrap();
    for _ in 0..1500 {
        game.step(&mut Discard);
    }

    c.bench_function("crowded_tick_4c", |b| {
        b.iter_batched(
            || game.world().clone(),
            |mut world| {
                world.tick(&mut Discard);
                black_box(world)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_single_match,
    bench_single_match_4c,
    bench_match_batch,
    bench_crowded_tick
);
criterion_main!(benches);
