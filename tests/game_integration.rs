//! Multi-tick integration tests for whole matches.
//!
//! These tests verify that matches run to completion without panicking,
//! keep the world invariants on every tick, and are reproducible from
//! their seed.
//!
//! Run with: cargo test --release game_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use antwar::config::{MatchConfig, Variant};
use antwar::game::{Discard, MatchOutcome, World, check_invariants};
use antwar::replay::{Recording, ReplayEngine};
use antwar::tournament::{Match, generate_arena, run_match, run_tournament};

fn config(max_ticks: u64) -> MatchConfig {
    MatchConfig {
        max_ticks,
        ..MatchConfig::default()
    }
}

/// Step a match to the end, checking invariants after every tick.
fn play_checked(game: &mut Match) {
    loop {
        let more = game.step(&mut Discard);
        let violations = check_invariants(game.world());
        assert!(
            violations.is_empty(),
            "tick {}: {:?}",
            game.world().tick_count(),
            violations
        );
        if !more {
            break;
        }
    }
}

#[test]
fn test_600_tick_match_no_panic() {
    let scenario = generate_arena(42, 2, Variant::Singleplayer);
    let result = run_match(42, &scenario, &config(600)).unwrap();
    assert!(result.ticks <= 600);
    assert_eq!(result.colonies.len(), 2);
}

#[test]
fn test_multiple_seeds_keep_invariants() {
    for (seed, colonies) in (0..12u64).zip([2, 3, 4].into_iter().cycle()) {
        let scenario = generate_arena(seed, colonies, Variant::Singleplayer);
        let mut game = Match::new(seed, &scenario, &config(400), &mut Discard).unwrap();
        play_checked(&mut game);
    }
}

#[test]
fn test_four_colony_multiplayer_rules() {
    let scenario = generate_arena(9999, 4, Variant::Multiplayer);
    let match_config = MatchConfig::for_variant(Variant::Multiplayer);
    let match_config = MatchConfig {
        max_ticks: 800,
        ..match_config
    };
    let mut game = Match::new(9999, &scenario, &match_config, &mut Discard).unwrap();
    play_checked(&mut game);
    assert_eq!(game.result().colonies.len(), 4);
}

#[test]
fn test_tutorial_rules_run() {
    let scenario = generate_arena(5, 2, Variant::Tutorial);
    let match_config = MatchConfig {
        max_ticks: 300,
        ..MatchConfig::for_variant(Variant::Tutorial)
    };
    let mut game = Match::new(5, &scenario, &match_config, &mut Discard).unwrap();
    play_checked(&mut game);
}

#[test]
fn test_colonies_grow_from_income() {
    let scenario = generate_arena(77, 2, Variant::Singleplayer);
    let result = run_match(77, &scenario, &config(200)).unwrap();
    for report in &result.colonies {
        let colony = &report.snapshot;
        assert!(
            colony.total_workers + colony.total_soldiers > 0,
            "team {} never bought anything",
            colony.team
        );
    }
}

#[test]
fn test_determinism() {
    let scenario = generate_arena(7777, 3, Variant::Singleplayer);
    let match_config = config(500);

    let mut a = Match::new(7777, &scenario, &match_config, &mut Discard).unwrap();
    let mut b = Match::new(7777, &scenario, &match_config, &mut Discard).unwrap();
    while a.step(&mut Discard) {
        b.step(&mut Discard);
        assert_eq!(
            a.world().checksum(),
            b.world().checksum(),
            "diverged at tick {}",
            a.world().tick_count()
        );
    }
    assert_eq!(a.result(), b.result());
}

#[test]
fn test_different_seeds_differ() {
    let scenario = generate_arena(1, 2, Variant::Singleplayer);
    let match_config = config(300);
    let mut a = Match::new(1, &scenario, &match_config, &mut Discard).unwrap();
    let mut b = Match::new(2, &scenario, &match_config, &mut Discard).unwrap();
    a.run(&mut Discard);
    b.run(&mut Discard);
    assert_ne!(a.world().checksum(), b.world().checksum());
}

#[test]
fn test_match_terminates() {
    for seed in 0..20 {
        let scenario = generate_arena(seed, 2, Variant::Singleplayer);
        let result = run_match(seed, &scenario, &config(50)).unwrap();
        assert!(result.ticks <= 50, "match exceeded max_ticks for seed {seed}");
        if let MatchOutcome::Victory(team) = result.outcome {
            assert_eq!(result.winner, Some(team));
        }
    }
}

#[test]
fn test_replay_reproduces_match() {
    let scenario = generate_arena(31, 2, Variant::Singleplayer);
    let recording = Recording::new(31, scenario.clone(), config(250));
    let direct = run_match(31, &scenario, &config(250)).unwrap();
    let mut engine = ReplayEngine::new(recording).unwrap();
    assert_eq!(engine.finish(), direct);
}

#[test]
fn test_tournament_totals() {
    let scenario = generate_arena(3, 2, Variant::Singleplayer);
    let stats = run_tournament(100, 6, &scenario, &config(100)).unwrap();
    assert_eq!(stats.games_played, 6);
    let wins: u64 = stats.wins.values().sum();
    assert_eq!(wins + stats.draws, 6);
}

fn unit_ids(world: &World) -> BTreeSet<u32> {
    world.units().map(|u| u.id.0).collect()
}

fn food_ids(world: &World) -> BTreeSet<u32> {
    world.foods().map(|f| f.id.0).collect()
}

#[test]
fn test_mirror_tracks_authority() {
    let scenario = generate_arena(12, 3, Variant::Multiplayer);
    let match_config = MatchConfig::for_variant(Variant::Multiplayer);
    let mut authority = scenario.build_world(12, &match_config, &mut Discard).unwrap();
    let mut mirror = scenario.build_world(12, &match_config, &mut Discard).unwrap();
    authority.enable_replication();

    for _ in 0..400 {
        authority.tick(&mut Discard);
        for event in authority.drain_broadcasts() {
            mirror.apply_event(&event, &mut Discard);
        }
        for colony in authority.colonies() {
            let copy = mirror.colony(colony.team).unwrap();
            assert_eq!(copy.food, colony.food, "team {} food", colony.team);
            assert_eq!(copy.total_workers, colony.total_workers);
            assert_eq!(copy.total_soldiers, colony.total_soldiers);
            assert_eq!(copy.alive, colony.alive);
        }
        assert_eq!(unit_ids(&mirror), unit_ids(&authority));
        assert_eq!(food_ids(&mirror), food_ids(&authority));
    }
}
