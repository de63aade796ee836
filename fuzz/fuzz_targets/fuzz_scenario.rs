#![no_main]

use antwar::config::MatchConfig;
use antwar::game::{Discard, check_invariants};
use antwar::scenario::Scenario;
use antwar::tournament::Match;
use libfuzzer_sys::fuzz_target;

/// Arbitrary scenario text must either be rejected or play out cleanly.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(scenario) = Scenario::from_json_str(text) else {
        return;
    };
    // Keep the field small enough to tick quickly
    if scenario.food.len() > 256 || scenario.food_spawners.len() > 16 {
        return;
    }
    if scenario.food_spawners.iter().any(|s| s.batch_size > 64) {
        return;
    }
    if scenario.colonies.iter().any(|c| c.workers.saturating_add(c.soldiers) > 200) {
        return;
    }
    let config = MatchConfig {
        max_ticks: 100,
        ..MatchConfig::default()
    };
    let Ok(mut game) = Match::new(0, &scenario, &config, &mut Discard) else {
        return;
    };
    loop {
        let more = game.step(&mut Discard);
        let violations = check_invariants(game.world());
        assert!(violations.is_empty(), "{violations:?}");
        if !more {
            break;
        }
    }
});
