#![no_main]

use antwar::config::EconomyTuning;
use antwar::game::economy::{accrue_income, initial_wave, next_purchase, spend};
use antwar::game::{Colony, Controller, Difficulty, Species, UnitId, Vec2};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

/// Structured input for economy fuzzing.
#[derive(Arbitrary, Debug)]
struct EconomyInput {
    fire: bool,
    difficulty: u8,
    food: i32,
    workers: u16,
    soldiers: u16,
    /// Income timer steps in hundredths of a second.
    steps: Vec<u8>,
}

fuzz_target!(|input: EconomyInput| {
    let tuning = EconomyTuning::default();
    let difficulty = match input.difficulty % 3 {
        0 => Difficulty::Easy,
        1 => Difficulty::Medium,
        _ => Difficulty::Hard,
    };
    let species = if input.fire { Species::Fire } else { Species::Black };
    let mut colony = Colony::new(
        1,
        species,
        Controller::Ai { difficulty },
        Vec2::ZERO,
        UnitId(0),
        &tuning,
    );
    // Keep food in a range where income cannot overflow
    colony.food = input.food.clamp(-1_000_000, 1_000_000);
    colony.total_workers = u32::from(input.workers);
    colony.total_soldiers = u32::from(input.soldiers);

    initial_wave(&mut colony, &tuning);
    for step in input.steps.iter().take(256) {
        accrue_income(&mut colony, f32::from(*step) / 100.0, &tuning);
        let before = colony.food;
        let bought = spend(&mut colony, &tuning);
        assert!(bought.is_empty() || colony.food < before);
        assert!(
            colony.colony_size() >= colony.max_colony_size || next_purchase(&colony, &tuning).is_none(),
            "spending stopped early"
        );
        assert_eq!(colony.colony_size(), colony.total_workers + colony.total_soldiers);
    }
});
