//! Scenario validation command implementation.

use super::CliError;
use antwar::config::{MatchConfig, Rules};
use antwar::game::{Discard, check_invariants};
use antwar::scenario::Scenario;
use antwar::tournament::Match;
use std::fs;
use std::path::Path;

/// Execute the validate command.
///
/// Parses the scenario (and rules, if given), then plays `ticks` ticks
/// checking the world invariants after each one.
///
/// # Errors
///
/// Returns an error if a file cannot be read, does not parse, or the trial
/// run breaks an invariant.
pub(crate) fn execute(
    scenario: &Path,
    rules: Option<&Path>,
    ticks: u64,
    seed: u64,
) -> Result<(), CliError> {
    let text = fs::read_to_string(scenario)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", scenario.display())))?;

    println!("Validating: {}", scenario.display());
    println!();

    let parsed: Result<Scenario, _> = serde_json::from_str(&text);
    print_check("Scenario JSON", parsed.is_ok());
    let parsed = parsed.map_err(|e| CliError::new(format!("Malformed scenario: {e}")))?;

    let layout = parsed.validate();
    print_check("Colony layout", layout.is_ok());
    layout?;

    let mut config = MatchConfig::for_variant(parsed.variant);
    if let Some(path) = rules {
        let loaded = Rules::load_over(path, parsed.variant);
        print_check("Rules file", loaded.is_ok());
        config.rules = loaded?;
    }
    config.max_ticks = ticks;

    println!();
    print!("Trial run ({ticks} ticks)... ");

    let mut game = Match::new(seed, &parsed, &config, &mut Discard)?;
    while !game.is_over() {
        game.step(&mut Discard);
        let violations = check_invariants(game.world());
        if let Some(first) = violations.first() {
            println!("FAILED");
            return Err(CliError::new(format!(
                "Invariant broken at tick {}: {first}",
                game.world().tick_count()
            )));
        }
    }
    println!("OK");

    let result = game.result();
    println!();
    println!("Summary:");
    println!("  Name:       {}", if parsed.name.is_empty() { "-" } else { parsed.name.as_str() });
    println!("  Variant:    {}", parsed.variant);
    println!("  Colonies:   {}", parsed.colonies.len());
    println!("  Spawners:   {}", parsed.food_spawners.len());
    println!("  Actions:    {}", parsed.actions.len());
    println!("  Ticks run:  {}", result.ticks);

    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
