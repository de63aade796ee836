//! Run command implementation.

use super::output::format_text;
use super::{CliError, OutputFormat, Setup};
use antwar::game::Discard;
use antwar::replay::{Recording, render_text};
use antwar::tournament::Match;
use std::path::Path;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or the match fails to
/// start.
pub(crate) fn execute(
    setup: &Setup<'_>,
    seed: Option<u64>,
    format: OutputFormat,
    save: Option<&Path>,
    quiet: bool,
) -> Result<(), CliError> {
    let seed = super::resolve_seed(seed);
    let (scenario, config) = setup.resolve(seed)?;
    let name = if scenario.name.is_empty() {
        "arena".to_string()
    } else {
        scenario.name.clone()
    };

    if !quiet {
        println!("Running match {name} with seed {seed}...");
        println!(
            "Colonies: {}",
            scenario
                .colonies
                .iter()
                .map(|c| format!("{} ({})", c.team, c.species))
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
    }

    let mut game = Match::new(seed, &scenario, &config, &mut Discard)?;
    game.run(&mut Discard);
    let result = game.result();

    if let Some(save_path) = save {
        let recording = Recording::new(seed, scenario, config);
        recording
            .save(save_path)
            .map_err(|e| CliError::new(format!("Failed to save recording: {e}")))?;
        if !quiet {
            println!("Recording saved to: {}", save_path.display());
            println!();
        }
    }

    match format {
        OutputFormat::Text => print!("{}", format_text(&result, &name)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table => print!("{}", render_text(game.world())),
    }

    Ok(())
}
