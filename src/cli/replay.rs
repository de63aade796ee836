//! Replay command implementation.

use super::{CliError, ReplayFormat};
use antwar::replay::{Recording, ReplayEngine, render_text};
use std::path::Path;

/// Execute the replay command.
///
/// Prints the world at `tick` (or the final tick), or every `every` ticks
/// up to it when asked.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded.
pub(crate) fn execute(
    recording: &Path,
    format: ReplayFormat,
    tick: Option<u64>,
    every: Option<u64>,
) -> Result<(), CliError> {
    let rec = Recording::load(recording)
        .map_err(|e| CliError::new(format!("Failed to load recording: {e}")))?;
    let target = tick.unwrap_or(rec.config.max_ticks);
    let mut engine = ReplayEngine::new(rec)?;

    match every {
        Some(step) if step > 0 => {
            while engine.tick() < target {
                print_frame(&engine, format)?;
                let next = engine.tick().saturating_add(step).min(target);
                engine.jump_to(next)?;
                if engine.is_over() {
                    break;
                }
            }
            print_frame(&engine, format)?;
        }
        _ => {
            engine.jump_to(target)?;
            print_frame(&engine, format)?;
        }
    }

    Ok(())
}

fn print_frame(engine: &ReplayEngine, format: ReplayFormat) -> Result<(), CliError> {
    match format {
        ReplayFormat::Text => println!("{}", render_text(engine.world())),
        ReplayFormat::Json => {
            let frame = serde_json::json!({
                "tick": engine.tick(),
                "colonies": engine.world().snapshots(),
                "outcome": engine.world().outcome(),
            });
            println!("{}", serde_json::to_string(&frame)?);
        }
    }
    Ok(())
}
