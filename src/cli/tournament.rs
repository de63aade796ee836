//! Tournament command implementation.

use super::output::{JsonTournamentResult, format_tournament_csv, format_tournament_text};
use super::{CliError, Setup, TournamentFormat};
use antwar::tournament::{TournamentStats, run_match};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or is invalid.
pub(crate) fn execute(
    setup: &Setup<'_>,
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // already initialized
    }

    let base_seed = super::resolve_seed(seed);
    let (scenario, config) = setup.resolve(base_seed)?;
    scenario.validate()?;

    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    let stats = (0..games)
        .into_par_iter()
        .fold(TournamentStats::new, |mut local, i| {
            if let Ok(result) = run_match(base_seed.wrapping_add(i), &scenario, &config) {
                local.add_result(&result);
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            local
        })
        .reduce(TournamentStats::new, |mut a, b| {
            a.merge(&b);
            a
        });

    let elapsed = start.elapsed();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match format {
        TournamentFormat::Text => {
            print!("{}", format_tournament_text(&stats));
            println!(
                "\nCompleted in {:.2}s (seeds {base_seed}..{})",
                elapsed.as_secs_f64(),
                base_seed.wrapping_add(games)
            );
        }
        TournamentFormat::Json => {
            let json = JsonTournamentResult::from_stats(&stats);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        TournamentFormat::Csv => print!("{}", format_tournament_csv(&stats)),
    }

    Ok(())
}
