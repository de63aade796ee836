//! Output formatting utilities for CLI.

#![allow(clippy::format_push_string)]

use antwar::MatchOutcome;
use antwar::tournament::{MatchResult, TournamentStats};
use serde::Serialize;

/// Format a match result as human-readable text.
pub(super) fn format_text(result: &MatchResult, name: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Match Result: {name} (seed: {})\n", result.seed));
    match result.outcome {
        MatchOutcome::Victory(team) => output.push_str(&format!("  Winner: Team {team}\n")),
        MatchOutcome::Draw => output.push_str("  Winner: Draw\n"),
    }
    output.push_str(&format!(
        "  Ticks: {} ({:.1}s)\n\n",
        result.ticks, result.seconds
    ));

    for report in &result.colonies {
        let colony = &report.snapshot;
        output.push_str(&format!(
            "  Team {} ({}): {} workers, {} soldiers, {} food, strength {}",
            colony.team,
            colony.species,
            colony.total_workers,
            colony.total_soldiers,
            colony.food,
            report.strength
        ));
        if let Some(tick) = report.eliminated_tick {
            output.push_str(&format!(" [eliminated tick {tick}]"));
        }
        output.push('\n');
    }

    output
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Per-team statistics.
    teams: Vec<JsonTournamentTeam>,
    /// Number of draws.
    draws: u64,
    /// Average match length in ticks.
    avg_ticks: f64,
}

/// JSON-serializable per-team tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentTeam {
    /// Team number.
    team: u8,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average ticks survived.
    avg_survival: f64,
}

impl JsonTournamentResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &TournamentStats) -> Self {
        let teams = stats
            .teams()
            .into_iter()
            .map(|team| JsonTournamentTeam {
                team,
                wins: stats.wins.get(&team).copied().unwrap_or(0),
                win_rate: stats.win_rate(team),
                avg_survival: stats.avg_survival(team),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            teams,
            draws: stats.draws,
            avg_ticks: stats.avg_ticks(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tournament Results ({} games)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for team in stats.teams() {
        let wins = stats.wins.get(&team).copied().unwrap_or(0);
        let species = stats
            .species(team)
            .map_or_else(|| "mixed".to_string(), |s| s.to_string().to_lowercase());
        output.push_str(&format!(
            "  Team {team} ({species}): {:.1}% ({wins} wins)\n",
            stats.win_rate(team) * 100.0
        ));
    }
    output.push_str(&format!(
        "  Draws: {} ({:.1}%)\n\n",
        stats.draws,
        stats.draw_rate() * 100.0
    ));

    output.push_str("Average Survival:\n");
    for team in stats.teams() {
        output.push_str(&format!(
            "  Team {team}: {:.0} ticks\n",
            stats.avg_survival(team)
        ));
    }

    output.push_str(&format!(
        "\nAverage Match Length: {:.0} ticks\n",
        stats.avg_ticks()
    ));

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats) -> String {
    let mut output = String::new();

    output.push_str("team,wins,win_rate,avg_survival\n");

    for team in stats.teams() {
        output.push_str(&format!(
            "{},{},{:.4},{:.2}\n",
            team,
            stats.wins.get(&team).copied().unwrap_or(0),
            stats.win_rate(team),
            stats.avg_survival(team)
        ));
    }

    output
}
