//! Tournament runner for antwar matches.
//!
//! Provides a pure function interface: `(seed, scenario, config) -> MatchResult`
//!
//! The runner handles:
//! - Building the world from a scenario
//! - Firing scripted player actions on time
//! - Ticking until elimination or the tick limit
//! - Parallel batches over many seeds with rayon

mod arena;

pub use arena::{ARENA_NESTS, generate_arena};

use std::collections::{BTreeMap, VecDeque};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::MatchConfig;
use crate::error::SimResult;
use crate::game::{Discard, EffectsSink, Elimination, MatchOutcome, Species, TeamId, World};
use crate::scenario::{ColonySnapshot, Scenario, ScriptedAction};

/// A match in progress.
#[derive(Debug)]
pub struct Match {
    world: World,
    timeline: VecDeque<ScriptedAction>,
    max_ticks: u64,
}

impl Match {
    /// Set up a match.
    ///
    /// # Errors
    ///
    /// Fails if the scenario is invalid.
    pub fn new(
        seed: u64,
        scenario: &Scenario,
        config: &MatchConfig,
        effects: &mut dyn EffectsSink,
    ) -> SimResult<Self> {
        let world = scenario.build_world(seed, config, effects)?;
        Ok(Self {
            world,
            timeline: scenario.timeline().into(),
            max_ticks: config.max_ticks,
        })
    }

    /// The world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The world, mutably, for hosts that drive players directly.
    pub const fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Whether the match has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.world.outcome().is_some() || self.world.tick_count() >= self.max_ticks
    }

    /// Fire due scripted actions and run one tick. Returns false once the
    /// match is over.
    pub fn step(&mut self, effects: &mut dyn EffectsSink) -> bool {
        if self.is_over() {
            return false;
        }
        while self
            .timeline
            .front()
            .is_some_and(|action| action.at <= self.world.time())
        {
            let Some(scripted) = self.timeline.pop_front() else {
                break;
            };
            if let Err(error) = self.world.apply_action(scripted.team, &scripted.action, effects) {
                warn!(team = scripted.team, action = ?scripted.action, %error, "scripted action rejected");
            }
        }
        self.world.tick(effects);
        !self.is_over()
    }

    /// Run to the end.
    pub fn run(&mut self, effects: &mut dyn EffectsSink) {
        while self.step(effects) {}
    }

    /// Summarize the finished (or abandoned) match.
    #[must_use]
    pub fn result(&self) -> MatchResult {
        let world = &self.world;
        let outcome = world.outcome_by_strength();
        let ticks = world.tick_count();
        let colonies = world
            .colonies()
            .filter_map(|colony| {
                let eliminated_tick = world
                    .eliminations()
                    .iter()
                    .find(|e| e.team == colony.team)
                    .map(|e| e.tick);
                Some(ColonyReport {
                    snapshot: world.colony_snapshot(colony.team)?,
                    strength: colony.strength(),
                    eliminated_tick,
                    survived_ticks: eliminated_tick.unwrap_or(ticks),
                })
            })
            .collect();
        MatchResult {
            seed: world.seed(),
            outcome,
            winner: outcome.winner(),
            ticks,
            seconds: world.time(),
            colonies,
            eliminations: world.eliminations().to_vec(),
        }
    }
}

/// How one colony fared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyReport {
    /// Final colony state.
    pub snapshot: ColonySnapshot,
    /// Final army strength.
    pub strength: i64,
    /// Tick of elimination, if eliminated.
    pub eliminated_tick: Option<u64>,
    /// Ticks spent alive.
    pub survived_ticks: u64,
}

/// Final result of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The seed used.
    pub seed: u64,
    /// How it ended.
    pub outcome: MatchOutcome,
    /// The winning team, if any.
    pub winner: Option<TeamId>,
    /// Ticks played.
    pub ticks: u64,
    /// Simulated seconds played.
    pub seconds: f32,
    /// Per-colony reports in team order.
    pub colonies: Vec<ColonyReport>,
    /// Eliminations in order.
    pub eliminations: Vec<Elimination>,
}

/// Run a complete match.
///
/// This is the main entry point - a pure function from inputs to result.
/// Given the same seed, scenario and config it always produces the same
/// `MatchResult`.
///
/// # Errors
///
/// Returns an error if the scenario is invalid.
pub fn run_match(seed: u64, scenario: &Scenario, config: &MatchConfig) -> SimResult<MatchResult> {
    let mut game = Match::new(seed, scenario, config, &mut Discard)?;
    game.run(&mut Discard);
    let result = game.result();
    info!(seed, outcome = ?result.outcome, ticks = result.ticks, "match over");
    Ok(result)
}

/// Aggregated results over many matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TournamentStats {
    /// Matches played.
    pub games_played: u64,
    /// Wins per team.
    pub wins: BTreeMap<TeamId, u64>,
    /// Drawn matches.
    pub draws: u64,
    survival_ticks: BTreeMap<TeamId, u64>,
    species: BTreeMap<TeamId, Species>,
    total_ticks: u64,
}

impl TournamentStats {
    /// Empty stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match result.
    pub fn add_result(&mut self, result: &MatchResult) {
        self.games_played += 1;
        self.total_ticks += result.ticks;
        match result.winner {
            Some(team) => *self.wins.entry(team).or_default() += 1,
            None => self.draws += 1,
        }
        for report in &result.colonies {
            let team = report.snapshot.team;
            *self.survival_ticks.entry(team).or_default() += report.survived_ticks;
            self.species.entry(team).or_insert(report.snapshot.species);
            self.wins.entry(team).or_default();
        }
    }

    /// Fold another batch into this one.
    pub fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.draws += other.draws;
        self.total_ticks += other.total_ticks;
        for (&team, &wins) in &other.wins {
            *self.wins.entry(team).or_default() += wins;
        }
        for (&team, &ticks) in &other.survival_ticks {
            *self.survival_ticks.entry(team).or_default() += ticks;
        }
        for (&team, &species) in &other.species {
            self.species.entry(team).or_insert(species);
        }
    }

    /// Teams seen, in order.
    #[must_use]
    pub fn teams(&self) -> Vec<TeamId> {
        self.wins.keys().copied().collect()
    }

    /// A team's species, if it played.
    #[must_use]
    pub fn species(&self, team: TeamId) -> Option<Species> {
        self.species.get(&team).copied()
    }

    /// Win rate for a team (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self, team: TeamId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(&team).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Draw rate (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn draw_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.draws as f64 / self.games_played as f64
    }

    /// Average ticks a team stayed alive.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_survival(&self, team: TeamId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.survival_ticks.get(&team).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Average match length in ticks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_ticks(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_ticks as f64 / self.games_played as f64
    }
}

/// Play `games` matches on consecutive seeds from `base_seed`, in parallel.
///
/// Each thread accumulates its own stats and the batches are merged at the
/// end, so the totals do not depend on scheduling.
///
/// # Errors
///
/// Returns an error if the scenario is invalid.
pub fn run_tournament(
    base_seed: u64,
    games: u64,
    scenario: &Scenario,
    config: &MatchConfig,
) -> SimResult<TournamentStats> {
    scenario.validate()?;
    let stats = (0..games)
        .into_par_iter()
        .fold(TournamentStats::new, |mut local, i| {
            match run_match(base_seed.wrapping_add(i), scenario, config) {
                Ok(result) => local.add_result(&result),
                Err(error) => warn!(%error, "match failed"),
            }
            local
        })
        .reduce(TournamentStats::new, |mut a, b| {
            a.merge(&b);
            a
        });
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::game::{Controller, Vec2};
    use crate::scenario::ColonySpec;

    fn short_config() -> MatchConfig {
        MatchConfig {
            max_ticks: 200,
            ..MatchConfig::default()
        }
    }

    #[test]
    fn test_run_match_deterministic() {
        let scenario = generate_arena(5, 2, Variant::Singleplayer);
        let a = run_match(5, &scenario, &short_config()).unwrap();
        let b = run_match(5, &scenario, &short_config()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ticks, 200);
        assert_eq!(a.colonies.len(), 2);
    }

    #[test]
    fn test_scripted_actions_fire() {
        let mut scenario = generate_arena(1, 2, Variant::Singleplayer);
        scenario.colonies[0].controller = Controller::Player;
        scenario.actions.push(ScriptedAction {
            at: 0.5,
            team: 1,
            action: crate::game::PlayerAction::Spawn {
                kind: crate::game::UnitKind::Soldier,
            },
        });
        let mut game = Match::new(1, &scenario, &short_config(), &mut Discard).unwrap();
        for _ in 0..20 {
            game.step(&mut Discard);
        }
        assert_eq!(game.world().colony(1).unwrap().total_soldiers, 1);
    }

    #[test]
    fn test_timeout_winner_by_strength() {
        let scenario = Scenario {
            name: "lopsided".to_string(),
            variant: Variant::Singleplayer,
            colonies: vec![
                {
                    let mut spec = ColonySpec::new(1, Species::Black, Controller::Scripted, Vec2::new(0.0, 50.0));
                    spec.soldiers = 2;
                    spec
                },
                ColonySpec::new(2, Species::Fire, Controller::Scripted, Vec2::new(0.0, -50.0)),
            ],
            food_spawners: Vec::new(),
            food: Vec::new(),
            actions: Vec::new(),
        };
        let config = MatchConfig {
            max_ticks: 5,
            ..MatchConfig::default()
        };
        let result = run_match(9, &scenario, &config).unwrap();
        assert_eq!(result.winner, Some(1));
        assert_eq!(result.colonies[1].survived_ticks, 5);
    }

    #[test]
    fn test_tournament_counts_every_game() {
        let scenario = generate_arena(3, 2, Variant::Singleplayer);
        let config = MatchConfig {
            max_ticks: 40,
            ..MatchConfig::default()
        };
        let stats = run_tournament(100, 6, &scenario, &config).unwrap();
        assert_eq!(stats.games_played, 6);
        let wins: u64 = stats.wins.values().sum();
        assert_eq!(wins + stats.draws, 6);
        assert_eq!(stats.teams(), vec![1, 2]);
    }

    #[test]
    fn test_stats_merge() {
        let mut a = TournamentStats::new();
        a.games_played = 2;
        a.wins.insert(1, 2);
        let mut b = TournamentStats::new();
        b.games_played = 1;
        b.draws = 1;
        b.wins.insert(1, 0);
        a.merge(&b);
        assert_eq!(a.games_played, 3);
        assert!((a.win_rate(1) - 2.0 / 3.0).abs() < 1e-9);
        assert!((a.draw_rate() - 1.0 / 3.0).abs() < 1e-9);
    }
}
