//! Match replay and viewing.
//!
//! Because antwar matches are fully deterministic, a recording needs only:
//! - `seed: u64` - the match seed
//! - `scenario` - starting layout and scripted actions
//! - `config` - tick rate, tick limit and rules
//!
//! No state deltas are stored. To view tick N, re-run the simulation from
//! tick 0 to N.
//!
//! # Time travel
//!
//! - **Forward**: keep stepping the match
//! - **Backward**: re-run from tick 0 to `current_tick - 1`
//! - **Jump to tick N**: re-run from tick 0 to N

mod text;

pub use text::render_text;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::error::SimResult;
use crate::game::{Discard, World};
use crate::scenario::Scenario;
use crate::tournament::{Match, MatchResult};

/// Minimal recording: seed, scenario and config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Match seed.
    pub seed: u64,
    /// Starting layout and scripted actions.
    pub scenario: Scenario,
    /// Match configuration.
    pub config: MatchConfig,
}

impl Recording {
    /// Bundle the inputs of a match.
    #[must_use]
    pub const fn new(seed: u64, scenario: Scenario, config: MatchConfig) -> Self {
        Self {
            seed,
            scenario,
            config,
        }
    }

    /// Save as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> SimResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Load a JSON recording.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or holds an
    /// invalid scenario.
    pub fn load(path: &Path) -> SimResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let recording: Self = serde_json::from_reader(reader)?;
        recording.scenario.validate()?;
        Ok(recording)
    }
}

/// Replay engine: steps through a recorded match deterministically.
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    game: Match,
}

impl ReplayEngine {
    /// Start a replay at tick 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded scenario is invalid.
    pub fn new(recording: Recording) -> SimResult<Self> {
        Self::new_at_tick(recording, 0)
    }

    /// Start a replay at `target` by re-simulating from tick 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded scenario is invalid.
    pub fn new_at_tick(recording: Recording, target: u64) -> SimResult<Self> {
        let game = Match::new(recording.seed, &recording.scenario, &recording.config, &mut Discard)?;
        let mut engine = Self { recording, game };
        while engine.tick() < target && engine.step_forward() {}
        Ok(engine)
    }

    /// The recording.
    #[must_use]
    pub const fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.game.world().tick_count()
    }

    /// Current world.
    #[must_use]
    pub const fn world(&self) -> &World {
        self.game.world()
    }

    /// Whether the match is over.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.game.is_over()
    }

    /// Advance one tick. Returns false if the match was already over.
    pub fn step_forward(&mut self) -> bool {
        if self.game.is_over() {
            return false;
        }
        self.game.step(&mut Discard);
        true
    }

    /// Go back one tick. Returns false at tick 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded scenario is invalid.
    pub fn step_backward(&mut self) -> SimResult<bool> {
        let current = self.tick();
        if current == 0 {
            return Ok(false);
        }
        self.jump_to(current - 1)?;
        Ok(true)
    }

    /// Move to `target`, re-simulating from tick 0 when going back. Stops
    /// early if the match ends first.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded scenario is invalid.
    pub fn jump_to(&mut self, target: u64) -> SimResult<()> {
        if target < self.tick() {
            self.game = Match::new(
                self.recording.seed,
                &self.recording.scenario,
                &self.recording.config,
                &mut Discard,
            )?;
        }
        while self.tick() < target && self.step_forward() {}
        Ok(())
    }

    /// Run to the end and summarize.
    pub fn finish(&mut self) -> MatchResult {
        while self.step_forward() {}
        self.game.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::tournament::{generate_arena, run_match};

    fn recording() -> Recording {
        let config = MatchConfig {
            max_ticks: 120,
            ..MatchConfig::default()
        };
        Recording::new(21, generate_arena(21, 2, Variant::Singleplayer), config)
    }

    #[test]
    fn test_replay_matches_direct_run() {
        let rec = recording();
        let direct = run_match(rec.seed, &rec.scenario, &rec.config).unwrap();
        let mut engine = ReplayEngine::new(rec).unwrap();
        assert_eq!(engine.finish(), direct);
    }

    #[test]
    fn test_jump_back_reproduces_state() {
        let mut engine = ReplayEngine::new(recording()).unwrap();
        engine.jump_to(60).unwrap();
        let checksum = engine.world().checksum();
        engine.jump_to(100).unwrap();
        engine.jump_to(60).unwrap();
        assert_eq!(engine.tick(), 60);
        assert_eq!(engine.world().checksum(), checksum);
        assert!(engine.step_backward().unwrap());
        assert_eq!(engine.tick(), 59);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.json");
        let rec = recording();
        rec.save(&path).unwrap();
        assert_eq!(Recording::load(&path).unwrap(), rec);
    }
}
