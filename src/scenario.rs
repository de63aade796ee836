//! Scenario fixtures: the starting layout of a match and scripted player
//! actions, loaded from JSON.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{MatchConfig, Variant};
use crate::error::{SimError, SimResult};
use crate::game::{
    ColonySetup, Controller, Difficulty, EffectsSink, FoodSpawner, MAX_TEAMS, PlayerAction, Species,
    StrategicCommand, TeamId, Upgrade, Vec2, World,
};

/// Externally visible colony state, as shown in result tables and fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColonySnapshot {
    /// Team number.
    pub team: TeamId,
    /// Species.
    pub species: Species,
    /// Food in store.
    pub food: i32,
    /// Living soldiers and super soldiers.
    pub total_soldiers: u32,
    /// Living workers.
    pub total_workers: u32,
    /// Size cap.
    pub max_colony_size: u32,
    /// Current strategic order.
    pub command: StrategicCommand,
    /// Owned upgrades.
    pub upgrades: Vec<Upgrade>,
    /// Queen health, zero once the colony is out.
    pub health: f32,
}

fn default_controller() -> Controller {
    Controller::Ai {
        difficulty: Difficulty::Medium,
    }
}

/// One colony in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColonySpec {
    /// Team number, 1 to 4.
    pub team: TeamId,
    /// Species.
    pub species: Species,
    /// Who runs it. Defaults to a medium AI.
    #[serde(default = "default_controller")]
    pub controller: Controller,
    /// Nest rally point.
    pub spawn: Vec2,
    /// Queen position, defaults to the nest.
    #[serde(default)]
    pub queen: Option<Vec2>,
    /// Starting food.
    #[serde(default)]
    pub food: Option<i32>,
    /// Workers on the field at the start.
    #[serde(default)]
    pub workers: u32,
    /// Soldiers on the field at the start.
    #[serde(default)]
    pub soldiers: u32,
    /// Size cap override.
    #[serde(default)]
    pub max_colony_size: Option<u32>,
    /// Starting strategic order.
    #[serde(default)]
    pub command: StrategicCommand,
    /// Upgrades owned from the start.
    #[serde(default)]
    pub upgrades: Vec<Upgrade>,
    /// Starting queen health.
    #[serde(default)]
    pub queen_health: Option<f32>,
}

impl ColonySpec {
    /// A bare colony at `spawn`.
    #[must_use]
    pub fn new(team: TeamId, species: Species, controller: Controller, spawn: Vec2) -> Self {
        Self {
            team,
            species,
            controller,
            spawn,
            queen: None,
            food: None,
            workers: 0,
            soldiers: 0,
            max_colony_size: None,
            command: StrategicCommand::None,
            upgrades: Vec::new(),
            queen_health: None,
        }
    }

    /// The world-level setup for this colony.
    #[must_use]
    pub fn setup(&self) -> ColonySetup {
        ColonySetup {
            team: self.team,
            species: self.species,
            controller: self.controller,
            spawn_pos: self.spawn,
            queen_pos: self.queen.unwrap_or(self.spawn),
            food: self.food,
            workers: self.workers,
            soldiers: self.soldiers,
            max_colony_size: self.max_colony_size,
            command: self.command,
            upgrades: self.upgrades.clone(),
            queen_health: self.queen_health,
        }
    }
}

/// A player action fired at a given simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedAction {
    /// Simulated seconds since the start.
    pub at: f32,
    /// Acting team.
    pub team: TeamId,
    /// What it does.
    #[serde(flatten)]
    pub action: PlayerAction,
}

/// A complete match setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Which rule preset the scenario is meant for.
    #[serde(default)]
    pub variant: Variant,
    /// Participating colonies.
    pub colonies: Vec<ColonySpec>,
    /// Food spawners.
    #[serde(default)]
    pub food_spawners: Vec<FoodSpawner>,
    /// Loose pellets on the ground at the start.
    #[serde(default)]
    pub food: Vec<Vec2>,
    /// Scripted player actions, in any order.
    #[serde(default)]
    pub actions: Vec<ScriptedAction>,
}

impl Scenario {
    /// Parse a scenario from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or an invalid layout.
    pub fn from_json_str(text: &str) -> SimResult<Self> {
        let scenario: Self = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not hold a valid scenario.
    pub fn load(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check the layout is playable.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidScenario`] describing the first problem found.
    pub fn validate(&self) -> SimResult<()> {
        if self.colonies.is_empty() {
            return Err(SimError::InvalidScenario("no colonies".to_string()));
        }
        if self.colonies.len() > MAX_TEAMS {
            return Err(SimError::InvalidScenario(format!(
                "{} colonies, at most {MAX_TEAMS} allowed",
                self.colonies.len()
            )));
        }
        let mut teams = BTreeSet::new();
        for colony in &self.colonies {
            if colony.team == 0 || usize::from(colony.team) > MAX_TEAMS {
                return Err(SimError::InvalidTeam(colony.team));
            }
            if !teams.insert(colony.team) {
                return Err(SimError::DuplicateTeam(colony.team));
            }
            let starting = colony.workers.checked_add(colony.soldiers);
            let cap = colony.max_colony_size.unwrap_or(u32::MAX);
            if starting.filter(|&count| count <= cap).is_none() {
                return Err(SimError::InvalidScenario(format!(
                    "team {} starts with {} workers and {} soldiers, more than its size cap",
                    colony.team, colony.workers, colony.soldiers
                )));
            }
        }
        for action in &self.actions {
            if !teams.contains(&action.team) {
                return Err(SimError::UnknownTeam(action.team));
            }
            if !action.at.is_finite() || action.at < 0.0 {
                return Err(SimError::InvalidScenario(format!(
                    "action for team {} at invalid time {}",
                    action.team, action.at
                )));
            }
        }
        for spawner in &self.food_spawners {
            if spawner.interval <= 0.0 {
                return Err(SimError::InvalidScenario(
                    "food spawner interval must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Scripted actions sorted by time, ties kept in file order.
    #[must_use]
    pub fn timeline(&self) -> Vec<ScriptedAction> {
        let mut actions = self.actions.clone();
        actions.sort_by(|a, b| a.at.total_cmp(&b.at));
        actions
    }

    /// Build the starting world.
    ///
    /// # Errors
    ///
    /// Fails if the scenario is invalid.
    pub fn build_world(
        &self,
        seed: u64,
        config: &MatchConfig,
        effects: &mut dyn EffectsSink,
    ) -> SimResult<World> {
        self.validate()?;
        let mut world = World::new(seed, config.rules.clone(), config.tick_seconds);
        for colony in &self.colonies {
            world.add_colony(&colony.setup(), effects)?;
        }
        for spawner in &self.food_spawners {
            world.add_food_spawner(*spawner);
        }
        for &position in &self.food {
            world.spawn_food(position);
        }
        Ok(world)
    }
}

impl World {
    /// Snapshot of one colony.
    #[must_use]
    pub fn colony_snapshot(&self, team: TeamId) -> Option<ColonySnapshot> {
        let colony = self.colony(team)?;
        Some(ColonySnapshot {
            team,
            species: colony.species,
            food: colony.food,
            total_soldiers: colony.total_soldiers,
            total_workers: colony.total_workers,
            max_colony_size: colony.max_colony_size,
            command: colony.command,
            upgrades: colony.upgrades.clone(),
            health: self.queen_health(team).map_or(0.0, |h| h.current.max(0.0)),
        })
    }

    /// Snapshots of every colony in team order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ColonySnapshot> {
        self.colonies()
            .filter_map(|c| self.colony_snapshot(c.team))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Command, Discard, UnitKind};

    const DUEL: &str = r#"{
        "name": "duel",
        "colonies": [
            {"team": 1, "species": "black", "controller": {"kind": "player"}, "spawn": {"x": 0, "y": 40}, "workers": 2},
            {"team": 2, "species": "fire", "spawn": {"x": 0, "y": -40}, "soldiers": 1, "upgrades": ["Rapid Movement"]}
        ],
        "foodSpawners": [{"position": {"x": 0, "y": 0}}],
        "food": [{"x": 3, "y": 3}],
        "actions": [
            {"at": 2.0, "team": 1, "action": "spawn", "kind": "soldier"},
            {"at": 1.0, "team": 1, "action": "place_marker", "command": 3, "position": {"x": 0, "y": 10}}
        ]
    }"#;

    #[test]
    fn test_parse_duel() {
        let scenario = Scenario::from_json_str(DUEL).unwrap();
        assert_eq!(scenario.colonies.len(), 2);
        assert_eq!(scenario.colonies[1].controller, default_controller());
        assert_eq!(scenario.colonies[1].upgrades, vec![Upgrade::RapidMovement]);
        let timeline = scenario.timeline();
        assert!(matches!(
            timeline[0].action,
            PlayerAction::PlaceMarker {
                command: Command::Attack,
                ..
            }
        ));
        assert_eq!(
            timeline[1].action,
            PlayerAction::Spawn {
                kind: UnitKind::Soldier
            }
        );
    }

    #[test]
    fn test_build_world() {
        let scenario = Scenario::from_json_str(DUEL).unwrap();
        let world = scenario
            .build_world(1, &MatchConfig::default(), &mut Discard)
            .unwrap();
        assert_eq!(world.colonies().count(), 2);
        assert_eq!(world.foods().count(), 1);
        let snapshot = world.colony_snapshot(1).unwrap();
        assert_eq!(snapshot.total_workers, 2);
        assert!((snapshot.health - 1000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_bad_layouts() {
        let mut scenario = Scenario::from_json_str(DUEL).unwrap();
        scenario.colonies[1].team = 1;
        assert!(matches!(scenario.validate(), Err(SimError::DuplicateTeam(1))));

        let mut scenario = Scenario::from_json_str(DUEL).unwrap();
        scenario.actions[0].team = 3;
        assert!(matches!(scenario.validate(), Err(SimError::UnknownTeam(3))));

        let mut scenario = Scenario::from_json_str(DUEL).unwrap();
        scenario.colonies[0].max_colony_size = Some(1);
        assert!(matches!(scenario.validate(), Err(SimError::InvalidScenario(_))));

        let empty = r#"{"colonies": []}"#;
        assert!(matches!(
            Scenario::from_json_str(empty),
            Err(SimError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_oversized_starting_colony_is_rejected() {
        let overflowing = r#"{"colonies": [
            {"team": 1, "species": "black", "spawn": {"x": 0, "y": 0}, "workers": 4294967295, "soldiers": 1}
        ]}"#;
        assert!(matches!(
            Scenario::from_json_str(overflowing),
            Err(SimError::InvalidScenario(_))
        ));

        let huge = r#"{"colonies": [
            {"team": 1, "species": "black", "spawn": {"x": 0, "y": 0}, "workers": 100000000}
        ]}"#;
        let scenario = Scenario::from_json_str(huge).unwrap();
        let built = scenario.build_world(1, &MatchConfig::default(), &mut Discard);
        assert!(matches!(built, Err(SimError::ColonyFull { max: 50 })));
    }

    #[test]
    fn test_snapshot_field_names() {
        let snapshot = ColonySnapshot {
            team: 1,
            species: Species::Black,
            food: 100,
            total_soldiers: 0,
            total_workers: 4,
            max_colony_size: 50,
            command: StrategicCommand::None,
            upgrades: Vec::new(),
            health: 1000.0,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"totalWorkers\":4"));
        assert!(json.contains("\"maxColonySize\":50"));
    }
}
