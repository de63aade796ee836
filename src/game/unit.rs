//! Units on the field.
//!
//! Worker, soldier and super soldier ants are the colony's army. Queens and
//! player avatars are units too: they share the health model and can be
//! targeted, but they never run the decision engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::UnitStats;
use crate::game::{FoodId, Health, TeamId, UnitMemory, Vec2};

/// Stable identifier of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// What a unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Gatherer; weak in a fight.
    Worker,
    /// Basic fighter.
    Soldier,
    /// Heavy fighter unlocked by an upgrade.
    SuperSoldier,
    /// The colony's heart; its death eliminates the colony.
    Queen,
    /// A human player's body.
    Avatar,
}

impl UnitKind {
    /// Whether the unit runs the ant decision engine.
    #[must_use]
    pub const fn is_ant(self) -> bool {
        matches!(self, Self::Worker | Self::Soldier | Self::SuperSoldier)
    }

    /// Whether the unit counts toward the colony's soldiers.
    #[must_use]
    pub const fn is_soldier(self) -> bool {
        matches!(self, Self::Soldier | Self::SuperSoldier)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Worker => "worker",
            Self::Soldier => "soldier",
            Self::SuperSoldier => "super soldier",
            Self::Queen => "queen",
            Self::Avatar => "avatar",
        };
        f.write_str(name)
    }
}

/// Ant species. Each has its own upgrade tree and income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    /// Black ants: economy and defence.
    Black,
    /// Fire ants: aggression.
    Fire,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => f.write_str("Black"),
            Self::Fire => f.write_str("Fire"),
        }
    }
}

/// A unit and all of its per-unit state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Owning team.
    pub team: TeamId,
    /// Unit kind.
    pub kind: UnitKind,
    /// Species of the owning colony.
    pub species: Species,
    /// Current position.
    pub position: Vec2,
    /// Facing direction.
    pub facing: Vec2,
    /// Where the decision engine wants the unit to go.
    pub target: Vec2,
    /// Destination last handed to the navigator.
    pub destination: Option<Vec2>,
    /// Movement speed.
    pub speed: f32,
    /// Damage dealt per hit.
    pub attack: i32,
    /// Health.
    pub health: Health,
    /// Pellet being carried.
    pub carried: Option<FoodId>,
    /// Multiplier applied to delivered food.
    pub food_mult: f32,
    /// Regenerates health over time.
    pub first_aid: bool,
    /// Whether the fortress attack bonus is currently applied.
    pub fortress_buff: bool,
    /// Whether the path speed bonus is currently applied.
    pub path_buff: bool,
    /// Whether the unit is moving.
    pub walking: bool,
    /// Decision engine state carried between ticks.
    pub memory: UnitMemory,
    pub(crate) movement_timer: f32,
    pub(crate) heal_timer: f32,
}

impl Unit {
    /// Create a unit with base stats and no upgrades.
    #[must_use]
    pub fn new(
        id: UnitId,
        team: TeamId,
        kind: UnitKind,
        species: Species,
        position: Vec2,
        stats: UnitStats,
    ) -> Self {
        Self {
            id,
            team,
            kind,
            species,
            position,
            facing: Vec2::UP,
            target: position,
            destination: None,
            speed: stats.speed,
            attack: stats.attack,
            health: Health::new(stats.health),
            carried: None,
            food_mult: 1.0,
            first_aid: false,
            fortress_buff: false,
            path_buff: false,
            walking: false,
            memory: UnitMemory::default(),
            movement_timer: 0.0,
            heal_timer: 0.0,
        }
    }

    /// Whether the unit is carrying food.
    #[must_use]
    pub const fn is_carrying(&self) -> bool {
        self.carried.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classes() {
        assert!(UnitKind::Worker.is_ant());
        assert!(!UnitKind::Worker.is_soldier());
        assert!(UnitKind::SuperSoldier.is_soldier());
        assert!(!UnitKind::Queen.is_ant());
        assert!(!UnitKind::Avatar.is_ant());
    }

    #[test]
    fn test_new_unit_uses_stats() {
        let stats = UnitStats {
            health: 80.0,
            attack: 12,
            speed: 2.0,
        };
        let unit = Unit::new(UnitId(3), 2, UnitKind::Worker, Species::Black, Vec2::new(1.0, 1.0), stats);
        assert_eq!(unit.attack, 12);
        assert!((unit.health.max - 80.0).abs() < f32::EPSILON);
        assert_eq!(unit.target, unit.position);
        assert!(!unit.is_carrying());
        assert_eq!(unit.id.to_string(), "u3");
    }
}
