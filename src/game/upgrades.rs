//! Colony upgrades.
//!
//! Each species has three tiers of two upgrades. A colony picks one upgrade
//! per tier and must own a tier before buying the next. Unit-level effects are
//! applied to every living unit at purchase and to every unit spawned later.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{Species, Unit, UnitKind};

/// A purchasable upgrade. Serialized by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Upgrade {
    /// Black tier 1: all units move 15% faster.
    #[serde(rename = "Movement Speed")]
    MovementSpeed,
    /// Black tier 1: delivered food is worth 30% more.
    #[serde(rename = "Less Food Waste")]
    LessFoodWaste,
    /// Black tier 2: soldiers hit 20% harder.
    #[serde(rename = "Stronger Soldiers")]
    StrongerSoldiers,
    /// Black tier 2: ten more units fit in the colony.
    #[serde(rename = "Colony Capacity")]
    ColonyCapacity,
    /// Black tier 3: units near the queen hit harder and the queen regenerates.
    #[serde(rename = "Fortress")]
    Fortress,
    /// Black tier 3: soldiers regenerate.
    #[serde(rename = "First Aid")]
    FirstAid,
    /// Fire tier 1: all units move 20% faster.
    #[serde(rename = "Rapid Movement")]
    RapidMovement,
    /// Fire tier 1: passive income for a player colony.
    #[serde(rename = "Aphid Farming")]
    AphidFarming,
    /// Fire tier 2: all units hit 20% harder.
    #[serde(rename = "Long Stingers")]
    LongStingers,
    /// Fire tier 2: workers hit harder and move faster.
    #[serde(rename = "Aggressive Workers")]
    AggressiveWorkers,
    /// Fire tier 3: a wounded queen summons a burst of soldiers once.
    #[serde(rename = "Last Stand")]
    LastStand,
    /// Fire tier 3: super soldiers become purchasable.
    #[serde(rename = "Super Soldiers")]
    SuperSoldiers,
}

impl Upgrade {
    /// Every upgrade.
    pub const ALL: [Self; 12] = [
        Self::MovementSpeed,
        Self::LessFoodWaste,
        Self::StrongerSoldiers,
        Self::ColonyCapacity,
        Self::Fortress,
        Self::FirstAid,
        Self::RapidMovement,
        Self::AphidFarming,
        Self::LongStingers,
        Self::AggressiveWorkers,
        Self::LastStand,
        Self::SuperSoldiers,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MovementSpeed => "Movement Speed",
            Self::LessFoodWaste => "Less Food Waste",
            Self::StrongerSoldiers => "Stronger Soldiers",
            Self::ColonyCapacity => "Colony Capacity",
            Self::Fortress => "Fortress",
            Self::FirstAid => "First Aid",
            Self::RapidMovement => "Rapid Movement",
            Self::AphidFarming => "Aphid Farming",
            Self::LongStingers => "Long Stingers",
            Self::AggressiveWorkers => "Aggressive Workers",
            Self::LastStand => "Last Stand",
            Self::SuperSoldiers => "Super Soldiers",
        }
    }

    /// Look an upgrade up by display name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|u| u.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Species that can buy it.
    #[must_use]
    pub const fn species(self) -> Species {
        match self {
            Self::MovementSpeed
            | Self::LessFoodWaste
            | Self::StrongerSoldiers
            | Self::ColonyCapacity
            | Self::Fortress
            | Self::FirstAid => Species::Black,
            _ => Species::Fire,
        }
    }

    /// Tier, 1 to 3.
    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::MovementSpeed | Self::LessFoodWaste | Self::RapidMovement | Self::AphidFarming => 1,
            Self::StrongerSoldiers
            | Self::ColonyCapacity
            | Self::LongStingers
            | Self::AggressiveWorkers => 2,
            _ => 3,
        }
    }

    /// Food price.
    #[must_use]
    pub const fn cost(self) -> i32 {
        match self.tier() {
            1 => 50,
            2 => 100,
            _ => 200,
        }
    }

    /// Apply the per-unit part of the upgrade to `unit`. Queens are unaffected.
    pub fn apply_to_unit(self, unit: &mut Unit) {
        if unit.kind == UnitKind::Queen {
            return;
        }
        match self {
            Self::MovementSpeed => unit.speed *= 1.15,
            Self::RapidMovement => unit.speed *= 1.2,
            Self::LessFoodWaste => unit.food_mult = 1.3,
            Self::LongStingers => unit.attack = scale_attack(unit.attack, 1.2),
            Self::StrongerSoldiers if unit.kind.is_soldier() => {
                unit.attack = scale_attack(unit.attack, 1.2);
            }
            Self::FirstAid if unit.kind.is_soldier() => unit.first_aid = true,
            Self::AggressiveWorkers if unit.kind == UnitKind::Worker => {
                unit.attack = scale_attack(unit.attack, 1.1);
                unit.speed *= 1.1;
            }
            _ => {}
        }
    }
}

impl fmt::Display for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scale an attack value, rounding halves to even.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn scale_attack(attack: i32, factor: f32) -> i32 {
    (attack as f32 * factor).round_ties_even() as i32
}

/// Why `upgrade` cannot be added to `owned`, or `None` if it can.
#[must_use]
pub fn purchase_blocker(upgrade: Upgrade, species: Species, owned: &[Upgrade]) -> Option<&'static str> {
    if upgrade.species() != species {
        return Some("belongs to the other species");
    }
    if owned.contains(&upgrade) {
        return Some("already owned");
    }
    if owned.iter().any(|u| u.tier() == upgrade.tier()) {
        return Some("tier already chosen");
    }
    if upgrade.tier() > 1 && !owned.iter().any(|u| u.tier() == upgrade.tier() - 1) {
        return Some("previous tier not owned");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnitStatsTable;
    use crate::game::{UnitId, Vec2};

    fn unit(kind: UnitKind) -> Unit {
        let stats = UnitStatsTable::default().for_kind(kind);
        Unit::new(UnitId(1), 1, kind, Species::Black, Vec2::ZERO, stats)
    }

    #[test]
    fn test_names_round_trip() {
        for upgrade in Upgrade::ALL {
            assert_eq!(Upgrade::from_name(upgrade.name()), Some(upgrade));
        }
        assert_eq!(Upgrade::from_name("long stingers"), Some(Upgrade::LongStingers));
        assert_eq!(Upgrade::from_name("Laser Eyes"), None);
    }

    #[test]
    fn test_serializes_by_name() {
        let json = serde_json::to_string(&Upgrade::AphidFarming).unwrap();
        assert_eq!(json, "\"Aphid Farming\"");
    }

    #[test]
    fn test_each_species_has_two_per_tier() {
        for species in [Species::Black, Species::Fire] {
            for tier in 1..=3 {
                let count = Upgrade::ALL
                    .iter()
                    .filter(|u| u.species() == species && u.tier() == tier)
                    .count();
                assert_eq!(count, 2);
            }
        }
    }

    #[test]
    fn test_tier_ordering_enforced() {
        let black = Species::Black;
        assert_eq!(purchase_blocker(Upgrade::MovementSpeed, black, &[]), None);
        assert!(purchase_blocker(Upgrade::Fortress, black, &[]).is_some());
        assert!(purchase_blocker(Upgrade::RapidMovement, black, &[]).is_some());
        let owned = [Upgrade::LessFoodWaste];
        assert!(purchase_blocker(Upgrade::MovementSpeed, black, &owned).is_some());
        assert_eq!(purchase_blocker(Upgrade::ColonyCapacity, black, &owned), None);
    }

    #[test]
    fn test_stronger_soldiers_skips_workers() {
        let mut worker = unit(UnitKind::Worker);
        let mut soldier = unit(UnitKind::Soldier);
        Upgrade::StrongerSoldiers.apply_to_unit(&mut worker);
        Upgrade::StrongerSoldiers.apply_to_unit(&mut soldier);
        assert_eq!(worker.attack, 10);
        assert_eq!(soldier.attack, 36);
    }

    #[test]
    fn test_aggressive_workers() {
        let mut worker = unit(UnitKind::Worker);
        let speed = worker.speed;
        Upgrade::AggressiveWorkers.apply_to_unit(&mut worker);
        assert_eq!(worker.attack, 11);
        assert!((worker.speed - speed * 1.1).abs() < 1e-4);
    }

    #[test]
    fn test_queen_unaffected() {
        let mut queen = unit(UnitKind::Queen);
        let before = queen.clone();
        Upgrade::LongStingers.apply_to_unit(&mut queen);
        Upgrade::MovementSpeed.apply_to_unit(&mut queen);
        assert_eq!(queen, before);
    }

    #[test]
    fn test_less_food_waste_sets_multiplier() {
        let mut worker = unit(UnitKind::Worker);
        Upgrade::LessFoodWaste.apply_to_unit(&mut worker);
        assert!((worker.food_mult - 1.3).abs() < f32::EPSILON);
    }
}
