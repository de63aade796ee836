//! World invariants: sanity checks that detect bugs.
//!
//! These should never trigger in a correct simulation. Integration tests and
//! the `validate` command run them after every tick.

use std::collections::BTreeMap;
use std::fmt;

use crate::game::{FoodId, TeamId, UnitId, UnitKind, World};

/// A violated invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check every world invariant. Returns the violations found, if any.
#[must_use]
pub fn check_invariants(world: &World) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    check_head_counts(world, &mut violations);
    check_carrying(world, &mut violations);
    check_health(world, &mut violations);
    check_colonies(world, &mut violations);
    violations
}

/// Colony counters match the ants on the field.
fn check_head_counts(world: &World, violations: &mut Vec<InvariantViolation>) {
    let mut counts: BTreeMap<TeamId, (u32, u32)> = BTreeMap::new();
    for unit in world.units() {
        let entry = counts.entry(unit.team).or_default();
        match unit.kind {
            UnitKind::Worker => entry.0 += 1,
            UnitKind::Soldier | UnitKind::SuperSoldier => entry.1 += 1,
            UnitKind::Queen | UnitKind::Avatar => {}
        }
    }
    for colony in world.colonies().filter(|c| c.alive) {
        let (workers, soldiers) = counts.get(&colony.team).copied().unwrap_or_default();
        if workers != colony.total_workers || soldiers != colony.total_soldiers {
            violations.push(violation(format!(
                "team {} counts {}w/{}s but fields {}w/{}s",
                colony.team, colony.total_workers, colony.total_soldiers, workers, soldiers
            )));
        }
    }
}

/// Each pellet has at most one carrier, and carried flags agree with carriers.
fn check_carrying(world: &World, violations: &mut Vec<InvariantViolation>) {
    let mut carriers: BTreeMap<FoodId, UnitId> = BTreeMap::new();
    for unit in world.units() {
        let Some(food) = unit.carried else {
            continue;
        };
        if let Some(other) = carriers.insert(food, unit.id) {
            violations.push(violation(format!("{food} carried by both {other} and {}", unit.id)));
        }
        match world.food(food) {
            Some(pellet) if pellet.carried => {}
            Some(_) => violations.push(violation(format!("{food} carried by {} but flagged free", unit.id))),
            None => violations.push(violation(format!("{} carries missing {food}", unit.id))),
        }
    }
    for pellet in world.foods().filter(|p| p.carried) {
        if !carriers.contains_key(&pellet.id) {
            violations.push(violation(format!("{} flagged carried with no carrier", pellet.id)));
        }
    }
}

fn check_health(world: &World, violations: &mut Vec<InvariantViolation>) {
    for unit in world.units() {
        let health = unit.health;
        if health.current > health.max {
            violations.push(violation(format!(
                "{} has {} health over a max of {}",
                unit.id, health.current, health.max
            )));
        }
        if health.already_dead && unit.kind.is_ant() {
            violations.push(violation(format!("dead {} still on the field", unit.id)));
        }
    }
}

/// Eliminated colonies have no queen, avatar or markers.
fn check_colonies(world: &World, violations: &mut Vec<InvariantViolation>) {
    for colony in world.colonies().filter(|c| !c.alive) {
        if world.unit(colony.queen).is_some() {
            violations.push(violation(format!("eliminated team {} still has a queen", colony.team)));
        }
        if colony.avatar.is_some() {
            violations.push(violation(format!("eliminated team {} still has a player", colony.team)));
        }
        if !colony.markers.markers().is_empty() {
            violations.push(violation(format!("eliminated team {} still has markers", colony.team)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::game::{ColonySetup, Controller, Discard, Species, Vec2};

    fn world() -> World {
        let mut world = World::new(3, Rules::default(), 0.05);
        let mut setup = ColonySetup::new(1, Species::Black, Controller::Scripted, Vec2::ZERO);
        setup.workers = 2;
        world.add_colony(&setup, &mut Discard).unwrap();
        world
    }

    #[test]
    fn test_fresh_world_is_clean() {
        assert!(check_invariants(&world()).is_empty());
    }

    #[test]
    fn test_detects_counter_drift() {
        let mut w = world();
        w.colonies.get_mut(&1).unwrap().total_workers = 5;
        let violations = check_invariants(&w);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("team 1"));
    }

    #[test]
    fn test_detects_double_carry() {
        let mut w = world();
        let food = w.spawn_food(Vec2::ZERO);
        w.foods.get_mut(&food).unwrap().carried = true;
        for unit in w.units.values_mut().filter(|u| u.kind == UnitKind::Worker) {
            unit.carried = Some(food);
        }
        let violations = check_invariants(&w);
        assert!(violations.iter().any(|v| v.message.contains("carried by both")));
    }

    #[test]
    fn test_detects_orphaned_pellet_flag() {
        let mut w = world();
        let food = w.spawn_food(Vec2::ZERO);
        w.foods.get_mut(&food).unwrap().carried = true;
        assert_eq!(check_invariants(&w).len(), 1);
    }
}
