//! Health and damage.
//!
//! Damage and healing share one entry point: positive amounts hurt, negative
//! amounts heal. Death fires exactly once per life no matter how many hits
//! or replicated health updates arrive after health reaches zero; only an
//! explicit [`Health::restore`] re-arms it.

use serde::{Deserialize, Serialize};

use crate::game::{TeamId, Unit, UnitKind};

/// What a health change did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Health changed and the unit lives on.
    Survived,
    /// This change killed the unit. Death handling must run now.
    Died,
    /// The unit was already dead; nothing happened.
    AlreadyDead,
    /// No such unit.
    Missing,
}

/// Current and maximum health with a death latch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current health.
    pub current: f32,
    /// Maximum health.
    pub max: f32,
    /// Set when death handling has run for this life.
    pub already_dead: bool,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            already_dead: false,
        }
    }

    /// Fraction of maximum health remaining.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    /// Whether health is below the maximum.
    #[must_use]
    pub fn is_wounded(&self) -> bool {
        self.current < self.max
    }

    /// Apply `amount` of damage; negative amounts heal, capped at the maximum.
    pub fn apply(&mut self, amount: f32) -> DamageOutcome {
        if self.already_dead {
            return DamageOutcome::AlreadyDead;
        }
        let next = self.current - amount;
        self.current = if next > self.max { self.max } else { next };
        self.check_death()
    }

    /// Overwrite health with a replicated absolute value.
    pub fn sync(&mut self, value: f32) -> DamageOutcome {
        if self.already_dead && value <= 0.0 {
            return DamageOutcome::AlreadyDead;
        }
        self.current = value.min(self.max);
        self.check_death()
    }

    /// Back to full health, re-arming death handling.
    pub fn restore(&mut self) {
        self.current = self.max;
        self.already_dead = false;
    }

    fn check_death(&mut self) -> DamageOutcome {
        if self.current <= 0.0 && !self.already_dead {
            self.already_dead = true;
            DamageOutcome::Died
        } else {
            DamageOutcome::Survived
        }
    }
}

/// How a death must be handled, decided by what died.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatality {
    /// An ant died: drop its food, update the colony counters, remove it.
    Ant {
        /// Owning team.
        team: TeamId,
        /// Ant kind, for the counters.
        kind: UnitKind,
    },
    /// A queen died: the colony is eliminated.
    Queen {
        /// Owning team.
        team: TeamId,
    },
    /// A player died: respawn if the colony can pay, else eliminate.
    Avatar {
        /// Owning team.
        team: TeamId,
    },
}

impl Fatality {
    /// Classify a dead unit.
    #[must_use]
    pub const fn of(unit: &Unit) -> Self {
        match unit.kind {
            UnitKind::Queen => Self::Queen { team: unit.team },
            UnitKind::Avatar => Self::Avatar { team: unit.team },
            kind => Self::Ant {
                team: unit.team,
                kind,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_reduces_health() {
        let mut health = Health::new(100.0);
        assert_eq!(health.apply(30.0), DamageOutcome::Survived);
        assert!((health.current - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut health = Health::new(100.0);
        health.apply(10.0);
        health.apply(-50.0);
        assert!((health.current - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_death_fires_once() {
        let mut health = Health::new(10.0);
        assert_eq!(health.apply(10.0), DamageOutcome::Died);
        assert_eq!(health.apply(5.0), DamageOutcome::AlreadyDead);
        assert_eq!(health.sync(0.0), DamageOutcome::AlreadyDead);
        assert_eq!(health.sync(-3.0), DamageOutcome::AlreadyDead);
    }

    #[test]
    fn test_sync_can_kill() {
        let mut health = Health::new(10.0);
        assert_eq!(health.sync(0.0), DamageOutcome::Died);
        assert!(health.already_dead);
    }

    #[test]
    fn test_restore_rearms_death() {
        let mut health = Health::new(10.0);
        health.apply(20.0);
        health.restore();
        assert!(!health.already_dead);
        assert_eq!(health.apply(10.0), DamageOutcome::Died);
    }

    #[test]
    fn test_fraction() {
        let mut health = Health::new(200.0);
        health.apply(50.0);
        assert!((health.fraction() - 0.75).abs() < f32::EPSILON);
        assert!(health.is_wounded());
    }
}
