//! Colonies: the per-team record of food, head counts, upgrades and orders.

use serde::{Deserialize, Serialize};

use crate::config::{EconomyTuning, UnitCosts};
use crate::error::{SimError, SimResult};
use crate::game::{
    Controller, MarkerBoard, Species, StrategicCommand, StrategyPhase, UnitId, UnitKind, Upgrade,
    Vec2,
};

/// Team number, 1 to 4.
pub type TeamId = u8;

/// Maximum number of colonies in a match.
pub const MAX_TEAMS: usize = 4;

/// A colony and everything it owns apart from its units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Colony {
    /// Team number.
    pub team: TeamId,
    /// Species.
    pub species: Species,
    /// Who runs it.
    pub controller: Controller,
    /// Food in store. Can go negative when a player respawns in debt.
    pub food: i32,
    /// Unit prices.
    pub costs: UnitCosts,
    /// Living soldiers and super soldiers.
    pub total_soldiers: u32,
    /// Living workers.
    pub total_workers: u32,
    /// Purchases stop at this many units.
    pub max_colony_size: u32,
    /// Colony-wide order.
    pub command: StrategicCommand,
    /// Where a strategic attack goes.
    pub attack_location: Vec2,
    /// Which rival a strategic attack targets.
    pub attack_target: Option<TeamId>,
    /// Timed strategy phase.
    pub strategy_phase: StrategyPhase,
    /// Purchased upgrades in purchase order.
    pub upgrades: Vec<Upgrade>,
    /// Nest rally point; new units appear here.
    pub spawn_pos: Vec2,
    /// The queen.
    pub queen: UnitId,
    /// The player's avatar.
    pub avatar: Option<UnitId>,
    /// Placed markers.
    pub markers: MarkerBoard,
    /// False once eliminated.
    pub alive: bool,
    /// Fortress aura and queen regeneration.
    pub fortress: bool,
    /// Passive income from aphids.
    pub aphid_farming: bool,
    /// Last stand is armed and has not fired.
    pub last_stand: bool,
    /// Super soldiers can be bought.
    pub super_soldiers: bool,
    pub(crate) income_timer: f32,
    pub(crate) heal_timer: f32,
    pub(crate) initial_wave_done: bool,
}

impl Colony {
    /// A fresh colony with starting food and no units.
    #[must_use]
    pub fn new(
        team: TeamId,
        species: Species,
        controller: Controller,
        spawn_pos: Vec2,
        queen: UnitId,
        tuning: &EconomyTuning,
    ) -> Self {
        Self {
            team,
            species,
            controller,
            food: tuning.starting_food,
            costs: tuning.costs,
            total_soldiers: 0,
            total_workers: 0,
            max_colony_size: tuning.max_colony_size,
            command: StrategicCommand::None,
            attack_location: spawn_pos,
            attack_target: None,
            strategy_phase: StrategyPhase::Idle,
            upgrades: Vec::new(),
            spawn_pos,
            queen,
            avatar: None,
            markers: MarkerBoard::new(team),
            alive: true,
            fortress: false,
            aphid_farming: false,
            last_stand: false,
            super_soldiers: false,
            income_timer: 0.0,
            heal_timer: 0.0,
            initial_wave_done: false,
        }
    }

    /// Living ants.
    #[must_use]
    pub const fn colony_size(&self) -> u32 {
        self.total_soldiers.saturating_add(self.total_workers)
    }

    /// Army strength: soldiers count double their price, workers their price.
    #[must_use]
    pub fn strength(&self) -> i64 {
        i64::from(self.costs.soldier) * 2 * i64::from(self.total_soldiers)
            + i64::from(self.costs.worker) * i64::from(self.total_workers)
    }

    /// Whether `kind` is on sale for this colony.
    #[must_use]
    pub const fn sells(&self, kind: UnitKind) -> bool {
        match kind {
            UnitKind::Worker | UnitKind::Soldier => true,
            UnitKind::SuperSoldier => self.super_soldiers,
            UnitKind::Queen | UnitKind::Avatar => false,
        }
    }

    /// Buy one unit of `kind`: deduct its price and count it.
    ///
    /// # Errors
    ///
    /// Fails without side effects if the kind is not on sale, the colony is
    /// full, or food is short.
    pub fn try_purchase(&mut self, kind: UnitKind) -> SimResult<()> {
        let cost = match self.costs.of(kind) {
            Some(cost) if self.sells(kind) => cost,
            _ => return Err(SimError::NotPurchasable(kind)),
        };
        if self.colony_size() >= self.max_colony_size {
            return Err(SimError::ColonyFull {
                max: self.max_colony_size,
            });
        }
        if self.food < cost {
            return Err(SimError::InsufficientFood {
                needed: cost,
                available: self.food,
            });
        }
        self.food -= cost;
        self.record_birth(kind);
        Ok(())
    }

    /// Count a unit that joined without being bought.
    pub fn record_birth(&mut self, kind: UnitKind) {
        match kind {
            UnitKind::Worker => self.total_workers += 1,
            UnitKind::Soldier | UnitKind::SuperSoldier => self.total_soldiers += 1,
            UnitKind::Queen | UnitKind::Avatar => {}
        }
    }

    /// Stop counting a unit that died.
    pub fn record_loss(&mut self, kind: UnitKind) {
        match kind {
            UnitKind::Worker => self.total_workers = self.total_workers.saturating_sub(1),
            UnitKind::Soldier | UnitKind::SuperSoldier => {
                self.total_soldiers = self.total_soldiers.saturating_sub(1);
            }
            UnitKind::Queen | UnitKind::Avatar => {}
        }
    }

    /// Record an upgrade and switch on its colony-level effects.
    pub fn apply_upgrade(&mut self, upgrade: Upgrade, tuning: &EconomyTuning) {
        if !self.upgrades.contains(&upgrade) {
            self.upgrades.push(upgrade);
        }
        match upgrade {
            Upgrade::ColonyCapacity => self.max_colony_size += tuning.capacity_bonus,
            Upgrade::Fortress => self.fortress = true,
            Upgrade::AphidFarming => self.aphid_farming = true,
            Upgrade::LastStand => self.last_stand = true,
            Upgrade::SuperSoldiers => self.super_soldiers = true,
            _ => {}
        }
    }

    /// Whether the colony has this upgrade.
    #[must_use]
    pub fn has_upgrade(&self, upgrade: Upgrade) -> bool {
        self.upgrades.contains(&upgrade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colony(species: Species) -> Colony {
        Colony::new(1, species, Controller::Player, Vec2::ZERO, UnitId(0), &EconomyTuning::default())
    }

    #[test]
    fn test_purchase_deducts_and_counts() {
        let mut c = colony(Species::Black);
        c.try_purchase(UnitKind::Soldier).unwrap();
        assert_eq!(c.food, 50);
        assert_eq!(c.total_soldiers, 1);
        assert!(matches!(
            c.try_purchase(UnitKind::SuperSoldier),
            Err(SimError::NotPurchasable(UnitKind::SuperSoldier))
        ));
        c.try_purchase(UnitKind::Soldier).unwrap();
        assert!(matches!(
            c.try_purchase(UnitKind::Worker),
            Err(SimError::InsufficientFood { needed: 25, available: 0 })
        ));
        assert_eq!(c.colony_size(), 2);
    }

    #[test]
    fn test_purchase_respects_cap() {
        let mut c = colony(Species::Black);
        c.max_colony_size = 1;
        c.try_purchase(UnitKind::Worker).unwrap();
        assert!(matches!(c.try_purchase(UnitKind::Worker), Err(SimError::ColonyFull { max: 1 })));
        assert_eq!(c.food, 75);
    }

    #[test]
    fn test_strength() {
        let mut c = colony(Species::Fire);
        c.total_soldiers = 3;
        c.total_workers = 4;
        assert_eq!(c.strength(), 50 * 2 * 3 + 25 * 4);
    }

    #[test]
    fn test_loss_saturates() {
        let mut c = colony(Species::Fire);
        c.record_loss(UnitKind::Worker);
        assert_eq!(c.total_workers, 0);
        c.record_birth(UnitKind::SuperSoldier);
        c.record_loss(UnitKind::SuperSoldier);
        assert_eq!(c.total_soldiers, 0);
    }

    #[test]
    fn test_colony_upgrades() {
        let tuning = EconomyTuning::default();
        let mut c = colony(Species::Black);
        c.apply_upgrade(Upgrade::ColonyCapacity, &tuning);
        assert_eq!(c.max_colony_size, 60);
        let mut f = colony(Species::Fire);
        f.apply_upgrade(Upgrade::SuperSoldiers, &tuning);
        assert!(f.sells(UnitKind::SuperSoldier));
        assert!(f.has_upgrade(Upgrade::SuperSoldiers));
    }
}
