//! Authority broadcasts and mirror application.
//!
//! In a networked match one participant, the authority, runs the simulation.
//! Every state change it makes is recorded as a [`StateEvent`] and sent down a
//! reliable ordered [`BroadcastChannel`]. Other participants hold mirrors that
//! apply those events with [`World::apply_event`].
//!
//! Delivery may repeat events, so applying one must be idempotent: a second
//! lethal `HealthSync` finds the unit already gone, a second `FoodDeposited`
//! finds the pellet gone, and so on. Positions are not replicated; the
//! transport moves bodies on its own.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::{
    DamageOutcome, EffectsSink, FoodId, FoodPellet, Marker, MarkerId, StrategicCommand, TeamId, Unit,
    UnitId, UnitKind, Upgrade, Vec2, World,
};

/// An authoritative state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StateEvent {
    /// A unit joined the field.
    UnitSpawned {
        /// The new unit as spawned.
        unit: Box<Unit>,
    },
    /// A unit left the field without dying.
    UnitRemoved {
        /// Which one.
        unit: UnitId,
    },
    /// A unit's health changed. Zero or less means it died.
    HealthSync {
        /// Which one.
        unit: UnitId,
        /// Its new health.
        health: f32,
    },
    /// A pellet appeared.
    FoodSpawned {
        /// The pellet.
        pellet: FoodPellet,
    },
    /// A pellet was picked up, or dropped when `carrier` is `None`.
    FoodCarried {
        /// Which pellet.
        food: FoodId,
        /// Who now carries it.
        carrier: Option<UnitId>,
        /// Where it is.
        position: Vec2,
    },
    /// A pellet was delivered to a queen and consumed.
    FoodDeposited {
        /// Which pellet.
        food: FoodId,
        /// Who delivered it.
        carrier: UnitId,
    },
    /// A colony's food store, as an absolute value.
    FoodBalance {
        /// Which colony.
        team: TeamId,
        /// Food in store.
        food: i32,
    },
    /// A colony's strategic order changed.
    CommandChanged {
        /// Which colony.
        team: TeamId,
        /// New order.
        command: StrategicCommand,
        /// Where attacks go.
        attack_location: Vec2,
    },
    /// A marker was placed.
    MarkerPlaced {
        /// The marker.
        marker: Marker,
    },
    /// A marker was taken down.
    MarkerRemoved {
        /// Owning colony.
        team: TeamId,
        /// Which marker.
        marker: MarkerId,
    },
    /// A colony bought an upgrade.
    UpgradeApplied {
        /// Which colony.
        team: TeamId,
        /// What it bought.
        upgrade: Upgrade,
    },
    /// A colony is out.
    ColonyEliminated {
        /// Which colony.
        team: TeamId,
    },
}

/// Reliable ordered delivery to every participant.
pub trait BroadcastChannel {
    /// Queue `event` for delivery.
    fn send(&mut self, event: StateEvent);
}

impl BroadcastChannel for Vec<StateEvent> {
    fn send(&mut self, event: StateEvent) {
        self.push(event);
    }
}

impl BroadcastChannel for Sender<StateEvent> {
    fn send(&mut self, event: StateEvent) {
        if Sender::send(self, event).is_err() {
            debug!("broadcast receiver gone");
        }
    }
}

impl World {
    /// Apply an authoritative event to this mirror. Repeats are no-ops.
    pub fn apply_event(&mut self, event: &StateEvent, effects: &mut dyn EffectsSink) {
        match event {
            StateEvent::UnitSpawned { unit } => self.mirror_spawn(unit),
            StateEvent::UnitRemoved { unit } => self.remove_unit(*unit, effects),
            StateEvent::HealthSync { unit, health } => {
                let Some(body) = self.units.get_mut(unit) else {
                    return;
                };
                if body.health.sync(*health) == DamageOutcome::Died {
                    self.handle_death(*unit, effects);
                }
            }
            StateEvent::FoodSpawned { pellet } => {
                self.next_food = self.next_food.max(pellet.id.0 + 1);
                self.foods.entry(pellet.id).or_insert(*pellet);
            }
            StateEvent::FoodCarried {
                food,
                carrier,
                position,
            } => self.mirror_carry(*food, *carrier, *position),
            StateEvent::FoodDeposited { food, carrier } => {
                if let Some(unit) = self.units.get_mut(carrier) {
                    if unit.carried == Some(*food) {
                        unit.carried = None;
                    }
                }
                self.foods.remove(food);
            }
            StateEvent::FoodBalance { team, food } => {
                if let Some(colony) = self.colonies.get_mut(team) {
                    colony.food = *food;
                }
            }
            StateEvent::CommandChanged {
                team,
                command,
                attack_location,
            } => {
                if let Some(colony) = self.colonies.get_mut(team) {
                    colony.command = *command;
                    colony.attack_location = *attack_location;
                }
            }
            StateEvent::MarkerPlaced { marker } => {
                if let Some(colony) = self.colonies.get_mut(&marker.team) {
                    colony.markers.insert_replicated(*marker);
                }
            }
            StateEvent::MarkerRemoved { team, marker } => {
                if let Some(colony) = self.colonies.get_mut(team) {
                    colony.markers.remove_replicated(*marker);
                }
            }
            StateEvent::UpgradeApplied { team, upgrade } => self.grant_upgrade(*team, *upgrade),
            StateEvent::ColonyEliminated { team } => self.eliminate(*team, effects),
        }
    }

    fn mirror_spawn(&mut self, unit: &Unit) {
        self.next_unit = self.next_unit.max(unit.id.0 + 1);
        if self.units.contains_key(&unit.id) {
            return;
        }
        let Some(colony) = self.colonies.get_mut(&unit.team) else {
            return;
        };
        if !colony.alive {
            return;
        }
        colony.record_birth(unit.kind);
        if unit.kind == UnitKind::Avatar {
            colony.avatar = Some(unit.id);
        }
        self.units.insert(unit.id, unit.clone());
    }

    fn mirror_carry(&mut self, food: FoodId, carrier: Option<UnitId>, position: Vec2) {
        for unit in self.units.values_mut() {
            if unit.carried == Some(food) && Some(unit.id) != carrier {
                unit.carried = None;
            }
        }
        if let Some(id) = carrier {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.carried = Some(food);
            }
        }
        if let Some(pellet) = self.foods.get_mut(&food) {
            pellet.carried = carrier.is_some();
            pellet.position = position;
        }
    }
}
