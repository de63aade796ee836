//! World state and the tick loop.
//!
//! A tick runs in fixed phases:
//!
//! 1. Deferred attack events that fell due are resolved.
//! 2. Colonies act in team order: income, opening wave, AI purchases,
//!    strategy, queen upkeep.
//! 3. Food spawners drop pellets.
//! 4. Ants decide in parallel, then their actions and movement are applied
//!    one at a time in id order. Avatars walk toward their targets.
//! 5. The outcome is checked.
//!
//! Every random draw comes from the world's seeded stream or from a per-unit
//! stream derived from (seed, tick, unit), so a match is a pure function of
//! its seed and inputs regardless of thread scheduling.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{DecisionTuning, Rules};
use crate::error::{SimError, SimResult};
use crate::game::{
    Action, Colony, Controller, DamageOutcome, Decision, Effect, EffectsSink, Fatality, FoodId,
    FoodPellet, FoodSpawner, Health, MAX_TEAMS, Marker, MarkerSighting, Navigator, NoOrders,
    OrderSource, Perception, PlayerAction, RivalView, Scheduled, Scheduler, Sighting, Species,
    StrategicCommand, Steer, StraightLine, TeamId, Unit, UnitId, UnitKind, UnitMemory, Upgrade,
    Vec2, decide, delivered_amount, economy, purchase_blocker, steer, strategy, update_path_buff,
};
use crate::net::{BroadcastChannel, StateEvent};

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// One colony outlasted or outgrew the rest.
    Victory(TeamId),
    /// Nobody won.
    Draw,
}

impl MatchOutcome {
    /// The winning team, if any.
    #[must_use]
    pub const fn winner(self) -> Option<TeamId> {
        match self {
            Self::Victory(team) => Some(team),
            Self::Draw => None,
        }
    }
}

/// A colony's elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    /// Who was eliminated.
    pub team: TeamId,
    /// On which tick.
    pub tick: u64,
}

/// Everything needed to put a colony on the field.
#[derive(Debug, Clone, PartialEq)]
pub struct ColonySetup {
    /// Team number.
    pub team: TeamId,
    /// Species.
    pub species: Species,
    /// Who runs it.
    pub controller: Controller,
    /// Nest rally point.
    pub spawn_pos: Vec2,
    /// Where the queen sits.
    pub queen_pos: Vec2,
    /// Starting food, if not the rules default.
    pub food: Option<i32>,
    /// Workers already alive.
    pub workers: u32,
    /// Soldiers already alive.
    pub soldiers: u32,
    /// Size cap before upgrades, if not the rules default.
    pub max_colony_size: Option<u32>,
    /// Colony-wide order.
    pub command: StrategicCommand,
    /// Upgrades already owned.
    pub upgrades: Vec<Upgrade>,
    /// Queen health, if not full.
    pub queen_health: Option<f32>,
}

impl ColonySetup {
    /// A fresh colony with defaults for everything optional.
    #[must_use]
    pub const fn new(team: TeamId, species: Species, controller: Controller, spawn_pos: Vec2) -> Self {
        Self {
            team,
            species,
            controller,
            spawn_pos,
            queen_pos: spawn_pos,
            food: None,
            workers: 0,
            soldiers: 0,
            max_colony_size: None,
            command: StrategicCommand::None,
            upgrades: Vec::new(),
            queen_health: None,
        }
    }
}

/// A planned decision for one ant, produced in parallel.
struct Plan {
    memory: UnitMemory,
    marker: Option<MarkerSighting>,
    decision: Decision,
}

/// The whole simulation.
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) rules: Rules,
    pub(crate) tick_seconds: f32,
    pub(crate) tick: u64,
    pub(crate) time: f32,
    pub(crate) seed: u64,
    pub(crate) rng: StdRng,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) foods: BTreeMap<FoodId, FoodPellet>,
    pub(crate) colonies: BTreeMap<TeamId, Colony>,
    pub(crate) spawners: Vec<FoodSpawner>,
    pub(crate) scheduler: Scheduler,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) next_unit: u32,
    pub(crate) next_food: u32,
    pub(crate) outbox: Option<Vec<StateEvent>>,
    pub(crate) eliminations: Vec<Elimination>,
    pub(crate) outcome: Option<MatchOutcome>,
}

impl World {
    /// An empty world.
    #[must_use]
    pub fn new(seed: u64, rules: Rules, tick_seconds: f32) -> Self {
        Self {
            rules,
            tick_seconds,
            tick: 0,
            time: 0.0,
            seed,
            rng: StdRng::seed_from_u64(seed),
            units: BTreeMap::new(),
            foods: BTreeMap::new(),
            colonies: BTreeMap::new(),
            spawners: Vec::new(),
            scheduler: Scheduler::new(),
            navigator: Arc::new(StraightLine),
            next_unit: 0,
            next_food: 0,
            outbox: None,
            eliminations: Vec::new(),
            outcome: None,
        }
    }

    /// Replace the navigator.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// The rules in force.
    #[must_use]
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Seconds per tick.
    #[must_use]
    pub const fn tick_seconds(&self) -> f32 {
        self.tick_seconds
    }

    /// The match seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// A unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// A pellet by id.
    #[must_use]
    pub fn food(&self, id: FoodId) -> Option<&FoodPellet> {
        self.foods.get(&id)
    }

    /// All pellets in id order.
    pub fn foods(&self) -> impl Iterator<Item = &FoodPellet> {
        self.foods.values()
    }

    /// A colony by team.
    #[must_use]
    pub fn colony(&self, team: TeamId) -> Option<&Colony> {
        self.colonies.get(&team)
    }

    /// All colonies in team order, eliminated ones included.
    pub fn colonies(&self) -> impl Iterator<Item = &Colony> {
        self.colonies.values()
    }

    /// Teams still in the match.
    #[must_use]
    pub fn living_teams(&self) -> Vec<TeamId> {
        self.colonies
            .values()
            .filter(|c| c.alive)
            .map(|c| c.team)
            .collect()
    }

    /// Eliminations so far, in order.
    #[must_use]
    pub fn eliminations(&self) -> &[Elimination] {
        &self.eliminations
    }

    /// The outcome, once decided by elimination.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Health of a team's queen.
    #[must_use]
    pub fn queen_health(&self, team: TeamId) -> Option<Health> {
        let colony = self.colonies.get(&team)?;
        self.units.get(&colony.queen).map(|q| q.health)
    }

    /// Deferred events waiting to fire.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    /// The outcome by strength, used when the tick limit is reached: the
    /// strongest living colony wins and ties are a draw.
    #[must_use]
    pub fn outcome_by_strength(&self) -> MatchOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        let mut best: Option<(i64, TeamId)> = None;
        let mut tied = false;
        for colony in self.colonies.values().filter(|c| c.alive) {
            let strength = colony.strength();
            match best {
                Some((top, _)) if strength < top => {}
                Some((top, _)) if strength == top => tied = true,
                _ => {
                    best = Some((strength, colony.team));
                    tied = false;
                }
            }
        }
        match best {
            Some((_, team)) if !tied => MatchOutcome::Victory(team),
            _ => MatchOutcome::Draw,
        }
    }

    /// Digest of the simulation state, for determinism checks.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hash = Fnv::new();
        hash.write(self.tick);
        for unit in self.units.values() {
            hash.write(u64::from(unit.id.0));
            hash.write(u64::from(unit.position.x.to_bits()));
            hash.write(u64::from(unit.position.y.to_bits()));
            hash.write(u64::from(unit.health.current.to_bits()));
        }
        for pellet in self.foods.values() {
            hash.write(u64::from(pellet.id.0));
            hash.write(u64::from(pellet.carried));
        }
        for colony in self.colonies.values() {
            hash.write(u64::from(colony.team));
            hash.write(u64::from(colony.food.unsigned_abs()));
            hash.write(u64::from(colony.food < 0));
            hash.write(u64::from(colony.colony_size()));
        }
        hash.finish()
    }

    // ---- setup ----

    /// Put a colony, its queen, its avatar and any starting ants on the field.
    ///
    /// # Errors
    ///
    /// Fails if the team number is outside 1..=4 or already taken, or if the
    /// starting ants do not fit under the colony's size cap.
    pub fn add_colony(
        &mut self,
        setup: &ColonySetup,
        effects: &mut dyn EffectsSink,
    ) -> SimResult<TeamId> {
        let team = setup.team;
        if team == 0 || usize::from(team) > MAX_TEAMS {
            return Err(SimError::InvalidTeam(team));
        }
        if self.colonies.contains_key(&team) {
            return Err(SimError::DuplicateTeam(team));
        }
        let mut cap = setup
            .max_colony_size
            .unwrap_or(self.rules.economy.max_colony_size);
        if setup.upgrades.contains(&Upgrade::ColonyCapacity) {
            cap = cap.saturating_add(self.rules.economy.capacity_bonus);
        }
        let starting = setup.workers.checked_add(setup.soldiers);
        if starting.filter(|&count| count <= cap).is_none() {
            return Err(SimError::ColonyFull { max: cap });
        }

        let queen_id = self.allocate_unit();
        let mut queen = Unit::new(
            queen_id,
            team,
            UnitKind::Queen,
            setup.species,
            setup.queen_pos,
            self.rules.stats.queen,
        );
        if let Some(health) = setup.queen_health {
            queen.health.current = health.min(queen.health.max);
        }
        self.units.insert(queen_id, queen);

        let mut colony = Colony::new(
            team,
            setup.species,
            setup.controller,
            setup.spawn_pos,
            queen_id,
            &self.rules.economy,
        );
        if let Some(food) = setup.food {
            colony.food = food;
        }
        if let Some(max) = setup.max_colony_size {
            colony.max_colony_size = max;
        }
        colony.command = setup.command;
        if setup.workers > 0 || setup.soldiers > 0 {
            colony.initial_wave_done = true;
        }
        for &upgrade in &setup.upgrades {
            colony.apply_upgrade(upgrade, &self.rules.economy);
        }
        self.colonies.insert(team, colony);

        if setup.controller.has_player() {
            let avatar = self.spawn_body(team, UnitKind::Avatar, setup.spawn_pos, effects);
            if let Some(colony) = self.colonies.get_mut(&team) {
                colony.avatar = avatar;
            }
        }
        let jitter = self.rules.economy.spawn_jitter;
        let starters = std::iter::repeat_n(UnitKind::Worker, setup.workers as usize)
            .chain(std::iter::repeat_n(UnitKind::Soldier, setup.soldiers as usize));
        for kind in starters {
            if let Some(colony) = self.colonies.get_mut(&team) {
                colony.record_birth(kind);
            }
            let position = setup.spawn_pos.jittered(&mut self.rng, jitter);
            self.spawn_body(team, kind, position, effects);
        }
        debug!(team, species = %setup.species, "colony added");
        Ok(team)
    }

    /// Add a food spawner.
    pub fn add_food_spawner(&mut self, spawner: FoodSpawner) {
        self.spawners.push(spawner);
    }

    /// Drop a free pellet.
    pub fn spawn_food(&mut self, position: Vec2) -> FoodId {
        let id = FoodId(self.next_food);
        self.next_food += 1;
        let pellet = FoodPellet::new(id, position);
        self.foods.insert(id, pellet);
        self.broadcast(StateEvent::FoodSpawned { pellet });
        id
    }

    fn allocate_unit(&mut self) -> UnitId {
        let id = UnitId(self.next_unit);
        self.next_unit += 1;
        id
    }

    /// Create a unit body for a team with the colony's upgrades applied.
    /// Counters are the caller's business.
    fn spawn_body(
        &mut self,
        team: TeamId,
        kind: UnitKind,
        position: Vec2,
        effects: &mut dyn EffectsSink,
    ) -> Option<UnitId> {
        let colony = self.colonies.get(&team)?;
        let species = colony.species;
        let upgrades = colony.upgrades.clone();
        let id = self.allocate_unit();
        let mut unit = Unit::new(id, team, kind, species, position, self.rules.stats.for_kind(kind));
        for upgrade in upgrades {
            upgrade.apply_to_unit(&mut unit);
        }
        if self.replicating() {
            self.broadcast(StateEvent::UnitSpawned {
                unit: Box::new(unit.clone()),
            });
        }
        self.units.insert(id, unit);
        effects.trigger(Effect::Sound { team, name: "Spawn" });
        debug!(team, unit = %id, %kind, "unit spawned");
        Some(id)
    }

    // ---- player actions ----

    /// Carry out a player action for `team`.
    ///
    /// # Errors
    ///
    /// Fails if the team is unknown or eliminated, or the action breaks a rule.
    pub fn apply_action(
        &mut self,
        team: TeamId,
        action: &PlayerAction,
        effects: &mut dyn EffectsSink,
    ) -> SimResult<()> {
        match *action {
            PlayerAction::PlaceMarker {
                command,
                heading,
                position,
            } => {
                let position = match position {
                    Some(position) => position,
                    None => self.avatar_position(team)?,
                };
                self.place_marker(team, command, position, heading).map(drop)
            }
            PlayerAction::RemoveMarker => {
                let near = self.avatar_position(team)?;
                self.remove_marker(team, near).map(drop)
            }
            PlayerAction::ClearMarkers => self.clear_markers(team).map(drop),
            PlayerAction::Spawn { kind } => self.purchase(team, kind, effects).map(drop),
            PlayerAction::BuyUpgrade { upgrade } => self.buy_upgrade(team, upgrade),
            PlayerAction::MoveAvatar { position } => self.move_avatar(team, position),
        }
    }

    fn living_colony(&self, team: TeamId) -> SimResult<&Colony> {
        let colony = self.colonies.get(&team).ok_or(SimError::UnknownTeam(team))?;
        if colony.alive {
            Ok(colony)
        } else {
            Err(SimError::Eliminated(team))
        }
    }

    fn living_colony_mut(&mut self, team: TeamId) -> SimResult<&mut Colony> {
        let colony = self
            .colonies
            .get_mut(&team)
            .ok_or(SimError::UnknownTeam(team))?;
        if colony.alive {
            Ok(colony)
        } else {
            Err(SimError::Eliminated(team))
        }
    }

    fn avatar_position(&self, team: TeamId) -> SimResult<Vec2> {
        let colony = self.living_colony(team)?;
        colony
            .avatar
            .and_then(|id| self.units.get(&id))
            .map(|avatar| avatar.position)
            .ok_or(SimError::NoPlayer(team))
    }

    /// Place a marker for a player colony.
    ///
    /// # Errors
    ///
    /// Fails if the team has no player or the placement is rejected.
    pub fn place_marker(
        &mut self,
        team: TeamId,
        command: crate::game::Command,
        position: Vec2,
        heading: f32,
    ) -> SimResult<Marker> {
        let colony = self.living_colony_mut(team)?;
        if !colony.controller.has_player() {
            return Err(SimError::NoPlayer(team));
        }
        let marker = colony.markers.place(command, position, heading)?;
        debug!(team, command = %command, "marker placed");
        self.broadcast(StateEvent::MarkerPlaced { marker });
        Ok(marker)
    }

    /// Remove the team's marker nearest `near`.
    ///
    /// # Errors
    ///
    /// Fails if the team is unknown or eliminated.
    pub fn remove_marker(&mut self, team: TeamId, near: Vec2) -> SimResult<Option<Marker>> {
        let colony = self.living_colony_mut(team)?;
        let removed = colony.markers.remove_nearest(near);
        if let Some(marker) = removed {
            debug!(team, command = %marker.command, "marker removed");
            self.broadcast(StateEvent::MarkerRemoved {
                team,
                marker: marker.id,
            });
        }
        Ok(removed)
    }

    /// Remove all of a team's markers. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Fails if the team is unknown or eliminated.
    pub fn clear_markers(&mut self, team: TeamId) -> SimResult<usize> {
        let colony = self.living_colony_mut(team)?;
        let removed = colony.markers.clear();
        for marker in &removed {
            self.broadcast(StateEvent::MarkerRemoved {
                team,
                marker: marker.id,
            });
        }
        Ok(removed.len())
    }

    /// Buy one unit for a colony and spawn it at the nest.
    ///
    /// # Errors
    ///
    /// Fails on the same food, cap and availability rules as automatic buying.
    pub fn purchase(
        &mut self,
        team: TeamId,
        kind: UnitKind,
        effects: &mut dyn EffectsSink,
    ) -> SimResult<UnitId> {
        let colony = self.living_colony_mut(team)?;
        colony.try_purchase(kind)?;
        let (food, spawn_pos) = (colony.food, colony.spawn_pos);
        self.broadcast(StateEvent::FoodBalance { team, food });
        let position = spawn_pos.jittered(&mut self.rng, self.rules.economy.spawn_jitter);
        self.spawn_body(team, kind, position, effects)
            .ok_or(SimError::UnknownTeam(team))
    }

    /// Buy an upgrade for a colony.
    ///
    /// # Errors
    ///
    /// Fails if the upgrade is for the other species, its tier is taken or
    /// locked, or food is short.
    pub fn buy_upgrade(&mut self, team: TeamId, upgrade: Upgrade) -> SimResult<()> {
        let colony = self.living_colony_mut(team)?;
        if let Some(reason) = purchase_blocker(upgrade, colony.species, &colony.upgrades) {
            return Err(SimError::UpgradeUnavailable { upgrade, reason });
        }
        let cost = upgrade.cost();
        if colony.food < cost {
            return Err(SimError::InsufficientFood {
                needed: cost,
                available: colony.food,
            });
        }
        colony.food -= cost;
        let food = colony.food;
        self.grant_upgrade(team, upgrade);
        info!(team, %upgrade, "upgrade purchased");
        self.broadcast(StateEvent::UpgradeApplied { team, upgrade });
        self.broadcast(StateEvent::FoodBalance { team, food });
        Ok(())
    }

    /// Record an upgrade and apply it to every unit of the team.
    pub(crate) fn grant_upgrade(&mut self, team: TeamId, upgrade: Upgrade) {
        let Some(colony) = self.colonies.get_mut(&team) else {
            return;
        };
        if colony.has_upgrade(upgrade) {
            return;
        }
        colony.apply_upgrade(upgrade, &self.rules.economy);
        for unit in self.units.values_mut().filter(|u| u.team == team) {
            upgrade.apply_to_unit(unit);
        }
    }

    /// Send a team's avatar toward `position`.
    ///
    /// # Errors
    ///
    /// Fails if the team has no living avatar.
    pub fn move_avatar(&mut self, team: TeamId, position: Vec2) -> SimResult<()> {
        let avatar = self.living_colony(team)?.avatar.ok_or(SimError::NoPlayer(team))?;
        let unit = self.units.get_mut(&avatar).ok_or(SimError::NoPlayer(team))?;
        unit.target = position;
        Ok(())
    }

    // ---- combat ----

    /// Damage (or, with a negative amount, heal) a unit and run death
    /// handling if this killed it.
    pub fn apply_damage(
        &mut self,
        target: UnitId,
        amount: f32,
        effects: &mut dyn EffectsSink,
    ) -> DamageOutcome {
        let Some(unit) = self.units.get_mut(&target) else {
            return DamageOutcome::Missing;
        };
        let outcome = unit.health.apply(amount);
        if outcome == DamageOutcome::AlreadyDead {
            return outcome;
        }
        let (position, health) = (unit.position, unit.health.current);
        if amount > 0.0 {
            effects.trigger(Effect::Particles { position, name: "Hit" });
        }
        self.broadcast(StateEvent::HealthSync {
            unit: target,
            health,
        });
        if outcome == DamageOutcome::Died {
            self.handle_death(target, effects);
        }
        outcome
    }

    /// Run the death consequences for a unit whose health just hit zero.
    pub(crate) fn handle_death(&mut self, id: UnitId, effects: &mut dyn EffectsSink) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let fatality = Fatality::of(unit);
        effects.trigger(Effect::Particles {
            position: unit.position,
            name: "Death",
        });
        match fatality {
            Fatality::Ant { team, kind } => {
                self.drop_food(id, effects);
                if let Some(colony) = self.colonies.get_mut(&team) {
                    colony.record_loss(kind);
                }
                self.units.remove(&id);
                debug!(team, unit = %id, %kind, "ant died");
            }
            Fatality::Queen { team } => {
                info!(team, "queen killed");
                self.eliminate(team, effects);
            }
            Fatality::Avatar { team } => self.respawn_or_eliminate(id, team, effects),
        }
    }

    fn respawn_or_eliminate(&mut self, id: UnitId, team: TeamId, effects: &mut dyn EffectsSink) {
        let cost = self.rules.economy.avatar_respawn_cost;
        let Some(colony) = self.colonies.get_mut(&team) else {
            return;
        };
        if !colony.alive || colony.food < 0 {
            info!(team, food = colony.food, "player died out of food");
            self.eliminate(team, effects);
            return;
        }
        colony.food -= cost;
        let (food, spawn_pos) = (colony.food, colony.spawn_pos);
        self.drop_food(id, effects);
        let Some(avatar) = self.units.get_mut(&id) else {
            return;
        };
        avatar.health.restore();
        avatar.position = spawn_pos;
        avatar.target = spawn_pos;
        avatar.destination = None;
        let health = avatar.health.current;
        info!(team, food, "player respawned");
        self.broadcast(StateEvent::HealthSync { unit: id, health });
        self.broadcast(StateEvent::FoodBalance { team, food });
    }

    /// Knock a colony out: its queen and avatar leave the field, its markers
    /// are cleared and its ants self-destruct on their next tick.
    pub(crate) fn eliminate(&mut self, team: TeamId, effects: &mut dyn EffectsSink) {
        let Some(colony) = self.colonies.get_mut(&team) else {
            return;
        };
        if !colony.alive {
            return;
        }
        colony.alive = false;
        colony.command = StrategicCommand::None;
        colony.attack_target = None;
        colony.markers.clear();
        let queen = colony.queen;
        let avatar = colony.avatar.take();
        self.units.remove(&queen);
        if let Some(avatar) = avatar {
            self.drop_food(avatar, effects);
            self.units.remove(&avatar);
        }
        self.eliminations.push(Elimination {
            team,
            tick: self.tick,
        });
        effects.trigger(Effect::Sound { team, name: "Lose" });
        info!(team, tick = self.tick, "colony eliminated");
        self.broadcast(StateEvent::ColonyEliminated { team });
    }

    /// Remove a unit without touching colony counters.
    pub(crate) fn remove_unit(&mut self, id: UnitId, effects: &mut dyn EffectsSink) {
        self.drop_food(id, effects);
        if self.units.remove(&id).is_some() {
            self.broadcast(StateEvent::UnitRemoved { unit: id });
        }
    }

    fn drop_food(&mut self, id: UnitId, effects: &mut dyn EffectsSink) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let Some(food) = unit.carried.take() else {
            return;
        };
        let (team, position) = (unit.team, unit.position);
        if let Some(pellet) = self.foods.get_mut(&food) {
            pellet.carried = false;
            pellet.position = position;
        }
        effects.trigger(Effect::Sound { team, name: "Drop" });
        self.broadcast(StateEvent::FoodCarried {
            food,
            carrier: None,
            position,
        });
    }

    // ---- tick ----

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, effects: &mut dyn EffectsSink) {
        let dt = self.tick_seconds;
        self.tick += 1;
        self.time += dt;

        self.resolve_scheduled(effects);
        let teams: Vec<TeamId> = self.colonies.keys().copied().collect();
        for team in teams {
            self.update_colony(team, dt, effects);
        }
        self.update_spawners(dt);
        self.update_units(dt, effects);
        self.update_outcome(effects);
    }

    fn resolve_scheduled(&mut self, effects: &mut dyn EffectsSink) {
        for event in self.scheduler.drain_due(self.time) {
            match event {
                Scheduled::Strike { attacker, target } => {
                    let Some(damage) = self.units.get(&attacker).map(|u| u.attack) else {
                        continue;
                    };
                    #[allow(clippy::cast_precision_loss)]
                    self.apply_damage(target, damage as f32, effects);
                }
                Scheduled::Recover { unit } => {
                    if self.units.contains_key(&unit) {
                        effects.trigger(Effect::Animation {
                            unit,
                            name: "isAttacking",
                            active: false,
                        });
                    }
                }
            }
        }
    }

    fn update_colony(&mut self, team: TeamId, dt: f32, effects: &mut dyn EffectsSink) {
        let jitter = self.rules.economy.spawn_jitter;
        let Some(colony) = self.colonies.get_mut(&team) else {
            return;
        };
        if !colony.alive {
            return;
        }
        let credited = economy::accrue_income(colony, dt, &self.rules.economy);
        let mut births = economy::initial_wave(colony, &self.rules.economy);
        let is_ai = colony.controller.spends_automatically();
        if is_ai {
            births.extend(economy::spend(colony, &self.rules.economy));
        }
        let (food, spawn_pos) = (colony.food, colony.spawn_pos);

        if credited != 0 || !births.is_empty() {
            self.broadcast(StateEvent::FoodBalance { team, food });
        }
        for kind in births {
            let position = spawn_pos.jittered(&mut self.rng, jitter);
            self.spawn_body(team, kind, position, effects);
        }
        if is_ai {
            self.run_strategy(team);
        }
        self.queen_upkeep(team, dt, effects);
    }

    fn run_strategy(&mut self, team: TeamId) {
        let rivals: Vec<RivalView> = self
            .colonies
            .values()
            .filter(|c| c.alive && c.team != team)
            .map(|c| RivalView {
                team: c.team,
                total_soldiers: c.total_soldiers,
                strength: c.strength(),
                spawn_pos: c.spawn_pos,
            })
            .collect();
        let Some(colony) = self.colonies.get(&team) else {
            return;
        };
        let queen_pos = self.queen_position(colony);
        let threatened = self
            .nearest_enemy(team, queen_pos, self.rules.strategy.nest_alert_radius)
            .is_some();
        let now = self.time;
        let Some(colony) = self.colonies.get_mut(&team) else {
            return;
        };
        let changed = strategy::evaluate(
            colony,
            &rivals,
            threatened,
            now,
            &self.rules.strategy,
            &mut self.rng,
        );
        if changed {
            let (command, attack_location) = (colony.command, colony.attack_location);
            debug!(team, ?command, target = ?colony.attack_target, "strategy changed");
            self.broadcast(StateEvent::CommandChanged {
                team,
                command,
                attack_location,
            });
        }
    }

    fn queen_upkeep(&mut self, team: TeamId, dt: f32, effects: &mut dyn EffectsSink) {
        let economy = &self.rules.economy;
        let Some(colony) = self.colonies.get_mut(&team) else {
            return;
        };
        let queen_id = colony.queen;
        let Some(health) = self.units.get(&queen_id).map(|q| q.health) else {
            return;
        };

        let mut heal = false;
        if colony.fortress && health.is_wounded() {
            colony.heal_timer += dt;
            if colony.heal_timer >= 1.0 {
                colony.heal_timer -= 1.0;
                heal = true;
            }
        }
        let last_stand = colony.last_stand && health.fraction() < economy.last_stand_threshold;
        let soldiers = economy.last_stand_soldiers;
        let heal_amount = economy.fortress_heal;
        let spawn_pos = colony.spawn_pos;
        if last_stand {
            colony.last_stand = false;
            for _ in 0..soldiers {
                colony.record_birth(UnitKind::Soldier);
            }
        }

        if heal {
            self.apply_damage(queen_id, -heal_amount, effects);
        }
        if last_stand {
            info!(team, soldiers, "last stand");
            for _ in 0..soldiers {
                self.spawn_body(team, UnitKind::Soldier, spawn_pos, effects);
            }
        }
    }

    fn update_spawners(&mut self, dt: f32) {
        let mut drops = Vec::new();
        for spawner in &mut self.spawners {
            let count = spawner.advance(dt);
            drops.extend(std::iter::repeat_n((spawner.position, spawner.spread), count as usize));
        }
        for (center, spread) in drops {
            let position = center.jittered(&mut self.rng, spread);
            self.spawn_food(position);
        }
    }

    fn update_units(&mut self, dt: f32, effects: &mut dyn EffectsSink) {
        let tuning = self.rules.decision;
        let ants: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.kind.is_ant())
            .map(|u| u.id)
            .collect();

        let plans: Vec<(UnitId, Option<Plan>)> = {
            let world = &*self;
            ants.par_iter()
                .map(|&id| (id, world.plan(id, dt, &tuning)))
                .collect()
        };

        for (id, plan) in plans {
            match plan {
                Some(plan) => self.execute(id, &plan, dt, &tuning, effects),
                None => {
                    warn!(unit = %id, "colony gone, unit self-destructs");
                    self.remove_unit(id, effects);
                }
            }
        }

        let avatars: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.kind == UnitKind::Avatar)
            .map(|u| u.id)
            .collect();
        for id in avatars {
            self.move_unit(id, dt, &tuning, effects);
        }
    }

    /// Decide for one ant. `None` if its colony is gone.
    fn plan(&self, id: UnitId, dt: f32, tuning: &DecisionTuning) -> Option<Plan> {
        let unit = self.units.get(&id)?;
        let colony = self.colonies.get(&unit.team).filter(|c| c.alive)?;
        let mut rng = unit_rng(self.seed, self.tick, id);
        let mut memory = unit.memory;
        memory.advance(dt, tuning, &mut rng);

        let orders: &dyn OrderSource = if colony.controller.has_player() {
            &colony.markers
        } else {
            &NoOrders
        };
        let marker = orders
            .nearest_order(unit.position, unit.kind, unit.is_carrying())
            .map(|m| MarkerSighting::new(m, unit.position));
        let perception = Perception {
            position: unit.position,
            kind: unit.kind,
            carrying: unit.carried,
            enemy: self.nearest_enemy(unit.team, unit.position, tuning.sight_range),
            food: self.nearest_free_food(unit.position, tuning.sight_range),
            marker,
            queen: self.queen_position(colony),
            nest: colony.spawn_pos,
            player: colony
                .avatar
                .and_then(|a| self.units.get(&a))
                .map(|a| a.position),
            strategic: colony.command,
            attack_location: colony.attack_location,
        };
        let decision = decide(&perception, &mut memory, tuning, dt, &mut rng);
        Some(Plan {
            memory,
            marker,
            decision,
        })
    }

    fn execute(
        &mut self,
        id: UnitId,
        plan: &Plan,
        dt: f32,
        tuning: &DecisionTuning,
        effects: &mut dyn EffectsSink,
    ) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        unit.memory = plan.memory;
        update_path_buff(
            &mut unit.speed,
            &mut unit.path_buff,
            plan.marker.as_ref(),
            tuning.path_speed_bonus,
        );
        unit.target = plan.decision.target;
        if let Some(point) = plan.decision.facing {
            let facing = (point - unit.position).normalized();
            if facing != Vec2::ZERO {
                unit.facing = facing;
            }
        }

        match plan.decision.action {
            Some(Action::Attack(target)) => self.begin_attack(id, target, tuning, effects),
            Some(Action::Pickup(food)) => self.pickup(id, food, effects),
            Some(Action::Deposit(food)) => self.deposit(id, food, effects),
            None => {}
        }
        self.apply_fortress(id);
        self.apply_first_aid(id, dt, effects);
        self.move_unit(id, dt, tuning, effects);
    }

    fn begin_attack(
        &mut self,
        attacker: UnitId,
        target: UnitId,
        tuning: &DecisionTuning,
        effects: &mut dyn EffectsSink,
    ) {
        let strike_at = self.time + tuning.attack_windup;
        self.scheduler
            .schedule(strike_at, Scheduled::Strike { attacker, target });
        self.scheduler.schedule(
            strike_at + tuning.attack_recovery,
            Scheduled::Recover { unit: attacker },
        );
        effects.trigger(Effect::Animation {
            unit: attacker,
            name: "isAttacking",
            active: true,
        });
    }

    fn pickup(&mut self, id: UnitId, food: FoodId, effects: &mut dyn EffectsSink) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let Some(pellet) = self.foods.get_mut(&food) else {
            return;
        };
        if pellet.carried {
            warn!(unit = %id, food = %food, "pellet already taken");
            return;
        }
        if unit.carried.is_some() {
            return;
        }
        pellet.carried = true;
        pellet.position = unit.position;
        unit.carried = Some(food);
        let (team, position) = (unit.team, unit.position);
        effects.trigger(Effect::Sound { team, name: "Pickup" });
        self.broadcast(StateEvent::FoodCarried {
            food,
            carrier: Some(id),
            position,
        });
    }

    fn deposit(&mut self, id: UnitId, food: FoodId, effects: &mut dyn EffectsSink) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        if unit.carried != Some(food) {
            return;
        }
        unit.carried = None;
        let (team, food_mult) = (unit.team, unit.food_mult);
        let Some(pellet) = self.foods.remove(&food) else {
            return;
        };
        let Some(colony) = self.colonies.get_mut(&team) else {
            return;
        };
        let amount = delivered_amount(pellet.value, food_mult);
        colony.food += amount;
        let balance = colony.food;
        effects.trigger(Effect::Sound {
            team,
            name: "FoodDropoff",
        });
        debug!(team, amount, balance, "food delivered");
        self.broadcast(StateEvent::FoodDeposited { food, carrier: id });
        self.broadcast(StateEvent::FoodBalance {
            team,
            food: balance,
        });
    }

    fn apply_fortress(&mut self, id: UnitId) {
        let Some(team) = self.units.get(&id).map(|u| u.team) else {
            return;
        };
        let Some(colony) = self.colonies.get(&team).filter(|c| c.fortress) else {
            return;
        };
        let queen_pos = self.queen_position(colony);
        let economy = &self.rules.economy;
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let inside = unit.position.distance(queen_pos) <= economy.fortress_range;
        if inside && !unit.fortress_buff {
            unit.attack += economy.fortress_attack_bonus;
            unit.fortress_buff = true;
        } else if !inside && unit.fortress_buff {
            unit.attack -= economy.fortress_attack_bonus;
            unit.fortress_buff = false;
        }
    }

    fn apply_first_aid(&mut self, id: UnitId, dt: f32, effects: &mut dyn EffectsSink) {
        let heal = self.rules.economy.first_aid_heal;
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        if !unit.first_aid || !unit.health.is_wounded() {
            return;
        }
        unit.heal_timer += dt;
        if unit.heal_timer >= 1.0 {
            unit.heal_timer -= 1.0;
            self.apply_damage(id, -heal, effects);
        }
    }

    fn move_unit(&mut self, id: UnitId, dt: f32, tuning: &DecisionTuning, effects: &mut dyn EffectsSink) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        match steer(
            unit.position,
            unit.target,
            &mut unit.movement_timer,
            dt,
            tuning.movement_delay,
            tuning.arrival_tolerance,
        ) {
            Steer::Issued(destination) => unit.destination = Some(destination),
            Steer::Continuing => {}
            Steer::Arrived => unit.destination = None,
        }
        let walking = match unit.destination {
            Some(destination) => {
                let next = self
                    .navigator
                    .advance(unit.position, destination, unit.speed, dt);
                let heading = (next - unit.position).normalized();
                if heading != Vec2::ZERO {
                    unit.facing = heading;
                }
                unit.position = next;
                true
            }
            None => false,
        };
        if walking != unit.walking {
            unit.walking = walking;
            effects.trigger(Effect::Animation {
                unit: id,
                name: "isWalking",
                active: walking,
            });
        }
        if let Some(food) = unit.carried {
            let position = unit.position;
            if let Some(pellet) = self.foods.get_mut(&food) {
                pellet.position = position;
            }
        }
    }

    fn update_outcome(&mut self, effects: &mut dyn EffectsSink) {
        if self.outcome.is_some() || self.colonies.len() < 2 {
            return;
        }
        let living = self.living_teams();
        self.outcome = match living.as_slice() {
            [] => Some(MatchOutcome::Draw),
            [winner] => Some(MatchOutcome::Victory(*winner)),
            _ => None,
        };
        if let Some(outcome) = self.outcome {
            if let MatchOutcome::Victory(team) = outcome {
                effects.trigger(Effect::Sound { team, name: "Win" });
            }
            info!(?outcome, tick = self.tick, "match decided");
        }
    }

    // ---- queries ----

    fn queen_position(&self, colony: &Colony) -> Vec2 {
        self.units
            .get(&colony.queen)
            .map_or(colony.spawn_pos, |q| q.position)
    }

    /// The nearest living unit of another team within `range` of `position`.
    #[must_use]
    pub fn nearest_enemy(&self, team: TeamId, position: Vec2, range: f32) -> Option<Sighting<UnitId>> {
        self.units
            .values()
            .filter(|u| u.team != team && !u.health.already_dead)
            .map(|u| Sighting {
                id: u.id,
                position: u.position,
                distance: u.position.distance(position),
            })
            .filter(|s| s.distance <= range)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// The nearest pellet on the ground within `range` of `position`.
    #[must_use]
    pub fn nearest_free_food(&self, position: Vec2, range: f32) -> Option<Sighting<FoodId>> {
        self.foods
            .values()
            .filter(|f| !f.carried)
            .map(|f| Sighting {
                id: f.id,
                position: f.position,
                distance: f.position.distance(position),
            })
            .filter(|s| s.distance <= range)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    // ---- replication ----

    /// Start recording authoritative state changes for broadcast.
    pub fn enable_replication(&mut self) {
        self.outbox.get_or_insert_with(Vec::new);
    }

    /// Whether state changes are being recorded.
    #[must_use]
    pub const fn replicating(&self) -> bool {
        self.outbox.is_some()
    }

    /// Take the recorded state changes.
    pub fn drain_broadcasts(&mut self) -> Vec<StateEvent> {
        self.outbox.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Send the recorded state changes down a channel.
    pub fn flush_broadcasts(&mut self, channel: &mut dyn BroadcastChannel) {
        for event in self.drain_broadcasts() {
            channel.send(event);
        }
    }

    pub(crate) fn broadcast(&mut self, event: StateEvent) {
        if let Some(outbox) = self.outbox.as_mut() {
            outbox.push(event);
        }
    }
}

/// FNV-1a over 64-bit words.
struct Fnv(u64);

impl Fnv {
    const fn new() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }

    fn write(&mut self, word: u64) {
        for byte in word.to_le_bytes() {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    const fn finish(&self) -> u64 {
        self.0
    }
}

/// The random stream for one unit on one tick.
fn unit_rng(seed: u64, tick: u64, id: UnitId) -> StdRng {
    let mut hash = Fnv::new();
    hash.write(seed);
    hash.write(tick);
    hash.write(u64::from(id.0));
    StdRng::seed_from_u64(hash.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Command, Difficulty, Discard};

    fn world() -> World {
        World::new(7, Rules::default(), 0.05)
    }

    fn two_colonies(world: &mut World) {
        let mut sink = Discard;
        world
            .add_colony(
                &ColonySetup::new(1, Species::Black, Controller::Player, Vec2::new(0.0, 50.0)),
                &mut sink,
            )
            .unwrap();
        world
            .add_colony(
                &ColonySetup::new(
                    2,
                    Species::Fire,
                    Controller::Ai {
                        difficulty: Difficulty::Medium,
                    },
                    Vec2::new(0.0, -50.0),
                ),
                &mut sink,
            )
            .unwrap();
    }

    #[test]
    fn test_add_colony_validates_team() {
        let mut w = world();
        let mut sink = Discard;
        let bad = ColonySetup::new(5, Species::Black, Controller::Player, Vec2::ZERO);
        assert!(matches!(w.add_colony(&bad, &mut sink), Err(SimError::InvalidTeam(5))));
        let ok = ColonySetup::new(1, Species::Black, Controller::Player, Vec2::ZERO);
        w.add_colony(&ok, &mut sink).unwrap();
        assert!(matches!(w.add_colony(&ok, &mut sink), Err(SimError::DuplicateTeam(1))));
    }

    #[test]
    fn test_add_colony_rejects_starting_ants_over_cap() {
        let mut w = world();
        let mut setup = ColonySetup::new(1, Species::Black, Controller::Scripted, Vec2::ZERO);
        setup.workers = u32::MAX;
        setup.soldiers = 1;
        assert!(matches!(
            w.add_colony(&setup, &mut Discard),
            Err(SimError::ColonyFull { max: 50 })
        ));
        assert_eq!(w.units().count(), 0);

        setup.workers = 55;
        setup.soldiers = 0;
        setup.upgrades = vec![Upgrade::ColonyCapacity];
        assert!(matches!(
            w.add_colony(&setup, &mut Discard),
            Err(SimError::ColonyFull { max: 60 })
        ));
        setup.workers = 60;
        w.add_colony(&setup, &mut Discard).unwrap();
        assert_eq!(w.colony(1).unwrap().colony_size(), 60);
    }

    #[test]
    fn test_player_colony_has_queen_and_avatar() {
        let mut w = world();
        two_colonies(&mut w);
        let colony = w.colony(1).unwrap();
        assert_eq!(w.unit(colony.queen).unwrap().kind, UnitKind::Queen);
        let avatar = colony.avatar.unwrap();
        assert_eq!(w.unit(avatar).unwrap().kind, UnitKind::Avatar);
        assert!(w.colony(2).unwrap().avatar.is_none());
    }

    #[test]
    fn test_starting_units_are_counted() {
        let mut w = world();
        let mut setup = ColonySetup::new(1, Species::Black, Controller::Scripted, Vec2::ZERO);
        setup.workers = 3;
        setup.soldiers = 2;
        w.add_colony(&setup, &mut Discard).unwrap();
        let colony = w.colony(1).unwrap();
        assert_eq!(colony.total_workers, 3);
        assert_eq!(colony.total_soldiers, 2);
        assert_eq!(w.units().filter(|u| u.kind.is_ant()).count(), 5);
    }

    #[test]
    fn test_ai_colony_buys_on_first_tick() {
        let mut w = world();
        two_colonies(&mut w);
        w.tick(&mut Discard);
        let fire = w.colony(2).unwrap();
        // Opening wave of four, a fifth worker, then a soldier to balance.
        assert_eq!(fire.total_workers, 5);
        assert_eq!(fire.total_soldiers, 1);
        assert_eq!(fire.food, 25);
        let black = w.colony(1).unwrap();
        assert_eq!(black.total_workers, 0);
        assert_eq!(black.food, 100);
    }

    #[test]
    fn test_purchase_spawns_unit() {
        let mut w = world();
        two_colonies(&mut w);
        let id = w.purchase(1, UnitKind::Soldier, &mut Discard).unwrap();
        assert_eq!(w.unit(id).unwrap().kind, UnitKind::Soldier);
        assert_eq!(w.colony(1).unwrap().food, 50);
        assert!(matches!(
            w.purchase(1, UnitKind::SuperSoldier, &mut Discard),
            Err(SimError::NotPurchasable(UnitKind::SuperSoldier))
        ));
    }

    #[test]
    fn test_markers_only_for_players() {
        let mut w = world();
        two_colonies(&mut w);
        w.place_marker(1, Command::Attack, Vec2::ZERO, 0.0).unwrap();
        assert!(matches!(
            w.place_marker(2, Command::Attack, Vec2::ZERO, 0.0),
            Err(SimError::NoPlayer(2))
        ));
        assert_eq!(w.clear_markers(1).unwrap(), 1);
    }

    #[test]
    fn test_upgrade_applies_to_living_and_future_units() {
        let mut w = world();
        two_colonies(&mut w);
        w.colonies.get_mut(&1).unwrap().food = 500;
        let before = w.purchase(1, UnitKind::Worker, &mut Discard).unwrap();
        let speed = w.unit(before).unwrap().speed;
        w.buy_upgrade(1, Upgrade::MovementSpeed).unwrap();
        assert!((w.unit(before).unwrap().speed - speed * 1.15).abs() < 1e-4);
        let after = w.purchase(1, UnitKind::Worker, &mut Discard).unwrap();
        assert!((w.unit(after).unwrap().speed - speed * 1.15).abs() < 1e-4);
        assert!(matches!(
            w.buy_upgrade(1, Upgrade::LessFoodWaste),
            Err(SimError::UpgradeUnavailable { .. })
        ));
        assert_eq!(w.colony(1).unwrap().food, 500 - 25 - 50 - 25);
    }

    #[test]
    fn test_queen_death_eliminates_and_decides() {
        let mut w = world();
        two_colonies(&mut w);
        let queen = w.colony(2).unwrap().queen;
        let mut effects = Vec::new();
        assert_eq!(w.apply_damage(queen, 5000.0, &mut effects), DamageOutcome::Died);
        assert!(!w.colony(2).unwrap().alive);
        assert!(w.unit(queen).is_none());
        w.tick(&mut effects);
        assert_eq!(w.outcome(), Some(MatchOutcome::Victory(1)));
        assert!(effects.contains(&Effect::Sound { team: 2, name: "Lose" }));
    }

    #[test]
    fn test_avatar_respawn_costs_food() {
        let mut w = world();
        two_colonies(&mut w);
        let avatar = w.colony(1).unwrap().avatar.unwrap();
        w.apply_damage(avatar, 1000.0, &mut Discard);
        let colony = w.colony(1).unwrap();
        assert!(colony.alive);
        assert_eq!(colony.food, 70);
        let unit = w.unit(avatar).unwrap();
        assert!(!unit.health.already_dead);
        assert_eq!(unit.position, colony.spawn_pos);
    }

    #[test]
    fn test_avatar_death_in_debt_eliminates() {
        let mut w = world();
        two_colonies(&mut w);
        w.colonies.get_mut(&1).unwrap().food = -1;
        let avatar = w.colony(1).unwrap().avatar.unwrap();
        w.apply_damage(avatar, 1000.0, &mut Discard);
        assert!(!w.colony(1).unwrap().alive);
    }

    #[test]
    fn test_orphans_self_destruct() {
        let mut w = world();
        two_colonies(&mut w);
        w.tick(&mut Discard);
        assert!(w.colony(2).unwrap().total_workers > 0);
        let queen = w.colony(2).unwrap().queen;
        w.apply_damage(queen, 5000.0, &mut Discard);
        w.tick(&mut Discard);
        assert_eq!(w.units().filter(|u| u.team == 2).count(), 0);
    }

    #[test]
    fn test_same_seed_same_checksum() {
        let mut a = world();
        let mut b = world();
        two_colonies(&mut a);
        two_colonies(&mut b);
        for _ in 0..200 {
            a.tick(&mut Discard);
            b.tick(&mut Discard);
        }
        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn test_outcome_by_strength() {
        let mut w = world();
        two_colonies(&mut w);
        assert_eq!(w.outcome_by_strength(), MatchOutcome::Draw);
        w.colonies.get_mut(&1).unwrap().total_workers = 1;
        assert_eq!(w.outcome_by_strength(), MatchOutcome::Victory(1));
    }

    fn scripted_pair(world: &mut World) {
        for (team, y) in [(1, 50.0), (2, -50.0)] {
            let setup =
                ColonySetup::new(team, Species::Black, Controller::Scripted, Vec2::new(0.0, y));
            world.add_colony(&setup, &mut Discard).unwrap();
        }
    }

    #[test]
    fn test_fortress_heals_queen_up_to_max() {
        let mut w = world();
        scripted_pair(&mut w);
        w.colonies.get_mut(&1).unwrap().fortress = true;
        let queen = w.colony(1).unwrap().queen;
        w.apply_damage(queen, 12.0, &mut Discard);
        assert!((w.queen_health(1).unwrap().current - 988.0).abs() < 1e-3);

        // Half a second: nothing yet.
        for _ in 0..10 {
            w.tick(&mut Discard);
        }
        assert!((w.queen_health(1).unwrap().current - 988.0).abs() < 1e-3);

        // Past the first whole second: one heal of 5.
        for _ in 0..15 {
            w.tick(&mut Discard);
        }
        assert!((w.queen_health(1).unwrap().current - 993.0).abs() < 1e-3);

        // Two more heals would overshoot; health stops at max.
        for _ in 0..100 {
            w.tick(&mut Discard);
        }
        assert!((w.queen_health(1).unwrap().current - 1000.0).abs() < 1e-3);

        // Without the upgrade the other queen stays wounded.
        let other = w.colony(2).unwrap().queen;
        w.apply_damage(other, 12.0, &mut Discard);
        for _ in 0..40 {
            w.tick(&mut Discard);
        }
        assert!((w.queen_health(2).unwrap().current - 988.0).abs() < 1e-3);
    }

    #[test]
    fn test_fortress_aura_follows_range() {
        let mut w = world();
        scripted_pair(&mut w);
        w.colonies.get_mut(&1).unwrap().fortress = true;
        let queen_pos = w.unit(w.colony(1).unwrap().queen).unwrap().position;
        let soldier = w.spawn_body(1, UnitKind::Soldier, queen_pos, &mut Discard).unwrap();
        let outsider = w.spawn_body(2, UnitKind::Soldier, queen_pos, &mut Discard).unwrap();
        let base = w.unit(soldier).unwrap().attack;

        w.apply_fortress(soldier);
        w.apply_fortress(soldier);
        assert_eq!(w.unit(soldier).unwrap().attack, base + 15);
        assert!(w.unit(soldier).unwrap().fortress_buff);

        w.units.get_mut(&soldier).unwrap().position = queen_pos + Vec2::new(29.0, 0.0);
        w.apply_fortress(soldier);
        assert_eq!(w.unit(soldier).unwrap().attack, base + 15);

        w.units.get_mut(&soldier).unwrap().position = queen_pos + Vec2::new(31.0, 0.0);
        w.apply_fortress(soldier);
        w.apply_fortress(soldier);
        assert_eq!(w.unit(soldier).unwrap().attack, base);
        assert!(!w.unit(soldier).unwrap().fortress_buff);

        w.units.get_mut(&soldier).unwrap().position = queen_pos;
        w.apply_fortress(soldier);
        assert_eq!(w.unit(soldier).unwrap().attack, base + 15);

        // Another team's ant at the same spot gets nothing.
        let before = w.unit(outsider).unwrap().attack;
        w.units.get_mut(&outsider).unwrap().position = queen_pos;
        w.apply_fortress(outsider);
        assert_eq!(w.unit(outsider).unwrap().attack, before);
    }

    #[test]
    fn test_first_aid_heals_two_per_second() {
        let mut w = world();
        scripted_pair(&mut w);
        let soldier = w.spawn_body(1, UnitKind::Soldier, Vec2::ZERO, &mut Discard).unwrap();
        let max = w.unit(soldier).unwrap().health.max;
        w.apply_damage(soldier, 5.0, &mut Discard);

        w.apply_first_aid(soldier, 1.0, &mut Discard);
        let wounded = w.unit(soldier).unwrap().health.current;
        assert!((wounded - (max - 5.0)).abs() < 1e-3, "no heal without the upgrade");

        w.units.get_mut(&soldier).unwrap().first_aid = true;
        w.apply_first_aid(soldier, 0.5, &mut Discard);
        assert!((w.unit(soldier).unwrap().health.current - wounded).abs() < 1e-3);
        w.apply_first_aid(soldier, 0.5, &mut Discard);
        assert!((w.unit(soldier).unwrap().health.current - (wounded + 2.0)).abs() < 1e-3);
        w.apply_first_aid(soldier, 1.0, &mut Discard);
        w.apply_first_aid(soldier, 1.0, &mut Discard);
        assert!((w.unit(soldier).unwrap().health.current - max).abs() < 1e-3);
    }

    #[test]
    fn test_last_stand_fires_once() {
        let mut w = world();
        scripted_pair(&mut w);
        w.colonies.get_mut(&1).unwrap().last_stand = true;
        let queen = w.colony(1).unwrap().queen;

        w.apply_damage(queen, 240.0, &mut Discard);
        w.tick(&mut Discard);
        assert_eq!(w.colony(1).unwrap().total_soldiers, 0, "76% is above the threshold");

        w.apply_damage(queen, 20.0, &mut Discard);
        w.tick(&mut Discard);
        let colony = w.colony(1).unwrap();
        assert_eq!(colony.total_soldiers, 10);
        assert!(!colony.last_stand);
        let soldiers = w
            .units()
            .filter(|u| u.team == 1 && u.kind == UnitKind::Soldier)
            .count();
        assert_eq!(soldiers, 10);
        assert!(crate::game::check_invariants(&w).is_empty());

        w.apply_damage(queen, 300.0, &mut Discard);
        for _ in 0..20 {
            w.tick(&mut Discard);
        }
        assert_eq!(w.colony(1).unwrap().total_soldiers, 10);
        assert!(crate::game::check_invariants(&w).is_empty());
    }
}
