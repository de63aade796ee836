//! Game layer for antwar.
//!
//! Implements the colony rules:
//! - Units, colonies and food on an open plane
//! - The per-ant decision ladder and player markers
//! - Economy (income, purchases, upgrades) and AI strategy
//! - Combat with delayed hits and idempotent death handling
//! - The world tick that orchestrates all of it

mod colony;
mod combat;
mod decision;
pub mod economy;
mod events;
mod food;
mod geometry;
mod invariants;
mod marker;
mod movement;
mod player;
mod state;
pub mod strategy;
mod unit;
mod upgrades;

pub use colony::{Colony, MAX_TEAMS, TeamId};
pub use combat::{DamageOutcome, Fatality, Health};
pub use decision::{
    Action, Behavior, Decision, FAR_AWAY, MarkerSighting, Perception, Sighting, UnitMemory, Wander,
    decide, update_path_buff,
};
pub use events::{Discard, Effect, EffectsSink, Scheduled, Scheduler, TraceEffects};
pub use food::{FoodId, FoodPellet, FoodSpawner, PELLET_VALUE, delivered_amount};
pub use geometry::Vec2;
pub use invariants::{InvariantViolation, check_invariants};
pub use marker::{
    Command, MARKER_QUOTAS, MIN_MARKER_SEPARATION, Marker, MarkerBoard, MarkerId, NoOrders,
    OrderSource,
};
pub use movement::{Navigator, Steer, StraightLine, steer};
pub use player::{Controller, Difficulty, PlayerAction};
pub use state::{ColonySetup, Elimination, MatchOutcome, World};
pub use strategy::{RivalView, StrategicCommand, StrategyPhase};
pub use unit::{Species, Unit, UnitId, UnitKind};
pub use upgrades::{Upgrade, purchase_blocker, scale_attack};
