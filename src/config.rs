//! Match configuration: game variant, tuning tables and rules files.
//!
//! Every threshold the simulation uses lives in [`Rules`]. A rules file is a
//! TOML document naming a `variant` plus any overrides; missing keys fall back
//! to the preset for that variant.
//!
//! ```toml
//! variant = "multiplayer"
//!
//! [economy]
//! starting_food = 150
//!
//! [decision]
//! attack_range = 3.0
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::game::UnitKind;

/// Default simulation rate (20 ticks per second).
pub const DEFAULT_TICK_SECONDS: f32 = 0.05;

/// Default tick limit (five minutes at 20 Hz).
pub const DEFAULT_MAX_TICKS: u64 = 6000;

/// Which flavour of the game the rules describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Scripted training ground; ants just fight whatever is nearest.
    Tutorial,
    /// Local match against probabilistic AI colonies.
    #[default]
    Singleplayer,
    /// Networked match; AI colonies use the eligibility strategy.
    Multiplayer,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tutorial => "tutorial",
            Self::Singleplayer => "singleplayer",
            Self::Multiplayer => "multiplayer",
        };
        f.write_str(name)
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tutorial" => Ok(Self::Tutorial),
            "singleplayer" | "single" => Ok(Self::Singleplayer),
            "multiplayer" | "multi" => Ok(Self::Multiplayer),
            other => Err(format!("unknown variant '{other}'")),
        }
    }
}

/// Which decision ladder ants run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionProfile {
    /// The full priority ladder with orders, food and strategy.
    #[default]
    Full,
    /// Engage the nearest enemy, otherwise hold position.
    Tutorial,
}

/// Which strategy AI colonies use to pick attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Deterministic check against the weakest and strongest rivals.
    Eligibility,
    /// Timed preparing and attacking phases with a strength-weighted dice roll.
    #[default]
    Probabilistic,
}

/// Thresholds and timings for the unit decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTuning {
    /// Ladder variant.
    pub profile: DecisionProfile,
    /// Enemies inside this range are hit instead of chased.
    pub attack_range: f32,
    /// Pellets inside this range are picked up.
    pub pickup_range: f32,
    /// Carried food is delivered inside this range of the queen.
    pub queen_range: f32,
    /// Enemies and food further than this are not perceived.
    pub sight_range: f32,
    /// Seconds between attacks.
    pub attack_delay: f32,
    /// Seconds from starting an attack to the hit landing.
    pub attack_windup: f32,
    /// Seconds from the hit landing to the attack animation ending.
    pub attack_recovery: f32,
    /// Seconds between movement destination updates.
    pub movement_delay: f32,
    /// Units closer than this to their target stop.
    pub arrival_tolerance: f32,
    /// Base period for picking a new wander point.
    pub wander_period: f32,
    /// Upper bound of the random delay added to wander periods.
    pub max_jitter: f32,
    /// Seconds between redraws of the random delay.
    pub jitter_refresh: f32,
    /// Half-extent of the wander box around the player or nest.
    pub wander_spread: f32,
    /// Followers idle once this close to the player.
    pub player_idle_radius: f32,
    /// Retreating ants idle once this close to the nest.
    pub nest_idle_radius: f32,
    /// Distance ahead along a marker heading that path followers aim for.
    pub direction_lookahead: f32,
    /// Half-extent of the jitter applied to the path-following point.
    pub direction_jitter: f32,
    /// Markers closer than this are followed rather than approached.
    pub marker_reach: f32,
    /// Enemy clearance required to keep following the player, and for gather paths.
    pub follow_clearance: f32,
    /// Enemy clearance required to obey a retreat marker.
    pub retreat_clearance: f32,
    /// Enemy and food clearance required to follow forage and guard paths.
    pub path_clearance: f32,
    /// Enemy and food clearance required to obey the colony strategy.
    pub strategic_clearance: f32,
    /// Carriers this far from the queen follow a return path instead.
    pub return_path_queen_distance: f32,
    /// How much closer food must be than an enemy for soldiers to collect it.
    pub soldier_food_bias: f32,
    /// Speed multiplier while on a path marker.
    pub path_speed_bonus: f32,
}

impl Default for DecisionTuning {
    fn default() -> Self {
        Self {
            profile: DecisionProfile::Full,
            attack_range: 2.5,
            pickup_range: 2.0,
            queen_range: 5.0,
            sight_range: 9999.0,
            attack_delay: 1.0,
            attack_windup: 0.25,
            attack_recovery: 0.10,
            movement_delay: 0.1,
            arrival_tolerance: 0.1,
            wander_period: 4.0,
            max_jitter: 2.0,
            jitter_refresh: 0.1,
            wander_spread: 8.0,
            player_idle_radius: 10.0,
            nest_idle_radius: 20.0,
            direction_lookahead: 5.0,
            direction_jitter: 2.0,
            marker_reach: 10.0,
            follow_clearance: 3.0,
            retreat_clearance: 8.0,
            path_clearance: 10.0,
            strategic_clearance: 8.0,
            return_path_queen_distance: 15.0,
            soldier_food_bias: 15.0,
            path_speed_bonus: 1.2,
        }
    }
}

/// Purchase prices for each unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitCosts {
    /// Worker price.
    pub worker: i32,
    /// Soldier price.
    pub soldier: i32,
    /// Super soldier price, once unlocked.
    pub super_soldier: i32,
}

impl Default for UnitCosts {
    fn default() -> Self {
        Self {
            worker: 25,
            soldier: 50,
            super_soldier: 200,
        }
    }
}

impl UnitCosts {
    /// Price of `kind`, or `None` for units that cannot be bought.
    #[must_use]
    pub const fn of(&self, kind: UnitKind) -> Option<i32> {
        match kind {
            UnitKind::Worker => Some(self.worker),
            UnitKind::Soldier => Some(self.soldier),
            UnitKind::SuperSoldier => Some(self.super_soldier),
            UnitKind::Queen | UnitKind::Avatar => None,
        }
    }
}

/// Colony economy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    /// Food a colony starts with.
    pub starting_food: i32,
    /// Initial maximum colony size.
    pub max_colony_size: u32,
    /// Unit prices.
    pub costs: UnitCosts,
    /// Seconds between passive income payments.
    pub income_interval: f32,
    /// Passive income of a black ant player colony.
    pub player_black_income: i32,
    /// Passive income of a fire ant player colony.
    pub player_fire_income: i32,
    /// Passive income of a fire ant player colony with aphid farming.
    pub aphid_farming_income: i32,
    /// AI black ant income by difficulty (easy, medium, hard).
    pub ai_black_income: [i32; 3],
    /// AI fire ant income by difficulty (easy, medium, hard).
    pub ai_fire_income: [i32; 3],
    /// Workers below this colony size are always bought first.
    pub early_worker_limit: u32,
    /// Up to this colony size soldiers are bought only to keep the ratio.
    pub balanced_growth_limit: u32,
    /// Workers gifted to a fire ant colony at the start of the match.
    pub initial_wave: u32,
    /// Spawn positions are jittered by this much on each axis.
    pub spawn_jitter: f32,
    /// Food a dead player pays to respawn.
    pub avatar_respawn_cost: i32,
    /// Soldiers raised by the last stand upgrade.
    pub last_stand_soldiers: u32,
    /// Queen health fraction below which last stand fires.
    pub last_stand_threshold: f32,
    /// Queen health restored per second by the fortress upgrade.
    pub fortress_heal: f32,
    /// Radius around the queen in which the fortress bonus applies.
    pub fortress_range: f32,
    /// Attack bonus inside the fortress radius.
    pub fortress_attack_bonus: i32,
    /// Health restored per second by first aid.
    pub first_aid_heal: f32,
    /// Maximum colony size increase from the capacity upgrade.
    pub capacity_bonus: u32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            starting_food: 100,
            max_colony_size: 50,
            costs: UnitCosts::default(),
            income_interval: 1.0,
            player_black_income: 1,
            player_fire_income: 0,
            aphid_farming_income: 1,
            ai_black_income: [1, 2, 3],
            ai_fire_income: [0, 1, 2],
            early_worker_limit: 5,
            balanced_growth_limit: 30,
            initial_wave: 4,
            spawn_jitter: 2.0,
            avatar_respawn_cost: 30,
            last_stand_soldiers: 10,
            last_stand_threshold: 0.75,
            fortress_heal: 5.0,
            fortress_range: 30.0,
            fortress_attack_bonus: 15,
            first_aid_heal: 2.0,
            capacity_bonus: 10,
        }
    }
}

/// AI strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyTuning {
    /// Strategy family.
    pub kind: StrategyKind,
    /// Enemies inside this radius of the queen trigger a retreat.
    pub nest_alert_radius: f32,
    /// Shortest preparing phase in seconds.
    pub prepare_min: f32,
    /// Longest preparing phase in seconds.
    pub prepare_max: f32,
    /// Shortest attack in seconds.
    pub attack_min: f32,
    /// Longest attack in seconds.
    pub attack_max: f32,
    /// The attack roll is `uniform(0, 1) * roll_scale < chance`.
    pub roll_scale: f32,
}

impl Default for StrategyTuning {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Probabilistic,
            nest_alert_radius: 10.0,
            prepare_min: 10.0,
            prepare_max: 30.0,
            attack_min: 15.0,
            attack_max: 50.0,
            roll_scale: 4.0,
        }
    }
}

/// Base statistics for one unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum health.
    pub health: f32,
    /// Damage per hit.
    pub attack: i32,
    /// Movement speed in units per second.
    pub speed: f32,
}

/// Base statistics for every unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStatsTable {
    /// Worker stats.
    pub worker: UnitStats,
    /// Soldier stats.
    pub soldier: UnitStats,
    /// Super soldier stats.
    pub super_soldier: UnitStats,
    /// Queen stats; queens never move.
    pub queen: UnitStats,
    /// Player avatar stats.
    pub avatar: UnitStats,
}

impl Default for UnitStatsTable {
    fn default() -> Self {
        Self {
            worker: UnitStats {
                health: 50.0,
                attack: 10,
                speed: 3.5,
            },
            soldier: UnitStats {
                health: 100.0,
                attack: 30,
                speed: 3.5,
            },
            super_soldier: UnitStats {
                health: 250.0,
                attack: 60,
                speed: 3.0,
            },
            queen: UnitStats {
                health: 1000.0,
                attack: 0,
                speed: 0.0,
            },
            avatar: UnitStats {
                health: 200.0,
                attack: 30,
                speed: 6.0,
            },
        }
    }
}

impl UnitStatsTable {
    /// Stats for `kind`.
    #[must_use]
    pub const fn for_kind(&self, kind: UnitKind) -> UnitStats {
        match kind {
            UnitKind::Worker => self.worker,
            UnitKind::Soldier => self.soldier,
            UnitKind::SuperSoldier => self.super_soldier,
            UnitKind::Queen => self.queen,
            UnitKind::Avatar => self.avatar,
        }
    }
}

/// The full rule set for a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_copy_implementations)] // large; shared by reference
#[serde(default)]
pub struct Rules {
    /// Variant the presets were taken from.
    pub variant: Variant,
    /// Decision engine tuning.
    pub decision: DecisionTuning,
    /// Economy tuning.
    pub economy: EconomyTuning,
    /// AI strategy tuning.
    pub strategy: StrategyTuning,
    /// Unit base stats.
    pub stats: UnitStatsTable,
}

impl Default for Rules {
    fn default() -> Self {
        Self::for_variant(Variant::Singleplayer)
    }
}

impl Rules {
    /// Preset rules for a variant.
    #[must_use]
    pub fn for_variant(variant: Variant) -> Self {
        let mut rules = Self {
            variant,
            decision: DecisionTuning::default(),
            economy: EconomyTuning::default(),
            strategy: StrategyTuning::default(),
            stats: UnitStatsTable::default(),
        };
        match variant {
            Variant::Tutorial => {
                rules.decision.profile = DecisionProfile::Tutorial;
            }
            Variant::Singleplayer => {}
            Variant::Multiplayer => {
                rules.strategy.kind = StrategyKind::Eligibility;
                rules.strategy.nest_alert_radius = 20.0;
                rules.economy.ai_fire_income = [0, 0, 1];
            }
        }
        rules
    }

    /// Parse rules from TOML text, layering overrides over the preset named
    /// by its `variant` key, or the singleplayer preset when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or does not match the
    /// rules schema.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        Self::from_toml_str_over(text, Variant::default())
    }

    /// Parse rules from TOML text, layering overrides over the preset named
    /// by its `variant` key, or over `fallback` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or does not match the
    /// rules schema.
    pub fn from_toml_str_over(text: &str, fallback: Variant) -> SimResult<Self> {
        let overrides: toml::Table = toml::from_str(text)?;
        let variant = match overrides.get("variant") {
            Some(value) => value.clone().try_into::<Variant>()?,
            None => fallback,
        };
        let base = toml::Value::try_from(Self::for_variant(variant))?;
        let merged = merge(base, toml::Value::Table(overrides));
        Ok(merged.try_into()?)
    }

    /// Load rules from a TOML file over the singleplayer preset.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> SimResult<Self> {
        Self::load_over(path, Variant::default())
    }

    /// Load rules from a TOML file over the `fallback` preset.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_over(path: &Path, fallback: Variant) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str_over(&text, fallback)
    }
}

/// Overlay `over` onto `base`, merging tables key by key.
fn merge(base: toml::Value, over: toml::Value) -> toml::Value {
    match (base, over) {
        (toml::Value::Table(mut base), toml::Value::Table(over)) => {
            for (key, value) in over {
                let merged = match base.remove(&key) {
                    Some(existing) => merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            toml::Value::Table(base)
        }
        (_, over) => over,
    }
}

/// Configuration for running a single match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_copy_implementations)] // large; shared by reference
#[serde(default)]
pub struct MatchConfig {
    /// The match ends undecided-by-elimination after this many ticks.
    pub max_ticks: u64,
    /// Simulated seconds per tick.
    pub tick_seconds: f32,
    /// Game rules.
    pub rules: Rules,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_ticks: DEFAULT_MAX_TICKS,
            tick_seconds: DEFAULT_TICK_SECONDS,
            rules: Rules::default(),
        }
    }
}

impl MatchConfig {
    /// Default configuration for a variant.
    #[must_use]
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            rules: Rules::for_variant(variant),
            ..Self::default()
        }
    }
}
