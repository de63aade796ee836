//! Unit decision engine.
//!
//! Each tick every ant turns what it perceives into a movement target and at
//! most one action. The rungs of the ladder are tried top to bottom and the
//! first that applies wins:
//!
//! 1. Carrying, on a return path, far from the queen: follow the path.
//! 2. Carrying: head for the queen and deliver when in range.
//! 3. Point orders: follow player, retreat, attack, gather.
//! 4. Path orders: forage, guard and gather paths.
//! 5. No marker: obey the colony's attack or retreat strategy.
//! 6. Defaults: food if it is closer than the enemy, else the enemy, else home.
//!
//! Decisions are pure apart from the unit's own [`UnitMemory`] and random
//! stream, so every ant can be planned in parallel.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{DecisionProfile, DecisionTuning};
use crate::game::{Command, FoodId, Marker, StrategicCommand, UnitId, UnitKind, Vec2};

/// Distance reported when nothing of a kind is in sight.
pub const FAR_AWAY: f32 = 9999.0;

/// Something sensed at a distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting<Id> {
    /// What was seen.
    pub id: Id,
    /// Where it is.
    pub position: Vec2,
    /// How far away it is.
    pub distance: f32,
}

/// The governing marker as seen by one ant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSighting {
    /// The order.
    pub command: Command,
    /// Marker position.
    pub position: Vec2,
    /// Marker heading as a unit vector.
    pub direction: Vec2,
    /// Distance from the ant.
    pub distance: f32,
}

impl MarkerSighting {
    /// How `marker` looks from `from`.
    #[must_use]
    pub fn new(marker: &Marker, from: Vec2) -> Self {
        Self {
            command: marker.command,
            position: marker.position,
            direction: marker.direction(),
            distance: marker.position.distance(from),
        }
    }

    /// Whether the marker is a path.
    #[must_use]
    pub const fn is_path(&self) -> bool {
        self.command.is_path()
    }

    /// Whether `position` lies behind the marker, where its path begins.
    #[must_use]
    pub fn is_entry_side(&self, position: Vec2) -> bool {
        let to_ant = (position - self.position).normalized();
        self.direction.dot(to_ant) < 0.0
    }
}

/// Everything an ant knows when deciding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    /// The ant's position.
    pub position: Vec2,
    /// The ant's kind.
    pub kind: UnitKind,
    /// Pellet being carried.
    pub carrying: Option<FoodId>,
    /// Nearest enemy unit.
    pub enemy: Option<Sighting<UnitId>>,
    /// Nearest free pellet.
    pub food: Option<Sighting<FoodId>>,
    /// Governing marker.
    pub marker: Option<MarkerSighting>,
    /// Position of the colony's queen.
    pub queen: Vec2,
    /// The colony's nest rally point.
    pub nest: Vec2,
    /// Position of the colony's player, if any.
    pub player: Option<Vec2>,
    /// Colony strategy.
    pub strategic: StrategicCommand,
    /// Where the colony strategy wants to attack.
    pub attack_location: Vec2,
}

impl Perception {
    /// Current order; automatic when no marker governs.
    #[must_use]
    pub fn order(&self) -> Command {
        self.marker.map_or(Command::Automatic, |m| m.command)
    }

    fn enemy_distance(&self) -> f32 {
        self.enemy.map_or(FAR_AWAY, |e| e.distance)
    }

    fn food_distance(&self) -> f32 {
        self.food.map_or(FAR_AWAY, |f| f.distance)
    }
}

/// A one-shot action chosen alongside the movement target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start an attack on this unit.
    Attack(UnitId),
    /// Pick up this pellet.
    Pickup(FoodId),
    /// Deliver the carried pellet to the queen.
    Deposit(FoodId),
}

/// Which behaviour produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Walking along a path marker's heading.
    FollowPath,
    /// Walking to the entry side of a path marker.
    ApproachMarker,
    /// Bringing food to the queen.
    FeedQueen,
    /// Staying near the player.
    FollowPlayer,
    /// Falling back to the nest.
    ReturnToNest,
    /// Closing in on or hitting an enemy.
    Engage,
    /// Going for food.
    Gather,
    /// Marching on the strategic attack location.
    March,
    /// Standing still.
    Hold,
}

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Where to move.
    pub target: Vec2,
    /// Point to face instead of the movement direction.
    pub facing: Option<Vec2>,
    /// Optional one-shot action.
    pub action: Option<Action>,
    /// Behaviour that was chosen.
    pub behavior: Behavior,
}

impl Decision {
    const fn go(target: Vec2, behavior: Behavior) -> Self {
        Self {
            target,
            facing: None,
            action: None,
            behavior,
        }
    }
}

/// Timer and current point of one wander behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wander {
    timer: f32,
    point: Option<Vec2>,
}

/// Decision state an ant keeps between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitMemory {
    /// Seconds since the last attack.
    pub attack_timer: f32,
    /// Random extra delay added to wander periods.
    pub delay_increase: f32,
    delay_timer: f32,
    follow: Wander,
    nest: Wander,
    path: Wander,
}

impl Default for UnitMemory {
    fn default() -> Self {
        Self {
            attack_timer: INITIAL_ATTACK_TIMER,
            delay_increase: 0.0,
            delay_timer: 0.0,
            follow: Wander::default(),
            nest: Wander::default(),
            path: Wander::default(),
        }
    }
}

/// Fresh ants may attack at once.
const INITIAL_ATTACK_TIMER: f32 = 5.0;

impl UnitMemory {
    /// Advance timers and periodically redraw the random delay.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f32, tuning: &DecisionTuning, rng: &mut R) {
        self.attack_timer += dt;
        self.delay_timer += dt;
        if self.delay_timer >= tuning.jitter_refresh {
            self.delay_timer = 0.0;
            self.delay_increase = if tuning.max_jitter > 0.0 {
                rng.gen_range(0.0..=tuning.max_jitter)
            } else {
                0.0
            };
        }
    }
}

/// Pick a target and action for one ant.
pub fn decide<R: Rng + ?Sized>(
    p: &Perception,
    memory: &mut UnitMemory,
    tuning: &DecisionTuning,
    dt: f32,
    rng: &mut R,
) -> Decision {
    if tuning.profile == DecisionProfile::Tutorial {
        return match p.enemy {
            Some(enemy) => engage(p, enemy, memory, tuning),
            None => Decision::go(p.position, Behavior::Hold),
        };
    }

    let order = p.order();
    let enemy_distance = p.enemy_distance();
    let food_distance = p.food_distance();

    if let Some(food) = p.carrying {
        let queen_distance = p.position.distance(p.queen);
        if order == Command::ReturnPath && queen_distance >= tuning.return_path_queen_distance {
            if let Some(decision) = take_path(p, memory, tuning, dt, rng) {
                return decision;
            }
        }
        let mut decision = Decision::go(p.queen, Behavior::FeedQueen);
        if queen_distance <= tuning.queen_range {
            decision.action = Some(Action::Deposit(food));
        }
        return decision;
    }

    match order {
        Command::FollowPlayer if enemy_distance >= tuning.follow_clearance => {
            if let Some(player) = p.player {
                let target = wander(
                    &mut memory.follow,
                    memory.delay_increase,
                    p.position,
                    player,
                    tuning.player_idle_radius,
                    tuning,
                    dt,
                    rng,
                );
                return Decision::go(target, Behavior::FollowPlayer);
            }
        }
        Command::Retreat if enemy_distance >= tuning.retreat_clearance => {
            return return_to_nest(p, memory, tuning, dt, rng);
        }
        Command::Attack => {
            if let Some(enemy) = p.enemy {
                return engage(p, enemy, memory, tuning);
            }
        }
        Command::Gather => {
            if let Some(food) = p.food {
                return gather(p, food, tuning);
            }
        }
        Command::ForagePath | Command::GuardPath | Command::GatherPath => {
            let eligible = match order {
                Command::ForagePath => {
                    enemy_distance >= tuning.path_clearance && food_distance >= tuning.path_clearance
                }
                Command::GuardPath => enemy_distance >= tuning.path_clearance && p.kind.is_soldier(),
                _ => {
                    food_distance >= tuning.path_clearance
                        && enemy_distance >= tuning.follow_clearance
                        && p.kind == UnitKind::Worker
                }
            };
            if eligible {
                if let Some(decision) = take_path(p, memory, tuning, dt, rng) {
                    return decision;
                }
            }
        }
        Command::Automatic => match p.strategic {
            StrategicCommand::Attack if enemy_distance >= tuning.strategic_clearance => {
                return Decision::go(p.attack_location, Behavior::March);
            }
            StrategicCommand::Retreat
                if enemy_distance >= tuning.strategic_clearance
                    && food_distance >= tuning.strategic_clearance =>
            {
                return return_to_nest(p, memory, tuning, dt, rng);
            }
            _ => {}
        },
        _ => {}
    }

    if let Some(food) = p.food {
        let prefers_food = match p.kind {
            UnitKind::Worker => food.distance < enemy_distance,
            UnitKind::Soldier => food.distance < enemy_distance - tuning.soldier_food_bias,
            UnitKind::SuperSoldier | UnitKind::Queen | UnitKind::Avatar => false,
        };
        if prefers_food {
            return gather(p, food, tuning);
        }
    }
    match p.enemy {
        Some(enemy) => engage(p, enemy, memory, tuning),
        None => return_to_nest(p, memory, tuning, dt, rng),
    }
}

/// Follow the governing path marker when near it, or walk to its entry side.
fn take_path<R: Rng + ?Sized>(
    p: &Perception,
    memory: &mut UnitMemory,
    tuning: &DecisionTuning,
    dt: f32,
    rng: &mut R,
) -> Option<Decision> {
    let marker = p.marker?;
    if marker.distance <= tuning.marker_reach {
        memory.path.timer += dt;
        let period = tuning.wander_period / 8.0 + memory.delay_increase / 4.0;
        let point = match memory.path.point {
            Some(point) if memory.path.timer < period => point,
            _ => {
                memory.path.timer = 0.0;
                let ahead = p.position + marker.direction * tuning.direction_lookahead;
                let point = ahead.jittered(rng, tuning.direction_jitter);
                memory.path.point = Some(point);
                point
            }
        };
        Some(Decision::go(point, Behavior::FollowPath))
    } else if marker.is_entry_side(p.position) {
        Some(Decision::go(marker.position, Behavior::ApproachMarker))
    } else {
        None
    }
}

fn return_to_nest<R: Rng + ?Sized>(
    p: &Perception,
    memory: &mut UnitMemory,
    tuning: &DecisionTuning,
    dt: f32,
    rng: &mut R,
) -> Decision {
    let target = wander(
        &mut memory.nest,
        memory.delay_increase,
        p.position,
        p.nest,
        tuning.nest_idle_radius,
        tuning,
        dt,
        rng,
    );
    Decision::go(target, Behavior::ReturnToNest)
}

/// Loiter around `anchor`: pick a new random point every wander period and
/// stand still between picks once close enough.
#[allow(clippy::too_many_arguments)]
fn wander<R: Rng + ?Sized>(
    state: &mut Wander,
    delay_increase: f32,
    position: Vec2,
    anchor: Vec2,
    idle_radius: f32,
    tuning: &DecisionTuning,
    dt: f32,
    rng: &mut R,
) -> Vec2 {
    state.timer += dt;
    let period = tuning.wander_period + delay_increase;
    match state.point {
        Some(point) if state.timer < period => {
            if state.timer >= tuning.wander_period / 2.0 && position.distance(anchor) <= idle_radius {
                position
            } else {
                point
            }
        }
        _ => {
            state.timer = 0.0;
            let point = anchor.jittered(rng, tuning.wander_spread);
            state.point = Some(point);
            point
        }
    }
}

fn engage(
    p: &Perception,
    enemy: Sighting<UnitId>,
    memory: &mut UnitMemory,
    tuning: &DecisionTuning,
) -> Decision {
    if enemy.distance > tuning.attack_range {
        return Decision::go(enemy.position, Behavior::Engage);
    }
    let action = if memory.attack_timer >= tuning.attack_delay {
        memory.attack_timer = 0.0;
        Some(Action::Attack(enemy.id))
    } else {
        None
    };
    Decision {
        target: p.position,
        facing: Some(enemy.position),
        action,
        behavior: Behavior::Engage,
    }
}

fn gather(p: &Perception, food: Sighting<FoodId>, tuning: &DecisionTuning) -> Decision {
    let mut decision = Decision::go(food.position, Behavior::Gather);
    if p.carrying.is_none() && food.distance <= tuning.pickup_range {
        decision.action = Some(Action::Pickup(food.id));
    }
    decision
}

/// Apply or lift the path speed bonus once the governing marker is known.
///
/// The bonus is applied when the governing marker is a path and lifted as
/// soon as it is not, so it never stacks.
pub fn update_path_buff(
    speed: &mut f32,
    applied: &mut bool,
    marker: Option<&MarkerSighting>,
    bonus: f32,
) {
    let on_path = marker.is_some_and(MarkerSighting::is_path);
    if on_path && !*applied {
        *speed *= bonus;
        *applied = true;
    } else if !on_path && *applied {
        *speed /= bonus;
        *applied = false;
    }
}
