//! Food pellets and the spawners that scatter them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::Vec2;

/// Food value of a freshly spawned pellet.
pub const PELLET_VALUE: i32 = 10;

/// Stable identifier of a food pellet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodId(pub u32);

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// A pellet on the ground or in an ant's mandibles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodPellet {
    /// Identifier.
    pub id: FoodId,
    /// Position; follows the carrier while carried.
    pub position: Vec2,
    /// Whether some ant holds it.
    pub carried: bool,
    /// Food credited on delivery before the carrier's multiplier.
    pub value: i32,
}

impl FoodPellet {
    /// A free pellet with the default value.
    #[must_use]
    pub const fn new(id: FoodId, position: Vec2) -> Self {
        Self {
            id,
            position,
            carried: false,
            value: PELLET_VALUE,
        }
    }
}

/// Food credited when a pellet worth `value` is delivered by a carrier with
/// multiplier `food_mult`. Halves round to even.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn delivered_amount(value: i32, food_mult: f32) -> i32 {
    (value as f32 * food_mult).round_ties_even() as i32
}

/// Periodically drops batches of pellets around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodSpawner {
    /// Centre of the drop area.
    pub position: Vec2,
    /// Pellets per batch.
    #[serde(default = "default_batch")]
    pub batch_size: u32,
    /// Seconds between batches.
    #[serde(default = "default_interval")]
    pub interval: f32,
    /// Pellets land within this half-extent of the centre.
    #[serde(default = "default_spread")]
    pub spread: f32,
    #[serde(skip)]
    timer: Option<f32>,
}

const fn default_batch() -> u32 {
    5
}

const fn default_interval() -> f32 {
    15.0
}

const fn default_spread() -> f32 {
    10.0
}

impl FoodSpawner {
    /// A spawner with the standard batch size, interval and spread.
    #[must_use]
    pub const fn new(position: Vec2) -> Self {
        Self {
            position,
            batch_size: default_batch(),
            interval: default_interval(),
            spread: default_spread(),
            timer: None,
        }
    }

    /// Advance by `dt` seconds and return how many pellets to drop now.
    ///
    /// The first batch drops on the first call.
    pub fn advance(&mut self, dt: f32) -> u32 {
        match self.timer.as_mut() {
            None => {
                self.timer = Some(0.0);
                self.batch_size
            }
            Some(timer) => {
                *timer += dt;
                if *timer >= self.interval {
                    *timer -= self.interval;
                    self.batch_size
                } else {
                    0
                }
            }
        }
    }
}
