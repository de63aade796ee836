//! Movement: the navigator capability and destination rate limiting.
//!
//! The decision engine only picks targets. Pathfinding belongs to whatever
//! navigator the host plugs in; the headless default walks in straight lines.

use std::fmt;

use crate::game::Vec2;

/// Moves bodies toward their destinations.
pub trait Navigator: fmt::Debug + Send + Sync {
    /// Where a body at `position` heading for `destination` at `speed` ends up
    /// after `dt` seconds.
    fn advance(&self, position: Vec2, destination: Vec2, speed: f32, dt: f32) -> Vec2;
}

/// Walks straight at the destination on open ground.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl Navigator for StraightLine {
    fn advance(&self, position: Vec2, destination: Vec2, speed: f32, dt: f32) -> Vec2 {
        position.move_towards(destination, speed * dt)
    }
}

/// Result of one steering step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steer {
    /// A new destination was handed to the navigator.
    Issued(Vec2),
    /// Still heading for the previous destination.
    Continuing,
    /// Close enough to the target; the body stops.
    Arrived,
}

/// Rate-limit destination updates: a new destination is issued at most once
/// per `delay` seconds, and bodies within `tolerance` of the target stop.
pub fn steer(
    position: Vec2,
    target: Vec2,
    timer: &mut f32,
    dt: f32,
    delay: f32,
    tolerance: f32,
) -> Steer {
    if position.distance(target) < tolerance {
        return Steer::Arrived;
    }
    if *timer >= delay {
        *timer -= delay;
        Steer::Issued(target)
    } else {
        *timer += dt;
        Steer::Continuing
    }
}
