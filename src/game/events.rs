//! Delayed events and presentation effects.
//!
//! Attacks are not instantaneous: the hit lands after a windup and the attack
//! animation ends after a short recovery. Both are queued on the
//! [`Scheduler`] and fire on the first tick whose clock has reached them.
//!
//! Presentation (animations, sounds, particles) is pushed into an
//! [`EffectsSink`]. The simulation only ever writes to the sink and never
//! reads anything back, so a headless run passes [`Discard`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;
use tracing::trace;

use crate::game::{TeamId, UnitId, Vec2};

/// Something the simulation asks the presentation layer to show or play.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Toggle an animation flag on a unit.
    Animation {
        /// The unit.
        unit: UnitId,
        /// Flag name.
        name: &'static str,
        /// New value.
        active: bool,
    },
    /// Play a sound for a team.
    Sound {
        /// Team the sound concerns.
        team: TeamId,
        /// Sound name.
        name: &'static str,
    },
    /// Spawn a particle burst.
    Particles {
        /// Where.
        position: Vec2,
        /// Particle system name.
        name: &'static str,
    },
}

/// Receiver for presentation effects.
pub trait EffectsSink {
    /// Show or play `effect`.
    fn trigger(&mut self, effect: Effect);
}

/// Drops every effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl EffectsSink for Discard {
    fn trigger(&mut self, _effect: Effect) {}
}

/// Logs every effect at trace level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceEffects;

impl EffectsSink for TraceEffects {
    fn trigger(&mut self, effect: Effect) {
        trace!(?effect, "effect");
    }
}

impl EffectsSink for Vec<Effect> {
    fn trigger(&mut self, effect: Effect) {
        self.push(effect);
    }
}

/// A deferred consequence of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scheduled {
    /// The attacker's hit lands on the target.
    Strike {
        /// Who attacked.
        attacker: UnitId,
        /// Who gets hit.
        target: UnitId,
    },
    /// The attacker's attack animation ends.
    Recover {
        /// Who attacked.
        unit: UnitId,
    },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    due: f32,
    seq: u64,
    event: Scheduled,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap pops the earliest entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Time-ordered queue of deferred events. Ties fire in scheduling order.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Scheduler {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` to fire at match time `due`.
    pub fn schedule(&mut self, due: f32, event: Scheduled) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry { due, seq, event });
    }

    /// Pop every event due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: f32) -> Vec<Scheduled> {
        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|entry| entry.due <= now) {
            if let Some(entry) = self.queue.pop() {
                due.push(entry.event);
            }
        }
        due
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_time_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(0.35, Scheduled::Recover { unit: UnitId(1) });
        scheduler.schedule(
            0.25,
            Scheduled::Strike {
                attacker: UnitId(1),
                target: UnitId(2),
            },
        );
        assert!(scheduler.drain_due(0.2).is_empty());
        assert_eq!(
            scheduler.drain_due(0.3),
            vec![Scheduled::Strike {
                attacker: UnitId(1),
                target: UnitId(2)
            }]
        );
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.drain_due(1.0), vec![Scheduled::Recover { unit: UnitId(1) }]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut scheduler = Scheduler::new();
        for id in 0..5 {
            scheduler.schedule(1.0, Scheduled::Recover { unit: UnitId(id) });
        }
        let drained = scheduler.drain_due(1.0);
        let ids: Vec<u32> = drained
            .into_iter()
            .map(|e| match e {
                Scheduled::Recover { unit } => unit.0,
                Scheduled::Strike { .. } => u32::MAX,
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_recording_sink() {
        let mut sink: Vec<Effect> = Vec::new();
        sink.trigger(Effect::Sound { team: 1, name: "Spawn" });
        Discard.trigger(Effect::Sound { team: 1, name: "Spawn" });
        assert_eq!(sink.len(), 1);
    }
}
