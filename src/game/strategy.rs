//! Colony-level AI strategy: when to attack, whom, and when to fall back.
//!
//! Two families exist. The eligibility strategy re-evaluates every tick and
//! attacks the weakest rival whenever the colony is clearly ahead. The
//! probabilistic strategy alternates between a preparing phase and timed
//! attacks, rolling dice weighted by how far behind the strongest colony it
//! is.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{StrategyKind, StrategyTuning};
use crate::game::{Colony, TeamId, Vec2};

/// The colony-wide order ants fall back on when no marker governs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategicCommand {
    /// Nothing in particular.
    #[default]
    None,
    /// March on the attack location.
    Attack,
    /// Fall back to the nest.
    Retreat,
    /// Building up before the next attack roll.
    Preparing,
}

/// Timed phases of the probabilistic strategy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum StrategyPhase {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// Preparing until the given match time.
    Preparing {
        /// Match time the phase ends.
        until: f32,
    },
    /// Attacking until the given match time.
    Attacking {
        /// Match time the attack is called off.
        until: f32,
    },
}

/// What a colony knows about one living rival.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RivalView {
    /// Rival team.
    pub team: TeamId,
    /// Its soldier count.
    pub total_soldiers: u32,
    /// Its strength.
    pub strength: i64,
    /// Its nest.
    pub spawn_pos: Vec2,
}

/// The weakest rival by soldier count if the colony should attack it.
///
/// Attacking requires four times the weakest rival's soldiers and more than
/// half the strongest rival's.
#[must_use]
pub fn attack_eligibility(own_soldiers: u32, rivals: &[RivalView]) -> Option<&RivalView> {
    let weakest = rivals.iter().min_by_key(|r| r.total_soldiers)?;
    let strongest = rivals.iter().map(|r| r.total_soldiers).max().unwrap_or(0);
    let dominant = u64::from(weakest.total_soldiers) * 4 < u64::from(own_soldiers);
    let competitive = u64::from(own_soldiers) * 2 > u64::from(strongest);
    (dominant && competitive).then_some(weakest)
}

/// Chance factor for the attack roll given the gap to the strongest colony.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn attack_chance(top_strength_difference: i64) -> f32 {
    (200.0 - top_strength_difference as f32 / 2.0) / 200.0
}

/// How far `own_strength` trails the strongest colony, zero if it leads.
#[must_use]
pub fn top_strength_difference(own_strength: i64, rivals: &[RivalView]) -> i64 {
    let top = rivals
        .iter()
        .map(|r| r.strength)
        .fold(own_strength, i64::max);
    top - own_strength
}

/// Run one strategy step for an AI colony at match time `now`.
///
/// Returns true when the colony's command changed.
pub fn evaluate<R: Rng + ?Sized>(
    colony: &mut Colony,
    rivals: &[RivalView],
    enemies_near_nest: bool,
    now: f32,
    tuning: &StrategyTuning,
    rng: &mut R,
) -> bool {
    let before = (colony.command, colony.attack_target);
    match tuning.kind {
        StrategyKind::Eligibility => evaluate_eligibility(colony, rivals, enemies_near_nest),
        StrategyKind::Probabilistic => {
            evaluate_probabilistic(colony, rivals, enemies_near_nest, now, tuning, rng);
        }
    }
    before != (colony.command, colony.attack_target)
}

fn evaluate_eligibility(colony: &mut Colony, rivals: &[RivalView], enemies_near_nest: bool) {
    colony.command = StrategicCommand::None;
    colony.attack_target = None;
    if enemies_near_nest {
        colony.command = StrategicCommand::Retreat;
    } else if let Some(weakest) = attack_eligibility(colony.total_soldiers, rivals) {
        colony.command = StrategicCommand::Attack;
        colony.attack_location = weakest.spawn_pos;
        colony.attack_target = Some(weakest.team);
    }
}

fn evaluate_probabilistic<R: Rng + ?Sized>(
    colony: &mut Colony,
    rivals: &[RivalView],
    enemies_near_nest: bool,
    now: f32,
    tuning: &StrategyTuning,
    rng: &mut R,
) {
    if enemies_near_nest {
        colony.command = StrategicCommand::Retreat;
        colony.attack_target = None;
        colony.strategy_phase = StrategyPhase::Idle;
        return;
    }
    if colony.command == StrategicCommand::Retreat {
        colony.command = StrategicCommand::None;
    }

    match colony.strategy_phase {
        StrategyPhase::Idle => {
            let wait = uniform(rng, tuning.prepare_min, tuning.prepare_max);
            colony.strategy_phase = StrategyPhase::Preparing { until: now + wait };
            colony.command = StrategicCommand::Preparing;
        }
        StrategyPhase::Preparing { until } => {
            if now < until {
                return;
            }
            let chance = attack_chance(top_strength_difference(colony.strength(), rivals));
            let roll = rng.gen_range(0.0..1.0_f32) * tuning.roll_scale;
            if roll < chance && !rivals.is_empty() {
                let target = &rivals[rng.gen_range(0..rivals.len())];
                colony.command = StrategicCommand::Attack;
                colony.attack_location = target.spawn_pos;
                colony.attack_target = Some(target.team);
                let length = uniform(rng, tuning.attack_min, tuning.attack_max);
                colony.strategy_phase = StrategyPhase::Attacking { until: now + length };
            } else {
                colony.command = StrategicCommand::None;
                colony.strategy_phase = StrategyPhase::Idle;
            }
        }
        StrategyPhase::Attacking { until } => {
            let target_alive = colony
                .attack_target
                .is_some_and(|team| rivals.iter().any(|r| r.team == team));
            if now >= until || !target_alive {
                colony.command = StrategicCommand::None;
                colony.attack_target = None;
                colony.strategy_phase = StrategyPhase::Idle;
            }
        }
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EconomyTuning, StrategyKind};
    use crate::game::{Controller, Difficulty, Species, UnitId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rival(team: TeamId, soldiers: u32, strength: i64) -> RivalView {
        RivalView {
            team,
            total_soldiers: soldiers,
            strength,
            spawn_pos: Vec2::new(f32::from(team) * 10.0, 0.0),
        }
    }

    fn ai_colony(soldiers: u32) -> Colony {
        let mut colony = Colony::new(
            1,
            Species::Black,
            Controller::Ai {
                difficulty: Difficulty::Medium,
            },
            Vec2::ZERO,
            UnitId(0),
            &EconomyTuning::default(),
        );
        colony.total_soldiers = soldiers;
        colony
    }

    #[test]
    fn test_eligibility_examples() {
        let rivals = [rival(2, 5, 0), rival(3, 70, 0)];
        let chosen = attack_eligibility(40, &rivals).unwrap();
        assert_eq!(chosen.team, 2);

        let rivals = [rival(2, 5, 0), rival(3, 90, 0)];
        assert!(attack_eligibility(40, &rivals).is_none());

        let rivals = [rival(2, 10, 0)];
        assert!(attack_eligibility(40, &rivals).is_none());
        assert!(attack_eligibility(40, &[]).is_none());
    }

    #[test]
    fn test_attack_chance() {
        assert!((attack_chance(0) - 1.0).abs() < f32::EPSILON);
        assert!((attack_chance(200) - 0.5).abs() < f32::EPSILON);
        assert!(attack_chance(600) < 0.0);
    }

    #[test]
    fn test_top_strength_difference() {
        let rivals = [rival(2, 0, 300), rival(3, 0, 100)];
        assert_eq!(top_strength_difference(200, &rivals), 100);
        assert_eq!(top_strength_difference(500, &rivals), 0);
    }

    #[test]
    fn test_eligibility_strategy_sets_attack() {
        let mut colony = ai_colony(40);
        let rivals = [rival(2, 5, 0), rival(3, 70, 0)];
        let tuning = StrategyTuning {
            kind: StrategyKind::Eligibility,
            ..StrategyTuning::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(evaluate(&mut colony, &rivals, false, 0.0, &tuning, &mut rng));
        assert_eq!(colony.command, StrategicCommand::Attack);
        assert_eq!(colony.attack_location, Vec2::new(20.0, 0.0));

        evaluate(&mut colony, &rivals, true, 0.1, &tuning, &mut rng);
        assert_eq!(colony.command, StrategicCommand::Retreat);
    }

    #[test]
    fn test_probabilistic_phases() {
        let mut colony = ai_colony(10);
        let rivals = [rival(2, 1, 0)];
        let tuning = StrategyTuning::default();
        let mut rng = StdRng::seed_from_u64(9);

        evaluate(&mut colony, &rivals, false, 0.0, &tuning, &mut rng);
        assert_eq!(colony.command, StrategicCommand::Preparing);
        let StrategyPhase::Preparing { until } = colony.strategy_phase else {
            panic!("expected preparing phase");
        };
        assert!((10.0..=30.0).contains(&until));

        evaluate(&mut colony, &rivals, false, until - 1.0, &tuning, &mut rng);
        assert_eq!(colony.command, StrategicCommand::Preparing);

        evaluate(&mut colony, &rivals, false, until, &tuning, &mut rng);
        assert!(matches!(
            colony.command,
            StrategicCommand::Attack | StrategicCommand::None
        ));
    }

    #[test]
    fn test_probabilistic_attack_eventually_happens_and_ends() {
        let mut colony = ai_colony(10);
        let rivals = [rival(2, 1, 0)];
        let tuning = StrategyTuning {
            prepare_min: 0.0,
            prepare_max: 0.0,
            ..StrategyTuning::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let mut now = 0.0;
        let mut attacked = false;
        for _ in 0..200 {
            evaluate(&mut colony, &rivals, false, now, &tuning, &mut rng);
            if colony.command == StrategicCommand::Attack {
                attacked = true;
                break;
            }
            now += 0.05;
        }
        assert!(attacked);
        assert_eq!(colony.attack_target, Some(2));

        evaluate(&mut colony, &rivals, false, now + 60.0, &tuning, &mut rng);
        assert_eq!(colony.command, StrategicCommand::None);
        assert_eq!(colony.strategy_phase, StrategyPhase::Idle);
    }

    #[test]
    fn test_probabilistic_retreat_resets_phase() {
        let mut colony = ai_colony(10);
        let tuning = StrategyTuning::default();
        let mut rng = StdRng::seed_from_u64(2);
        evaluate(&mut colony, &[], false, 0.0, &tuning, &mut rng);
        evaluate(&mut colony, &[], true, 1.0, &tuning, &mut rng);
        assert_eq!(colony.command, StrategicCommand::Retreat);
        assert_eq!(colony.strategy_phase, StrategyPhase::Idle);
        evaluate(&mut colony, &[], false, 2.0, &tuning, &mut rng);
        assert_eq!(colony.command, StrategicCommand::Preparing);
    }
}
