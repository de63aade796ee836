//! Colony economy: passive income and automatic unit purchases.
//!
//! # Purchase policy
//!
//! AI colonies spend greedily every tick while they can afford a worker:
//!
//! - below the early limit (5 units) they buy workers;
//! - up to the balanced limit (30 units) they buy a soldier whenever
//!   soldiers are fewer than half the workers, and a worker otherwise;
//! - beyond that, only soldiers.
//!
//! If the policy wants a soldier it cannot afford, spending stops for the
//! tick instead of falling back to a worker.

use crate::config::EconomyTuning;
use crate::game::{Colony, Controller, Species, UnitKind};

/// Passive income per payment for a colony.
#[must_use]
pub fn passive_income(colony: &Colony, tuning: &EconomyTuning) -> i32 {
    match (colony.controller, colony.species) {
        (Controller::Ai { difficulty }, Species::Black) => tuning.ai_black_income[difficulty.index()],
        (Controller::Ai { difficulty }, Species::Fire) => tuning.ai_fire_income[difficulty.index()],
        (_, Species::Black) => tuning.player_black_income,
        (_, Species::Fire) if colony.aphid_farming => tuning.aphid_farming_income,
        (_, Species::Fire) => tuning.player_fire_income,
    }
}

/// Advance the income timer by `dt` and credit any payments that fell due.
///
/// Returns the food credited.
pub fn accrue_income(colony: &mut Colony, dt: f32, tuning: &EconomyTuning) -> i32 {
    if tuning.income_interval <= 0.0 {
        return 0;
    }
    colony.income_timer += dt;
    let mut credited = 0;
    while colony.income_timer >= tuning.income_interval {
        colony.income_timer -= tuning.income_interval;
        credited += passive_income(colony, tuning);
    }
    colony.food += credited;
    credited
}

/// What the purchase policy buys next, or `None` to stop spending.
#[must_use]
pub fn next_purchase(colony: &Colony, tuning: &EconomyTuning) -> Option<UnitKind> {
    if colony.food < colony.costs.worker {
        return None;
    }
    let size = colony.colony_size();
    let soldier_affordable = colony.food >= colony.costs.soldier;
    if size < tuning.early_worker_limit {
        Some(UnitKind::Worker)
    } else if size < tuning.balanced_growth_limit {
        if colony.total_soldiers.saturating_mul(2) < colony.total_workers {
            soldier_affordable.then_some(UnitKind::Soldier)
        } else {
            Some(UnitKind::Worker)
        }
    } else {
        soldier_affordable.then_some(UnitKind::Soldier)
    }
}

/// Spend greedily by the purchase policy. Returns the units bought in order.
pub fn spend(colony: &mut Colony, tuning: &EconomyTuning) -> Vec<UnitKind> {
    let mut bought = Vec::new();
    while let Some(kind) = next_purchase(colony, tuning) {
        if colony.try_purchase(kind).is_err() {
            break;
        }
        bought.push(kind);
    }
    bought
}

/// The fire ant opening gift: a few workers paid for by crediting their price
/// first. Runs once per colony. Returns the workers that joined.
pub fn initial_wave(colony: &mut Colony, tuning: &EconomyTuning) -> Vec<UnitKind> {
    if colony.initial_wave_done {
        return Vec::new();
    }
    colony.initial_wave_done = true;
    if colony.species != Species::Fire {
        return Vec::new();
    }
    let mut joined = Vec::new();
    for _ in 0..tuning.initial_wave {
        colony.food += colony.costs.worker;
        if colony.try_purchase(UnitKind::Worker).is_ok() {
            joined.push(UnitKind::Worker);
        }
    }
    joined
}

/// Kani proofs for the purchase policy.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;
    use crate::game::{Difficulty, UnitId, Vec2};

    fn any_colony(tuning: &EconomyTuning) -> Colony {
        let mut colony = Colony::new(
            1,
            Species::Black,
            Controller::Ai {
                difficulty: Difficulty::Hard,
            },
            Vec2::ZERO,
            UnitId(0),
            tuning,
        );
        colony.food = kani::any();
        colony.total_workers = kani::any();
        colony.total_soldiers = kani::any();
        colony
    }

    /// The policy never overflows and only picks what the colony can pay for.
    #[kani::proof]
    fn prove_next_purchase_affordable() {
        let tuning = EconomyTuning::default();
        let colony = any_colony(&tuning);
        if let Some(kind) = next_purchase(&colony, &tuning) {
            let cost = colony.costs.of(kind);
            assert!(cost.is_some_and(|cost| cost <= colony.food));
        }
    }

    /// Counting a loss never wraps below zero.
    #[kani::proof]
    fn prove_record_loss_saturates() {
        let tuning = EconomyTuning::default();
        let mut colony = any_colony(&tuning);
        let before = colony.colony_size();
        colony.record_loss(UnitKind::Soldier);
        assert!(colony.colony_size() <= before);
    }
}
