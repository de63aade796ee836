//! Deterministic arena generation for tournaments.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Variant;
use crate::game::{Controller, Difficulty, FoodSpawner, MAX_TEAMS, Species, Vec2};
use crate::scenario::{ColonySpec, Scenario};

/// Nest positions, one per team slot.
pub const ARENA_NESTS: [Vec2; MAX_TEAMS] = [
    Vec2::new(0.0, 50.0),
    Vec2::new(50.0, 0.0),
    Vec2::new(0.0, -50.0),
    Vec2::new(-50.0, 0.0),
];

/// Extra spawners are scattered within this half-extent of the centre.
const SCATTER: f32 = 35.0;

/// Generate an all-AI arena for `colonies` teams (clamped to 2..=4).
///
/// Teams take the nest slots in order. Species, difficulty and the
/// scattered food spawners are drawn from `seed`; a spawner always sits at
/// the centre.
#[must_use]
pub fn generate_arena(seed: u64, colonies: usize, variant: Variant) -> Scenario {
    let mut rng = StdRng::seed_from_u64(seed);
    let count = colonies.clamp(2, MAX_TEAMS);

    let colonies = ARENA_NESTS
        .iter()
        .zip(1u8..)
        .take(count)
        .map(|(&nest, team)| {
            let species = if rng.gen_range(0..2) == 0 {
                Species::Black
            } else {
                Species::Fire
            };
            let difficulty = match rng.gen_range(0..3) {
                0 => Difficulty::Easy,
                1 => Difficulty::Medium,
                _ => Difficulty::Hard,
            };
            ColonySpec::new(team, species, Controller::Ai { difficulty }, nest)
        })
        .collect();

    let mut food_spawners = vec![FoodSpawner::new(Vec2::ZERO)];
    for _ in 0..count {
        let position = Vec2::ZERO.jittered(&mut rng, SCATTER);
        food_spawners.push(FoodSpawner::new(position));
    }

    Scenario {
        name: format!("arena-{seed}"),
        variant,
        colonies,
        food_spawners,
        food: Vec::new(),
        actions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_deterministic() {
        assert_eq!(
            generate_arena(42, 4, Variant::Singleplayer),
            generate_arena(42, 4, Variant::Singleplayer)
        );
    }

    #[test]
    fn test_arena_layout() {
        let arena = generate_arena(7, 3, Variant::Multiplayer);
        assert_eq!(arena.colonies.len(), 3);
        assert_eq!(arena.food_spawners.len(), 4);
        let teams: Vec<u8> = arena.colonies.iter().map(|c| c.team).collect();
        assert_eq!(teams, vec![1, 2, 3]);
        assert_eq!(arena.colonies[1].spawn, Vec2::new(50.0, 0.0));
        assert!(arena.validate().is_ok());
    }

    #[test]
    fn test_arena_clamps_team_count() {
        assert_eq!(generate_arena(1, 9, Variant::Singleplayer).colonies.len(), 4);
        assert_eq!(generate_arena(1, 0, Variant::Singleplayer).colonies.len(), 2);
    }
}
