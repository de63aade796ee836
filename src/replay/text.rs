//! Plain text rendering of a world.
//!
//! Output format:
//! ```text
//! === TICK 120 (6.0s) ===
//!
//! TEAM  SPECIES  FOOD  WORKERS  SOLDIERS  CAP  QUEEN   ORDER    UPGRADES
//! 1     black     100        4         0   50  1000    none     -
//! 2     fire       25        5         1   50  1000    none     Rapid Movement
//!
//! FIELD: 14 ants, 9 pellets (2 carried), 1 markers
//! STATUS: in progress
//! ```

#![allow(clippy::format_push_string)]

use crate::game::{MatchOutcome, StrategicCommand, UnitKind, World};

/// Render the world as a colony table plus a field summary.
#[must_use]
pub fn render_text(world: &World) -> String {
    let mut output = String::new();
    render_header(&mut output, world);
    render_colonies(&mut output, world);
    render_field(&mut output, world);
    render_status(&mut output, world);
    output
}

fn render_header(output: &mut String, world: &World) {
    output.push_str(&format!(
        "=== TICK {} ({:.1}s) ===\n\n",
        world.tick_count(),
        world.time()
    ));
}

const fn order_name(command: StrategicCommand) -> &'static str {
    match command {
        StrategicCommand::None => "none",
        StrategicCommand::Attack => "attack",
        StrategicCommand::Retreat => "retreat",
        StrategicCommand::Preparing => "preparing",
    }
}

fn render_colonies(output: &mut String, world: &World) {
    output.push_str("TEAM  SPECIES  FOOD  WORKERS  SOLDIERS  CAP  QUEEN   ORDER    UPGRADES\n");
    for snapshot in world.snapshots() {
        let alive = world.colony(snapshot.team).is_some_and(|c| c.alive);
        let upgrades = if snapshot.upgrades.is_empty() {
            "-".to_string()
        } else {
            snapshot
                .upgrades
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let queen = if alive {
            format!("{:.0}", snapshot.health)
        } else {
            "dead".to_string()
        };
        output.push_str(&format!(
            "{:<5} {:<8} {:>5} {:>8} {:>9} {:>4}  {:<7} {:<8} {}\n",
            snapshot.team,
            snapshot.species.to_string().to_lowercase(),
            snapshot.food,
            snapshot.total_workers,
            snapshot.total_soldiers,
            snapshot.max_colony_size,
            queen,
            order_name(snapshot.command),
            upgrades
        ));
    }
    output.push('\n');
}

fn render_field(output: &mut String, world: &World) {
    let ants = world.units().filter(|u| u.kind.is_ant()).count();
    let supers = world
        .units()
        .filter(|u| u.kind == UnitKind::SuperSoldier)
        .count();
    let pellets = world.foods().count();
    let carried = world.foods().filter(|f| f.carried).count();
    let markers: usize = world.colonies().map(|c| c.markers.markers().len()).sum();
    output.push_str(&format!(
        "FIELD: {ants} ants ({supers} super), {pellets} pellets ({carried} carried), {markers} markers\n"
    ));
}

fn render_status(output: &mut String, world: &World) {
    let status = match world.outcome() {
        None => "in progress".to_string(),
        Some(MatchOutcome::Victory(team)) => format!("team {team} wins"),
        Some(MatchOutcome::Draw) => "draw".to_string(),
    };
    output.push_str(&format!("STATUS: {status}\n"));
    for elimination in world.eliminations() {
        output.push_str(&format!(
            "  team {} eliminated at tick {}\n",
            elimination.team, elimination.tick
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::game::{ColonySetup, Controller, Discard, Species, Vec2};

    #[test]
    fn test_render_table() {
        let mut world = World::new(1, Rules::default(), 0.05);
        let mut setup = ColonySetup::new(1, Species::Black, Controller::Scripted, Vec2::ZERO);
        setup.workers = 4;
        world.add_colony(&setup, &mut Discard).unwrap();
        world.spawn_food(Vec2::new(1.0, 1.0));
        let text = render_text(&world);
        assert!(text.starts_with("=== TICK 0 (0.0s) ==="));
        assert!(text.contains("black"));
        assert!(text.contains("FIELD: 4 ants (0 super), 1 pellets (0 carried), 0 markers"));
        assert!(text.contains("STATUS: in progress"));
    }

    #[test]
    fn test_render_elimination() {
        let mut world = World::new(1, Rules::default(), 0.05);
        for (team, y) in [(1, 30.0), (2, -30.0)] {
            let setup = ColonySetup::new(team, Species::Fire, Controller::Scripted, Vec2::new(0.0, y));
            world.add_colony(&setup, &mut Discard).unwrap();
        }
        let queen = world.colony(2).unwrap().queen;
        world.apply_damage(queen, 2000.0, &mut Discard);
        world.tick(&mut Discard);
        let text = render_text(&world);
        assert!(text.contains("dead"));
        assert!(text.contains("STATUS: team 1 wins"));
        assert!(text.contains("team 2 eliminated at tick 0"));
    }
}
