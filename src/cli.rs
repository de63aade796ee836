//! CLI command implementations for antwar.

pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod tournament;
pub(crate) mod validate;

mod output;

use std::error::Error;
use std::fmt;
use std::path::Path;

use antwar::config::{MatchConfig, Rules, Variant};
use antwar::scenario::Scenario;
use antwar::tournament::generate_arena;
use clap::ValueEnum;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// Final colony table.
    Table,
}

/// Output format for the `replay` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReplayFormat {
    /// Colony tables.
    Text,
    /// Colony snapshots as JSON lines.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// Rule preset selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum VariantArg {
    /// Scripted training ground.
    Tutorial,
    /// Local match against AI colonies.
    Singleplayer,
    /// Networked rules.
    Multiplayer,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Tutorial => Self::Tutorial,
            VariantArg::Singleplayer => Self::Singleplayer,
            VariantArg::Multiplayer => Self::Multiplayer,
        }
    }
}

/// Where the match layout comes from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Setup<'a> {
    /// Scenario file; a generated arena when absent.
    pub(crate) scenario: Option<&'a Path>,
    /// Colonies in a generated arena.
    pub(crate) colonies: usize,
    /// Rule preset.
    pub(crate) variant: Option<Variant>,
    /// TOML rules file layered over the preset.
    pub(crate) rules: Option<&'a Path>,
    /// Tick limit override.
    pub(crate) ticks: Option<u64>,
}

impl Setup<'_> {
    /// Load or generate the scenario and build the match config.
    pub(crate) fn resolve(&self, seed: u64) -> Result<(Scenario, MatchConfig), CliError> {
        let scenario = match self.scenario {
            Some(path) => Scenario::load(path)
                .map_err(|e| CliError::new(format!("Failed to load {}: {e}", path.display())))?,
            None => generate_arena(seed, self.colonies, self.variant.unwrap_or_default()),
        };
        let variant = self.variant.unwrap_or(scenario.variant);
        let mut config = MatchConfig::for_variant(variant);
        if let Some(path) = self.rules {
            let rules = Rules::load_over(path, variant)
                .map_err(|e| CliError::new(format!("Failed to load {}: {e}", path.display())))?;
            if let Some(wanted) = self.variant.filter(|&wanted| wanted != rules.variant) {
                return Err(CliError::new(format!(
                    "{} is a {} rules file but --variant {wanted} was given",
                    path.display(),
                    rules.variant
                )));
            }
            config.rules = rules;
        }
        if let Some(ticks) = self.ticks {
            config.max_ticks = ticks;
        }
        Ok((scenario, config))
    }
}

/// The given seed, or one taken from the clock.
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
            .unwrap_or(42)
    })
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<antwar::SimError> for CliError {
    fn from(e: antwar::SimError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use antwar::config::StrategyKind;
    use std::fs;

    const DUEL: &str = r#"{
        "variant": "multiplayer",
        "colonies": [
            {"team": 1, "species": "black", "spawn": {"x": 0, "y": 40}},
            {"team": 2, "species": "fire", "spawn": {"x": 0, "y": -40}}
        ]
    }"#;

    fn setup<'a>(
        scenario: Option<&'a Path>,
        variant: Option<Variant>,
        rules: &'a Path,
    ) -> Setup<'a> {
        Setup {
            scenario,
            colonies: 2,
            variant,
            rules: Some(rules),
            ticks: None,
        }
    }

    #[test]
    fn test_rules_file_layers_over_selected_variant() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.toml");
        fs::write(&rules, "[economy]\nstarting_food = 200\n").unwrap();

        let (_, config) = setup(None, Some(Variant::Multiplayer), &rules)
            .resolve(1)
            .unwrap();

        assert_eq!(config.rules.variant, Variant::Multiplayer);
        assert_eq!(config.rules.strategy.kind, StrategyKind::Eligibility);
        assert!((config.rules.strategy.nest_alert_radius - 20.0).abs() < f32::EPSILON);
        assert_eq!(config.rules.economy.starting_food, 200);
    }

    #[test]
    fn test_rules_file_layers_over_scenario_variant() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = dir.path().join("duel.json");
        let rules = dir.path().join("rules.toml");
        fs::write(&scenario, DUEL).unwrap();
        fs::write(&rules, "[decision]\nattack_range = 3.0\n").unwrap();

        let (_, config) = setup(Some(&scenario), None, &rules).resolve(1).unwrap();

        assert_eq!(config.rules.variant, Variant::Multiplayer);
        assert_eq!(config.rules.strategy.kind, StrategyKind::Eligibility);
        assert!((config.rules.decision.attack_range - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_conflicting_rules_variant_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.toml");
        fs::write(&rules, "variant = \"tutorial\"\n").unwrap();

        let err = setup(None, Some(Variant::Multiplayer), &rules)
            .resolve(1)
            .unwrap_err();

        assert!(err.to_string().contains("tutorial"));
    }
}
