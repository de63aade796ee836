//! Error types for the antwar simulation.
//!
//! A running tick never fails: everything that can go wrong inside the
//! simulation (a missing colony, a pellet taken by somebody else) is absorbed
//! and logged. Errors only surface at the edges, where a caller asks for
//! something the rules forbid or hands over a broken scenario.

use thiserror::Error;

use crate::game::{TeamId, UnitKind, Upgrade};

/// Reasons a command marker cannot be placed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MarkerError {
    /// The team has no markers of this kind left.
    #[error("no markers of kind {command} remaining")]
    QuotaExhausted {
        /// Command index of the rejected marker.
        command: i8,
    },
    /// Another marker of the same team sits too close.
    #[error("an existing marker is only {distance:.2} units away")]
    TooClose {
        /// Distance to the nearest existing marker.
        distance: f32,
    },
    /// Automatic behaviour is a colony state, not something that can be placed.
    #[error("command {0} cannot be placed as a marker")]
    NotPlaceable(i8),
    /// The index does not name any known command.
    #[error("unknown command index {0}")]
    UnknownCommand(i8),
}

/// Errors raised by the simulation API.
#[derive(Debug, Error)]
pub enum SimError {
    /// No colony with this team number exists.
    #[error("unknown team {0}")]
    UnknownTeam(TeamId),
    /// Team numbers run from 1 to 4.
    #[error("team {0} is outside 1..=4")]
    InvalidTeam(TeamId),
    /// Two colonies claimed the same team number.
    #[error("team {0} appears more than once")]
    DuplicateTeam(TeamId),
    /// The colony has been eliminated and takes no further orders.
    #[error("team {0} has been eliminated")]
    Eliminated(TeamId),
    /// Not enough food for a purchase.
    #[error("need {needed} food, colony has {available}")]
    InsufficientFood {
        /// Cost of the purchase.
        needed: i32,
        /// Food the colony currently holds.
        available: i32,
    },
    /// The colony is already at its size limit.
    #[error("colony is full ({max} units)")]
    ColonyFull {
        /// Current maximum colony size.
        max: u32,
    },
    /// This kind of unit cannot be bought by this colony right now.
    #[error("{0:?} cannot be purchased")]
    NotPurchasable(UnitKind),
    /// The upgrade is not available to this colony.
    #[error("upgrade {upgrade} unavailable: {reason}")]
    UpgradeUnavailable {
        /// The rejected upgrade.
        upgrade: Upgrade,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// The team has no player to issue orders.
    #[error("team {0} has no player")]
    NoPlayer(TeamId),
    /// Marker placement failed.
    #[error(transparent)]
    Marker(#[from] MarkerError),
    /// The scenario describes an impossible setup.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
    /// Filesystem failure while loading or saving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed scenario or recording JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Malformed rules file.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Rules could not be converted for merging.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result alias used across the crate.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_error_display() {
        let err = MarkerError::TooClose { distance: 0.5 };
        assert_eq!(err.to_string(), "an existing marker is only 0.50 units away");
    }

    #[test]
    fn test_marker_error_converts() {
        let err: SimError = MarkerError::QuotaExhausted { command: 5 }.into();
        assert!(matches!(err, SimError::Marker(_)));
        assert!(err.to_string().contains("kind 5"));
    }

    #[test]
    fn test_insufficient_food_display() {
        let err = SimError::InsufficientFood {
            needed: 50,
            available: 20,
        };
        assert_eq!(err.to_string(), "need 50 food, colony has 20");
    }
}
