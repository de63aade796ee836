//! Who controls a colony, and the actions a human player can take.

use serde::{Deserialize, Serialize};

use crate::game::{Command, UnitKind, Upgrade, Vec2};

/// AI difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Lowest income.
    Easy,
    /// Middle income.
    #[default]
    Medium,
    /// Highest income.
    Hard,
}

impl Difficulty {
    /// Index into per-difficulty tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }
}

/// Who runs a colony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Controller {
    /// Computer opponent: buys units and picks attacks on its own.
    Ai {
        /// Income level.
        #[serde(default)]
        difficulty: Difficulty,
    },
    /// Human player with an avatar, markers and manual purchases.
    Player,
    /// Passive colony that only ever acts through scripted actions.
    Scripted,
}

impl Controller {
    /// Whether the colony spends food on its own.
    #[must_use]
    pub const fn spends_automatically(self) -> bool {
        matches!(self, Self::Ai { .. })
    }

    /// Whether the colony has a human player.
    #[must_use]
    pub const fn has_player(self) -> bool {
        matches!(self, Self::Player)
    }
}

/// Something a player does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Place a marker, at the avatar unless a position is given.
    PlaceMarker {
        /// Order to give.
        command: Command,
        /// Marker heading in degrees.
        #[serde(default)]
        heading: f32,
        /// Where to place it.
        #[serde(default)]
        position: Option<Vec2>,
    },
    /// Remove the marker nearest the avatar.
    RemoveMarker,
    /// Remove all markers.
    ClearMarkers,
    /// Buy a unit.
    Spawn {
        /// What to buy.
        kind: UnitKind,
    },
    /// Buy an upgrade.
    BuyUpgrade {
        /// What to buy.
        upgrade: Upgrade,
    },
    /// Send the avatar somewhere.
    MoveAvatar {
        /// Destination.
        position: Vec2,
    },
}
