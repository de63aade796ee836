//! Commands and the markers players place to issue them.
//!
//! Each team owns a [`MarkerBoard`]. A marker carries one of nine placeable
//! commands; the nearest eligible marker governs an ant's behaviour. Commands
//! 1 to 4 are point orders, 5 to 8 are paths with a heading. Index -1 is the
//! automatic state an ant is in when no marker applies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MarkerError;
use crate::game::{TeamId, UnitKind, Vec2};

/// Minimum distance between two markers of the same team.
pub const MIN_MARKER_SEPARATION: f32 = 1.0;

/// An order an ant can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Command {
    /// No marker applies; the colony strategy decides (-1).
    Automatic,
    /// Plain waypoint with no special behaviour (0).
    Waypoint,
    /// Follow the player (1).
    FollowPlayer,
    /// Fall back to the nest (2).
    Retreat,
    /// Attack the nearest enemy (3).
    Attack,
    /// Collect the nearest food (4).
    Gather,
    /// Path for idle ants away from food and fighting (5).
    ForagePath,
    /// Path for soldiers away from fighting (6).
    GuardPath,
    /// Path for workers heading out to collect (7).
    GatherPath,
    /// Path for ants carrying food home (8).
    ReturnPath,
}

/// Markers of each placeable command a team starts with, indexed 0 to 8.
pub const MARKER_QUOTAS: [u8; 9] = [5, 5, 5, 5, 5, 20, 20, 20, 20];

impl Command {
    /// Every placeable command in index order.
    pub const PLACEABLE: [Self; 9] = [
        Self::Waypoint,
        Self::FollowPlayer,
        Self::Retreat,
        Self::Attack,
        Self::Gather,
        Self::ForagePath,
        Self::GuardPath,
        Self::GatherPath,
        Self::ReturnPath,
    ];

    /// Numeric command index.
    #[must_use]
    pub const fn index(self) -> i8 {
        match self {
            Self::Automatic => -1,
            Self::Waypoint => 0,
            Self::FollowPlayer => 1,
            Self::Retreat => 2,
            Self::Attack => 3,
            Self::Gather => 4,
            Self::ForagePath => 5,
            Self::GuardPath => 6,
            Self::GatherPath => 7,
            Self::ReturnPath => 8,
        }
    }

    /// Command for a numeric index.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn from_index(index: i8) -> Option<Self> {
        match index {
            -1 => Some(Self::Automatic),
            0..=8 => Some(Self::PLACEABLE[index as usize]),
            _ => None,
        }
    }

    /// Whether markers of this command are paths with a heading.
    #[must_use]
    pub const fn is_path(self) -> bool {
        self.index() >= 5
    }

    #[allow(clippy::cast_sign_loss)]
    const fn slot(self) -> Option<usize> {
        match self {
            Self::Automatic => None,
            other => Some(other.index() as usize),
        }
    }

    /// Whether an ant of `kind` in the given carrying state obeys this command.
    #[must_use]
    pub fn admits(self, kind: UnitKind, carrying: bool) -> bool {
        match self {
            Self::Automatic => false,
            Self::GuardPath => !carrying && kind.is_soldier(),
            Self::GatherPath => !carrying && kind == UnitKind::Worker,
            Self::ReturnPath => carrying,
            _ => !carrying,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

impl TryFrom<i8> for Command {
    type Error = MarkerError;

    fn try_from(index: i8) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(MarkerError::UnknownCommand(index))
    }
}

impl From<Command> for i8 {
    fn from(command: Command) -> Self {
        command.index()
    }
}

/// Identifier of a marker, unique within its team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u32);

/// A placed marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Identifier.
    pub id: MarkerId,
    /// Owning team.
    pub team: TeamId,
    /// The order it gives.
    pub command: Command,
    /// Where it stands.
    pub position: Vec2,
    /// Rotation in degrees; paths lead along this heading.
    pub heading: f32,
}

impl Marker {
    /// Unit vector the marker points along.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        Vec2::from_heading(self.heading)
    }

    /// Whether the marker is a path.
    #[must_use]
    pub const fn is_path(&self) -> bool {
        self.command.is_path()
    }
}

/// Something that can hand an ant its governing marker.
pub trait OrderSource {
    /// The nearest marker an ant at `position` of `kind` would obey.
    fn nearest_order(&self, position: Vec2, kind: UnitKind, carrying: bool) -> Option<&Marker>;
}

/// Order source for colonies without a player: nothing is ever ordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOrders;

impl OrderSource for NoOrders {
    fn nearest_order(&self, _position: Vec2, _kind: UnitKind, _carrying: bool) -> Option<&Marker> {
        None
    }
}

/// A team's placed markers and remaining quotas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerBoard {
    team: TeamId,
    markers: Vec<Marker>,
    remaining: [u8; 9],
    next_id: u32,
}

impl MarkerBoard {
    /// An empty board with full quotas.
    #[must_use]
    pub const fn new(team: TeamId) -> Self {
        Self {
            team,
            markers: Vec::new(),
            remaining: MARKER_QUOTAS,
            next_id: 0,
        }
    }

    /// Placed markers in placement order.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Markers of `command` still available.
    #[must_use]
    pub fn remaining(&self, command: Command) -> u8 {
        command.slot().map_or(0, |slot| self.remaining[slot])
    }

    /// Distance from `position` to the nearest marker on the board.
    #[must_use]
    pub fn nearest_distance(&self, position: Vec2) -> Option<f32> {
        self.markers
            .iter()
            .map(|m| m.position.distance(position))
            .min_by(f32::total_cmp)
    }

    /// Place a marker.
    ///
    /// # Errors
    ///
    /// Fails without changing the board if the quota for `command` is used
    /// up, if another marker is closer than [`MIN_MARKER_SEPARATION`], or if
    /// the command is the automatic state.
    pub fn place(&mut self, command: Command, position: Vec2, heading: f32) -> Result<Marker, MarkerError> {
        let Some(slot) = command.slot() else {
            return Err(MarkerError::NotPlaceable(command.index()));
        };
        if self.remaining[slot] == 0 {
            return Err(MarkerError::QuotaExhausted {
                command: command.index(),
            });
        }
        match self.nearest_distance(position) {
            Some(distance) if distance < MIN_MARKER_SEPARATION => {
                return Err(MarkerError::TooClose { distance });
            }
            _ => {}
        }
        let marker = Marker {
            id: MarkerId(self.next_id),
            team: self.team,
            command,
            position,
            heading,
        };
        self.next_id += 1;
        self.remaining[slot] -= 1;
        self.markers.push(marker);
        Ok(marker)
    }

    /// Remove the marker nearest `position`, refunding its quota slot.
    pub fn remove_nearest(&mut self, position: Vec2) -> Option<Marker> {
        let index = self
            .markers
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance(position)
                    .total_cmp(&b.position.distance(position))
            })
            .map(|(i, _)| i)?;
        Some(self.take(index))
    }

    /// Remove every marker, refunding all quotas.
    pub fn clear(&mut self) -> Vec<Marker> {
        self.remaining = MARKER_QUOTAS;
        std::mem::take(&mut self.markers)
    }

    /// Insert a marker placed elsewhere, keeping ids and quotas consistent.
    /// Returns false if the marker is already present or its quota is spent.
    pub(crate) fn insert_replicated(&mut self, marker: Marker) -> bool {
        let Some(slot) = marker.command.slot() else {
            return false;
        };
        if self.remaining[slot] == 0 || self.markers.iter().any(|m| m.id == marker.id) {
            return false;
        }
        self.remaining[slot] -= 1;
        self.next_id = self.next_id.max(marker.id.0 + 1);
        self.markers.push(marker);
        true
    }

    /// Remove a marker by id. Returns the marker if it was present.
    pub(crate) fn remove_replicated(&mut self, id: MarkerId) -> Option<Marker> {
        let index = self.markers.iter().position(|m| m.id == id)?;
        Some(self.take(index))
    }

    fn take(&mut self, index: usize) -> Marker {
        let marker = self.markers.remove(index);
        if let Some(slot) = marker.command.slot() {
            self.remaining[slot] = (self.remaining[slot] + 1).min(MARKER_QUOTAS[slot]);
        }
        marker
    }
}

impl OrderSource for MarkerBoard {
    fn nearest_order(&self, position: Vec2, kind: UnitKind, carrying: bool) -> Option<&Marker> {
        self.markers
            .iter()
            .filter(|m| m.command.admits(kind, carrying))
            .min_by(|a, b| {
                a.position
                    .distance(position)
                    .total_cmp(&b.position.distance(position))
            })
    }
}
