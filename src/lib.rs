// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! antwar: a deterministic ant-colony strategy simulation.
//!
//! Colonies of black and fire ants gather food, buy workers and soldiers,
//! follow player markers or AI strategy, and fight until one queen is left.
//! This crate is the headless core:
//! - Per-ant decision making on a fixed priority ladder
//! - Colony economy, upgrades and AI attack strategy
//! - Combat with delayed hits and idempotent death handling
//! - Authority broadcasts for networked mirrors
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Tournament / Replay / CLI         │
//! ├─────────────────────────────────────┤
//! │   World tick (state.rs)             │
//! ├─────────────────────────────────────┤
//! │   Decision · Economy · Combat       │
//! └─────────────────────────────────────┘
//! ```
//!
//! A match is a pure function of `(seed, scenario, config)`; see
//! [`tournament::run_match`].

pub mod config;
pub mod error;
pub mod game;
pub mod net;
pub mod replay;
pub mod scenario;
pub mod tournament;

pub use config::{MatchConfig, Rules, Variant};
pub use error::{MarkerError, SimError, SimResult};
pub use game::{Colony, Command, MatchOutcome, Species, TeamId, Unit, UnitId, UnitKind, World};
pub use net::{BroadcastChannel, StateEvent};
pub use scenario::{ColonySnapshot, Scenario};
pub use tournament::{MatchResult, run_match};
