//! Clans and their behavior for the Clanfield simulation.
//!
//! A clan perceives the field around it, picks a behavior state, eats, grows
//! or shrinks, claims territory, and meets its neighbours in the pairwise
//! interaction pass. This crate implements each of those steps as methods on
//! [`Clan`]; how a state is actually executed (how noisy the movement is,
//! whether foraging always happens) belongs to the execution mode in
//! `clanfield-core`.
//!
//! # Modules
//!
//! - [`clan`] -- The [`Clan`] entity and its movement and relation primitives.
//! - [`params`] -- Per-clan [`ClanParameters`] and partial overrides.
//! - [`config`] -- [`BehaviorConfig`] and [`InteractionConfig`] tuning constants.
//! - [`memory`] -- Bounded resource memory and movement history.
//! - [`perception`] -- Disc scans, threat detection, and the [`ClanView`]
//!   roster snapshot.
//! - [`behavior`] -- The state machine and per-state targeting.
//! - [`consumption`] -- Eating and energy balance.
//! - [`population`] -- Births, deaths, starvation, and combat casualties.
//! - [`territory`] -- Claimed cells, expansion, and pruning.
//! - [`interaction`] -- Cooperation, combat, and competition between pairs.
//! - [`error`] -- [`AgentError`].

pub mod behavior;
pub mod clan;
pub mod config;
pub mod consumption;
pub mod error;
pub mod interaction;
pub mod memory;
pub mod params;
pub mod perception;
pub mod population;
pub mod territory;

// Re-export primary types at crate root.
pub use behavior::richest_cell;
pub use clan::{Clan, ClanSeed, MAX_VITALITY};
pub use config::{BehaviorConfig, InteractionConfig};
pub use consumption::Consumption;
pub use error::AgentError;
pub use interaction::{InteractionEvent, InteractionKind, InteractionReport, resolve_interactions};
pub use memory::{MovementHistory, ResourceMemory};
pub use params::{ClanParameters, ParameterOverrides};
pub use perception::{ClanView, Perception};
pub use population::PopulationChange;
pub use territory::{Territory, TerritoryChange};
