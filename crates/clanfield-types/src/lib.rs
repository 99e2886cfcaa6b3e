//! Shared type definitions for the Clanfield simulation.
//!
//! This crate is the single source of truth for the data that crosses the
//! kernel boundary: identifiers, behavior and strategy enumerations, and the
//! snapshot payload returned by the engine's state query. Everything here is
//! plain data with `serde` derives so the external layers (web, export,
//! analysis) can serialize it however they like.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer identifier wrappers
//! - [`enums`] -- Behavior states, strategies, execution modes, termination reasons
//! - [`structs`] -- Snapshot structs (`SimulationSnapshot`, `ClanSnapshot`, metrics)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{BehaviorState, ClanStrategy, ModeKind, TerminationReason};
pub use ids::ClanId;
pub use structs::{
    ClanSnapshot, SimulationSnapshot, SimulationSummary, SurvivorSummary, SystemMetrics,
};
