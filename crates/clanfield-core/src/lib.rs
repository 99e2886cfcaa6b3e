//! Configuration, execution modes, and the tick cycle for the Clanfield
//! simulation.
//!
//! This crate assembles the world (`clanfield-world`) and the clans
//! (`clanfield-agents`) into a steppable simulation.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `clanfield-config.yaml` into
//!   strongly-typed, validated structs.
//! - [`engine`] -- [`SimulationEngine`] and its eight-phase tick cycle.
//! - [`error`] -- [`EngineError`].
//! - [`handle`] -- [`EngineHandle`], the driver-facing wrapper that reports
//!   use before initialization as an error.
//! - [`metrics`] -- Bounded per-tick metrics history.
//! - [`mode`] -- Stochastic, deterministic, and hybrid execution modes
//!   behind the [`BehaviorExecutor`] trait.
//! - [`spawner`] -- Initial roster construction.
//! - [`termination`] -- Optional stopping rules.
//!
//! [`SimulationEngine`]: engine::SimulationEngine
//! [`EngineError`]: error::EngineError
//! [`EngineHandle`]: handle::EngineHandle
//! [`BehaviorExecutor`]: mode::BehaviorExecutor

pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod mode;
pub mod spawner;
pub mod termination;

pub use config::{ConfigError, SimulationConfig};
pub use engine::{ClanFailure, ClanPhase, SimulationEngine, TickSummary};
pub use error::EngineError;
pub use handle::{initialize, EngineHandle};
pub use mode::{BehaviorExecutor, SimulationMode};
pub use termination::{TerminationConfig, TerminationMonitor};
