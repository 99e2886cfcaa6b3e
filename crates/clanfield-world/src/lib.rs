//! Spatial substrate for the Clanfield simulation.
//!
//! This crate holds everything below the clans: the seeded random source
//! that every stochastic decision draws from, toroidal grid geometry, and
//! the resource field clans forage on.
//!
//! # Modules
//!
//! - [`rng`] -- [`RandomSource`], the single seeded generator for a run.
//! - [`geometry`] -- [`Position`], [`Cell`], and [`GridDims`] with
//!   wrap-around distances and disc enumeration.
//! - [`field`] -- [`ResourceField`]: logistic regeneration, consumption,
//!   local density, and field analysis helpers.
//! - [`distribution`] -- [`InitialDistribution`] layouts for filling a field.
//! - [`stats`] -- Percentile and summary helpers used by the field.
//! - [`error`] -- [`WorldError`].

pub mod distribution;
pub mod error;
pub mod field;
pub mod geometry;
pub mod rng;
pub mod stats;

// Re-export primary types at crate root.
pub use distribution::InitialDistribution;
pub use error::WorldError;
pub use field::{FieldParams, ResourceField};
pub use geometry::{Cell, GridDims, Position};
pub use rng::RandomSource;
pub use stats::{FieldStats, Hotspot, Percentiles};
