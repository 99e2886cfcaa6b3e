//! Births, deaths, and starvation.
//!
//! Population changes continuously at `(birth - death) * size * dt`, with
//! both rates scaled by the clan's energy, then rounds to a whole number of
//! individuals. Combat casualties accumulated during the tick are
//! subtracted in the same update.
//!
//! ```text
//! birth factor  = e / B                      if e <= B
//!               = 1 + (e - B) / (100 - B)    otherwise
//! death factor  = 1                          if e >= D
//!               = 1 + (D - e) / D            otherwise
//! starvation    = m * (S - e) / S            if e < S, else 0
//! ```
//!
//! where `B`, `D`, `S` are the birth, death, and starvation thresholds and
//! `m` is the starvation mortality.

use crate::clan::{Clan, MAX_VITALITY};
use crate::config::BehaviorConfig;

/// Multiplier on the birth rate at the given energy.
pub fn birth_factor(energy: f64, behavior: &BehaviorConfig) -> f64 {
    let threshold = behavior.birth_energy_threshold;
    if energy <= threshold {
        (energy / threshold).max(0.0)
    } else {
        1.0 + (energy - threshold) / (MAX_VITALITY - threshold)
    }
}

/// Multiplier on the death rate at the given energy.
pub fn death_factor(energy: f64, behavior: &BehaviorConfig) -> f64 {
    let threshold = behavior.death_energy_threshold;
    if energy >= threshold {
        1.0
    } else {
        1.0 + (threshold - energy.max(0.0)) / threshold
    }
}

/// Extra per-capita mortality from starvation at the given energy.
pub fn starvation_rate(energy: f64, behavior: &BehaviorConfig) -> f64 {
    let threshold = behavior.starvation_threshold;
    if energy < threshold {
        behavior.starvation_mortality * (threshold - energy.max(0.0)) / threshold
    } else {
        0.0
    }
}

/// Size before and after a population update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationChange {
    /// Size going into the update.
    pub before: u64,
    /// Size coming out of it.
    pub after: u64,
}

impl Clan {
    /// Apply births, deaths, starvation, and pending combat losses.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn update_population(&mut self, behavior: &BehaviorConfig, dt: f64) -> PopulationChange {
        let before = self.size;
        let size = before as f64;
        let birth = self.params.birth_rate * birth_factor(self.energy, behavior);
        let death = self.params.death_rate * death_factor(self.energy, behavior)
            + starvation_rate(self.energy, behavior);
        let next = (birth - death).mul_add(size * dt, size) - self.pending_losses;
        self.pending_losses = 0.0;

        // Float-to-int `as` saturates, and NaN maps to 0.
        let after = next.round().max(0.0) as u64;
        self.size = after;
        PopulationChange { before, after }
    }
}
