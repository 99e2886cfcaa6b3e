//! Per-clan tuning parameters.
//!
//! Every clan carries a [`ClanParameters`] record fixed at creation. Runs
//! start from one shared default record; individual clans may override any
//! subset of its fields through [`ParameterOverrides`].

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// The named parameter record that drives a clan's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClanParameters {
    /// Base birth rate per individual per unit time.
    pub birth_rate: f64,
    /// Base death rate per individual per unit time.
    pub death_rate: f64,
    /// Distance covered per unit time when foraging.
    pub movement_speed: f64,
    /// Radius of the disc the clan scans each tick.
    pub perception_radius: f64,
    /// Probability weight for alliance rolls, also the consumption discount.
    pub cooperation_tendency: f64,
    /// Multiplier on combat strength.
    pub aggressiveness: f64,
    /// Base probability of claiming a new territory cell per tick.
    pub territorial_expansion_rate: f64,
    /// Weight of the migration bonus for rarely visited cells.
    pub exploration_tendency: f64,
    /// Resource eaten per individual per unit time.
    pub resource_required_per_individual: f64,
}

impl Default for ClanParameters {
    fn default() -> Self {
        Self {
            birth_rate: 0.1,
            death_rate: 0.05,
            movement_speed: 1.0,
            perception_radius: 5.0,
            cooperation_tendency: 0.6,
            aggressiveness: 0.3,
            territorial_expansion_rate: 0.05,
            exploration_tendency: 0.5,
            resource_required_per_individual: 0.1,
        }
    }
}

impl ClanParameters {
    /// Reject negative or non-finite rates and tendencies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), AgentError> {
        for (name, value) in [
            ("birth_rate", self.birth_rate),
            ("death_rate", self.death_rate),
            ("movement_speed", self.movement_speed),
            ("perception_radius", self.perception_radius),
            ("aggressiveness", self.aggressiveness),
            ("resource_required_per_individual", self.resource_required_per_individual),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AgentError::InvalidParameter {
                    reason: format!("{name} must be a non-negative number, got {value}"),
                });
            }
        }
        for (name, value) in [
            ("cooperation_tendency", self.cooperation_tendency),
            ("territorial_expansion_rate", self.territorial_expansion_rate),
            ("exploration_tendency", self.exploration_tendency),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(AgentError::InvalidParameter {
                    reason: format!("{name} must be in [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// A partial parameter record; `None` keeps the base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterOverrides {
    /// Override for [`ClanParameters::birth_rate`].
    pub birth_rate: Option<f64>,
    /// Override for [`ClanParameters::death_rate`].
    pub death_rate: Option<f64>,
    /// Override for [`ClanParameters::movement_speed`].
    pub movement_speed: Option<f64>,
    /// Override for [`ClanParameters::perception_radius`].
    pub perception_radius: Option<f64>,
    /// Override for [`ClanParameters::cooperation_tendency`].
    pub cooperation_tendency: Option<f64>,
    /// Override for [`ClanParameters::aggressiveness`].
    pub aggressiveness: Option<f64>,
    /// Override for [`ClanParameters::territorial_expansion_rate`].
    pub territorial_expansion_rate: Option<f64>,
    /// Override for [`ClanParameters::exploration_tendency`].
    pub exploration_tendency: Option<f64>,
    /// Override for [`ClanParameters::resource_required_per_individual`].
    pub resource_required_per_individual: Option<f64>,
}

impl ParameterOverrides {
    /// Layer these overrides on top of `base`.
    pub fn apply(&self, base: &ClanParameters) -> ClanParameters {
        ClanParameters {
            birth_rate: self.birth_rate.unwrap_or(base.birth_rate),
            death_rate: self.death_rate.unwrap_or(base.death_rate),
            movement_speed: self.movement_speed.unwrap_or(base.movement_speed),
            perception_radius: self.perception_radius.unwrap_or(base.perception_radius),
            cooperation_tendency: self.cooperation_tendency.unwrap_or(base.cooperation_tendency),
            aggressiveness: self.aggressiveness.unwrap_or(base.aggressiveness),
            territorial_expansion_rate: self
                .territorial_expansion_rate
                .unwrap_or(base.territorial_expansion_rate),
            exploration_tendency: self.exploration_tendency.unwrap_or(base.exploration_tendency),
            resource_required_per_individual: self
                .resource_required_per_individual
                .unwrap_or(base.resource_required_per_individual),
        }
    }
}
