//! Tuning constants for clan behavior and pairwise interactions.
//!
//! The thresholds and rates below are heuristic. They live in configuration
//! rather than in code so a run can be retuned without a rebuild. Both
//! structs deserialize from the `behavior` and `interaction` sections of the
//! simulation YAML; any missing key takes the default shown on its field.

use serde::Deserialize;

use crate::error::AgentError;

/// Thresholds and rates for the per-clan behavior cycle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BehaviorConfig {
    /// Energy below which a clan rests (default: 20).
    #[serde(default = "default_rest_energy_threshold")]
    pub rest_energy_threshold: f64,

    /// Energy above which a threatened clan fights or defends (default: 30).
    #[serde(default = "default_fight_energy_threshold")]
    pub fight_energy_threshold: f64,

    /// Size above which a threatened clan fights rather than defends (default: 8).
    #[serde(default = "default_fight_min_size")]
    pub fight_min_size: u64,

    /// Energy above which a hungry clan migrates (default: 40).
    #[serde(default = "default_migrate_energy_threshold")]
    pub migrate_energy_threshold: f64,

    /// Multiplier on `size * resource_required_per_individual` below which
    /// the local average counts as scarce (default: 10).
    #[serde(default = "default_migration_resource_factor")]
    pub migration_resource_factor: f64,

    /// Relative size at which another clan counts as a threat (default: 0.8).
    #[serde(default = "default_threat_size_ratio")]
    pub threat_size_ratio: f64,

    /// Energy gained per unit time when the full need is met (default: 15).
    #[serde(default = "default_energy_conversion")]
    pub energy_conversion: f64,

    /// Share of the food need that full cooperation saves (default: 0.3).
    #[serde(default = "default_cooperation_efficiency")]
    pub cooperation_efficiency: f64,

    /// Energy lost per unit time regardless of food (default: 3).
    #[serde(default = "default_energy_decay")]
    pub energy_decay: f64,

    /// Morale lost per unit time while energy is below the rest threshold (default: 2).
    #[serde(default = "default_hunger_morale_decay")]
    pub hunger_morale_decay: f64,

    /// Speed multiplier while migrating (default: 1.5).
    #[serde(default = "default_migration_speed_multiplier")]
    pub migration_speed_multiplier: f64,

    /// Energy spent per unit time while migrating (default: 2).
    #[serde(default = "default_migration_energy_cost")]
    pub migration_energy_cost: f64,

    /// Radius of the neighbourhood scored around a migration landing cell (default: 2).
    #[serde(default = "default_migration_scan_radius")]
    pub migration_scan_radius: f64,

    /// Fraction of field capacity offered as the base exploration bonus (default: 0.2).
    #[serde(default = "default_exploration_bonus_scale")]
    pub exploration_bonus_scale: f64,

    /// Energy recovered per unit time while resting (default: 25).
    #[serde(default = "default_rest_energy_recovery")]
    pub rest_energy_recovery: f64,

    /// Morale recovered per unit time while resting (default: 10).
    #[serde(default = "default_rest_morale_recovery")]
    pub rest_morale_recovery: f64,

    /// Morale gained per unit time while defending (default: 1).
    #[serde(default = "default_defend_morale_gain")]
    pub defend_morale_gain: f64,

    /// Distance from the territory centroid that triggers a retreat (default: 1).
    #[serde(default = "default_defend_distance")]
    pub defend_distance: f64,

    /// Energy at or above which births accelerate (default: 60).
    #[serde(default = "default_birth_energy_threshold")]
    pub birth_energy_threshold: f64,

    /// Energy below which deaths accelerate (default: 40).
    #[serde(default = "default_death_energy_threshold")]
    pub death_energy_threshold: f64,

    /// Energy below which starvation mortality applies (default: 10).
    #[serde(default = "default_starvation_threshold")]
    pub starvation_threshold: f64,

    /// Starvation mortality at zero energy (default: 0.8).
    #[serde(default = "default_starvation_mortality")]
    pub starvation_mortality: f64,

    /// Territory cap per individual (default: 5).
    #[serde(default = "default_territory_per_individual")]
    pub territory_per_individual: u64,

    /// Cells remembered in resource memory (default: 256).
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Cells kept in movement history (default: 50).
    #[serde(default = "default_movement_history")]
    pub movement_history: usize,

    /// Radius within which a fighting clan looks for a target (default: 3).
    #[serde(default = "default_engagement_radius")]
    pub engagement_radius: f64,

    /// Distance at which fighting clans engage in combat (default: 2).
    #[serde(default = "default_melee_range")]
    pub melee_range: f64,
}

const fn default_rest_energy_threshold() -> f64 {
    20.0
}

const fn default_fight_energy_threshold() -> f64 {
    30.0
}

const fn default_fight_min_size() -> u64 {
    8
}

const fn default_migrate_energy_threshold() -> f64 {
    40.0
}

const fn default_migration_resource_factor() -> f64 {
    10.0
}

const fn default_threat_size_ratio() -> f64 {
    0.8
}

const fn default_energy_conversion() -> f64 {
    15.0
}

const fn default_cooperation_efficiency() -> f64 {
    0.3
}

const fn default_energy_decay() -> f64 {
    3.0
}

const fn default_hunger_morale_decay() -> f64 {
    2.0
}

const fn default_migration_speed_multiplier() -> f64 {
    1.5
}

const fn default_migration_energy_cost() -> f64 {
    2.0
}

const fn default_migration_scan_radius() -> f64 {
    2.0
}

const fn default_exploration_bonus_scale() -> f64 {
    0.2
}

const fn default_rest_energy_recovery() -> f64 {
    25.0
}

const fn default_rest_morale_recovery() -> f64 {
    10.0
}

const fn default_defend_morale_gain() -> f64 {
    1.0
}

const fn default_defend_distance() -> f64 {
    1.0
}

const fn default_birth_energy_threshold() -> f64 {
    60.0
}

const fn default_death_energy_threshold() -> f64 {
    40.0
}

const fn default_starvation_threshold() -> f64 {
    10.0
}

const fn default_starvation_mortality() -> f64 {
    0.8
}

const fn default_territory_per_individual() -> u64 {
    5
}

const fn default_memory_capacity() -> usize {
    256
}

const fn default_movement_history() -> usize {
    50
}

const fn default_engagement_radius() -> f64 {
    3.0
}

const fn default_melee_range() -> f64 {
    2.0
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            rest_energy_threshold: default_rest_energy_threshold(),
            fight_energy_threshold: default_fight_energy_threshold(),
            fight_min_size: default_fight_min_size(),
            migrate_energy_threshold: default_migrate_energy_threshold(),
            migration_resource_factor: default_migration_resource_factor(),
            threat_size_ratio: default_threat_size_ratio(),
            energy_conversion: default_energy_conversion(),
            cooperation_efficiency: default_cooperation_efficiency(),
            energy_decay: default_energy_decay(),
            hunger_morale_decay: default_hunger_morale_decay(),
            migration_speed_multiplier: default_migration_speed_multiplier(),
            migration_energy_cost: default_migration_energy_cost(),
            migration_scan_radius: default_migration_scan_radius(),
            exploration_bonus_scale: default_exploration_bonus_scale(),
            rest_energy_recovery: default_rest_energy_recovery(),
            rest_morale_recovery: default_rest_morale_recovery(),
            defend_morale_gain: default_defend_morale_gain(),
            defend_distance: default_defend_distance(),
            birth_energy_threshold: default_birth_energy_threshold(),
            death_energy_threshold: default_death_energy_threshold(),
            starvation_threshold: default_starvation_threshold(),
            starvation_mortality: default_starvation_mortality(),
            territory_per_individual: default_territory_per_individual(),
            memory_capacity: default_memory_capacity(),
            movement_history: default_movement_history(),
            engagement_radius: default_engagement_radius(),
            melee_range: default_melee_range(),
        }
    }
}

impl BehaviorConfig {
    /// Reject negative or non-finite values and zero-sized buffers.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_non_negative(&[
            ("rest_energy_threshold", self.rest_energy_threshold),
            ("fight_energy_threshold", self.fight_energy_threshold),
            ("migrate_energy_threshold", self.migrate_energy_threshold),
            ("migration_resource_factor", self.migration_resource_factor),
            ("threat_size_ratio", self.threat_size_ratio),
            ("energy_conversion", self.energy_conversion),
            ("energy_decay", self.energy_decay),
            ("hunger_morale_decay", self.hunger_morale_decay),
            ("migration_speed_multiplier", self.migration_speed_multiplier),
            ("migration_energy_cost", self.migration_energy_cost),
            ("migration_scan_radius", self.migration_scan_radius),
            ("exploration_bonus_scale", self.exploration_bonus_scale),
            ("rest_energy_recovery", self.rest_energy_recovery),
            ("rest_morale_recovery", self.rest_morale_recovery),
            ("defend_morale_gain", self.defend_morale_gain),
            ("defend_distance", self.defend_distance),
            ("starvation_mortality", self.starvation_mortality),
            ("engagement_radius", self.engagement_radius),
            ("melee_range", self.melee_range),
        ])?;
        // Thresholds divide the energy curves; zero would divide by zero.
        check_positive(&[
            ("birth_energy_threshold", self.birth_energy_threshold),
            ("death_energy_threshold", self.death_energy_threshold),
            ("starvation_threshold", self.starvation_threshold),
        ])?;
        if self.birth_energy_threshold >= 100.0 {
            return Err(AgentError::InvalidParameter {
                reason: format!(
                    "birth_energy_threshold must be below 100, got {}",
                    self.birth_energy_threshold
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.cooperation_efficiency) {
            return Err(AgentError::InvalidParameter {
                reason: format!(
                    "cooperation_efficiency must be in [0, 1], got {}",
                    self.cooperation_efficiency
                ),
            });
        }
        if self.memory_capacity == 0 || self.movement_history == 0 {
            return Err(AgentError::InvalidParameter {
                reason: "memory_capacity and movement_history must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Constants for the pairwise interaction pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractionConfig {
    /// Pairs further apart than this never interact (default: 5).
    #[serde(default = "default_interaction_radius")]
    pub interaction_radius: f64,

    /// Distance within which non-combat pairs compete for food (default: 1.5).
    #[serde(default = "default_competition_radius")]
    pub competition_radius: f64,

    /// Joint gate applied after both cooperation rolls succeed (default: 0.2).
    #[serde(default = "default_alliance_probability")]
    pub alliance_probability: f64,

    /// Morale bonus per unit time for cooperative neighbours at zero distance (default: 2).
    #[serde(default = "default_alliance_morale_bonus")]
    pub alliance_morale_bonus: f64,

    /// Casualties per unit time inflicted by an overwhelming opponent (default: 5).
    #[serde(default = "default_combat_damage")]
    pub combat_damage: f64,

    /// Energy each side spends per unit time of combat (default: 20).
    #[serde(default = "default_combat_energy_cost")]
    pub combat_energy_cost: f64,

    /// Standard deviation of the multiplicative strength noise (default: 0.2).
    #[serde(default = "default_combat_noise_std")]
    pub combat_noise_std: f64,

    /// Morale the weaker side loses per unit time of combat (default: 5).
    #[serde(default = "default_combat_morale_loss")]
    pub combat_morale_loss: f64,

    /// Total energy penalty per unit time split between competitors (default: 2).
    #[serde(default = "default_competition_energy_penalty")]
    pub competition_energy_penalty: f64,
}

const fn default_interaction_radius() -> f64 {
    5.0
}

const fn default_competition_radius() -> f64 {
    1.5
}

const fn default_alliance_probability() -> f64 {
    0.2
}

const fn default_alliance_morale_bonus() -> f64 {
    2.0
}

const fn default_combat_damage() -> f64 {
    5.0
}

const fn default_combat_energy_cost() -> f64 {
    20.0
}

const fn default_combat_noise_std() -> f64 {
    0.2
}

const fn default_combat_morale_loss() -> f64 {
    5.0
}

const fn default_competition_energy_penalty() -> f64 {
    2.0
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            interaction_radius: default_interaction_radius(),
            competition_radius: default_competition_radius(),
            alliance_probability: default_alliance_probability(),
            alliance_morale_bonus: default_alliance_morale_bonus(),
            combat_damage: default_combat_damage(),
            combat_energy_cost: default_combat_energy_cost(),
            combat_noise_std: default_combat_noise_std(),
            combat_morale_loss: default_combat_morale_loss(),
            competition_energy_penalty: default_competition_energy_penalty(),
        }
    }
}

impl InteractionConfig {
    /// Reject negative or non-finite values and an out-of-range probability.
    pub fn validate(&self) -> Result<(), AgentError> {
        check_non_negative(&[
            ("interaction_radius", self.interaction_radius),
            ("competition_radius", self.competition_radius),
            ("alliance_morale_bonus", self.alliance_morale_bonus),
            ("combat_damage", self.combat_damage),
            ("combat_energy_cost", self.combat_energy_cost),
            ("combat_noise_std", self.combat_noise_std),
            ("combat_morale_loss", self.combat_morale_loss),
            ("competition_energy_penalty", self.competition_energy_penalty),
        ])?;
        if !(0.0..=1.0).contains(&self.alliance_probability) {
            return Err(AgentError::InvalidParameter {
                reason: format!(
                    "alliance_probability must be in [0, 1], got {}",
                    self.alliance_probability
                ),
            });
        }
        Ok(())
    }
}

fn check_non_negative(values: &[(&str, f64)]) -> Result<(), AgentError> {
    for &(name, value) in values {
        if !value.is_finite() || value < 0.0 {
            return Err(AgentError::InvalidParameter {
                reason: format!("{name} must be a non-negative number, got {value}"),
            });
        }
    }
    Ok(())
}

fn check_positive(values: &[(&str, f64)]) -> Result<(), AgentError> {
    for &(name, value) in values {
        if !value.is_finite() || value <= 0.0 {
            return Err(AgentError::InvalidParameter {
                reason: format!("{name} must be positive, got {value}"),
            });
        }
    }
    Ok(())
}
