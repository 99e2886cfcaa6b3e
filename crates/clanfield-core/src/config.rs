//! Configuration loading and typed config structures for a Clanfield run.
//!
//! A run is described by one YAML document (by convention
//! `clanfield-config.yaml`). Every key is optional; missing keys take the
//! defaults documented on each field. Loading always validates, so a
//! [`SimulationConfig`] obtained through [`SimulationConfig::from_file`] or
//! [`SimulationConfig::parse`] is safe to build an engine from.

use std::collections::BTreeSet;
use std::path::Path;

use clanfield_agents::{BehaviorConfig, ClanParameters, InteractionConfig, ParameterOverrides};
use clanfield_types::{ClanId, ClanStrategy, ModeKind};
use clanfield_world::{FieldParams, GridDims, InitialDistribution};
use serde::Deserialize;

use crate::termination::TerminationConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is malformed or out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfiguration {
        reason: reason.into(),
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// RNG seed. Absent means a seed is drawn from entropy and reported in
    /// the run summary.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Simulated time per tick (default: 0.1).
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Resource field settings.
    #[serde(default)]
    pub field: FieldConfig,

    /// Initial clan roster settings.
    #[serde(default)]
    pub clans: ClanConfig,

    /// Execution mode settings.
    #[serde(default)]
    pub mode: ModeConfig,

    /// Behavior state machine tuning.
    #[serde(default)]
    pub behavior: BehaviorConfig,

    /// Pairwise interaction tuning.
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Metrics history settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Optional stopping rules. Absent means the engine never asks to stop.
    #[serde(default)]
    pub termination: Option<TerminationConfig>,

    /// Settings for the headless driver.
    #[serde(default)]
    pub driver: DriverConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            dt: default_dt(),
            field: FieldConfig::default(),
            clans: ClanConfig::default(),
            mode: ModeConfig::default(),
            behavior: BehaviorConfig::default(),
            interaction: InteractionConfig::default(),
            metrics: MetricsConfig::default(),
            termination: None,
            driver: DriverConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidConfiguration`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section for malformed or out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(invalid(format!("dt must be positive, got {}", self.dt)));
        }
        self.field.validate()?;
        self.clans.validate()?;
        self.mode.validate()?;
        self.behavior.validate().map_err(|e| invalid(e.to_string()))?;
        self.interaction.validate().map_err(|e| invalid(e.to_string()))?;
        if self.metrics.history_limit == 0 {
            return Err(invalid("metrics.history_limit must be at least 1"));
        }
        if let Some(termination) = &self.termination {
            termination.validate()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// Resource field configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldConfig {
    /// Grid width in cells (default: 50).
    #[serde(default = "default_grid_side")]
    pub width: usize,

    /// Grid height in cells (default: 50).
    #[serde(default = "default_grid_side")]
    pub height: usize,

    /// Per-cell carrying capacity (default: 100).
    #[serde(default = "default_capacity")]
    pub capacity: f64,

    /// Logistic growth rate (default: 1.5).
    #[serde(default = "default_regen_rate")]
    pub regen_rate: f64,

    /// Standard deviation of regeneration noise (default: 0.05).
    #[serde(default = "default_noise_std")]
    pub noise_std: f64,

    /// Initial layout (default: random uniform between 30% and 80%).
    #[serde(default)]
    pub initial: InitialDistribution,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: default_grid_side(),
            height: default_grid_side(),
            capacity: default_capacity(),
            regen_rate: default_regen_rate(),
            noise_std: default_noise_std(),
            initial: InitialDistribution::default(),
        }
    }
}

impl FieldConfig {
    /// Grid dimensions as a checked value.
    pub fn dims(&self) -> Result<GridDims, ConfigError> {
        GridDims::new(self.width, self.height).map_err(|e| invalid(e.to_string()))
    }

    /// Growth and noise settings for the field.
    pub const fn params(&self) -> FieldParams {
        FieldParams {
            capacity: self.capacity,
            regen_rate: self.regen_rate,
            noise_std: self.noise_std,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.dims()?;
        self.params().validate().map_err(|e| invalid(e.to_string()))?;
        self.initial.validate().map_err(|e| invalid(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Clans
// ---------------------------------------------------------------------------

/// Relative weights for drawing a random clan's strategy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StrategyWeights {
    /// Weight of [`ClanStrategy::Cooperative`] (default: 1).
    #[serde(default = "default_weight")]
    pub cooperative: f64,
    /// Weight of [`ClanStrategy::Aggressive`] (default: 1).
    #[serde(default = "default_weight")]
    pub aggressive: f64,
    /// Weight of [`ClanStrategy::Defensive`] (default: 1).
    #[serde(default = "default_weight")]
    pub defensive: f64,
    /// Weight of [`ClanStrategy::Exploratory`] (default: 1).
    #[serde(default = "default_weight")]
    pub exploratory: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            cooperative: default_weight(),
            aggressive: default_weight(),
            defensive: default_weight(),
            exploratory: default_weight(),
        }
    }
}

impl StrategyWeights {
    /// Weights in [`ClanStrategy::ALL`] order.
    pub const fn as_array(&self) -> [f64; 4] {
        [
            self.cooperative,
            self.aggressive,
            self.defensive,
            self.exploratory,
        ]
    }
}

/// One explicitly configured clan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExplicitClan {
    /// Clan identifier; must be unique.
    pub id: ClanId,
    /// Initial population.
    pub size: u64,
    /// Initial position `[x, y]`.
    pub position: [f64; 2],
    /// Social strategy (default: cooperative).
    #[serde(default = "default_strategy")]
    pub strategy: ClanStrategy,
    /// Initial energy; falls back to `clans.initial_energy`.
    #[serde(default)]
    pub energy: Option<f64>,
    /// Initial morale; falls back to `clans.initial_morale`.
    #[serde(default)]
    pub morale: Option<f64>,
    /// Parameter overrides on top of `clans.defaults`.
    #[serde(default)]
    pub params: ParameterOverrides,
}

/// Initial roster configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClanConfig {
    /// Number of randomly placed clans (default: 5). Ignored when
    /// `explicit` is non-empty.
    #[serde(default = "default_initial_count")]
    pub initial_count: u32,

    /// Smallest random clan size, inclusive (default: 10).
    #[serde(default = "default_min_size")]
    pub min_size: u64,

    /// Largest random clan size, inclusive (default: 20).
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Starting energy (default: 100).
    #[serde(default = "default_vitality")]
    pub initial_energy: f64,

    /// Starting morale (default: 100).
    #[serde(default = "default_vitality")]
    pub initial_morale: f64,

    /// Parameter record shared by every clan.
    #[serde(default)]
    pub defaults: ClanParameters,

    /// Weights for drawing random strategies.
    #[serde(default)]
    pub strategy_weights: StrategyWeights,

    /// Explicit roster; replaces random spawning when non-empty.
    #[serde(default)]
    pub explicit: Vec<ExplicitClan>,
}

impl Default for ClanConfig {
    fn default() -> Self {
        Self {
            initial_count: default_initial_count(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            initial_energy: default_vitality(),
            initial_morale: default_vitality(),
            defaults: ClanParameters::default(),
            strategy_weights: StrategyWeights::default(),
            explicit: Vec::new(),
        }
    }
}

impl ClanConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_size == 0 {
            return Err(invalid("clans.min_size must be at least 1"));
        }
        if self.min_size > self.max_size {
            return Err(invalid(format!(
                "clans.min_size {} exceeds clans.max_size {}",
                self.min_size, self.max_size
            )));
        }
        if i64::try_from(self.max_size).is_err() {
            return Err(invalid("clans.max_size is too large"));
        }
        check_vitality("clans.initial_energy", self.initial_energy)?;
        check_vitality("clans.initial_morale", self.initial_morale)?;
        self.defaults.validate().map_err(|e| invalid(e.to_string()))?;

        let weights = self.strategy_weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(invalid("strategy weights must be non-negative numbers"));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(invalid("strategy weights must not all be zero"));
        }

        let mut seen = BTreeSet::new();
        for clan in &self.explicit {
            if !seen.insert(clan.id) {
                return Err(invalid(format!("duplicate explicit clan id {}", clan.id)));
            }
            if clan.size == 0 {
                return Err(invalid(format!("explicit clan {} has size 0", clan.id)));
            }
            if clan.position.iter().any(|v| !v.is_finite()) {
                return Err(invalid(format!(
                    "explicit clan {} has a non-finite position",
                    clan.id
                )));
            }
            if let Some(energy) = clan.energy {
                check_vitality("explicit clan energy", energy)?;
            }
            if let Some(morale) = clan.morale {
                check_vitality("explicit clan morale", morale)?;
            }
            clan.params
                .apply(&self.defaults)
                .validate()
                .map_err(|e| invalid(format!("explicit clan {}: {e}", clan.id)))?;
        }
        Ok(())
    }
}

fn check_vitality(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be in [0, 100], got {value}")))
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Noise settings for the stochastic mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StochasticConfig {
    /// Std of the per-axis noise added to movement directions (default: 0.1).
    #[serde(default = "default_movement_noise_std")]
    pub movement_noise_std: f64,

    /// Probability that a foraging clan heads for food rather than
    /// wandering (default: 0.8).
    #[serde(default = "default_forage_probability")]
    pub forage_probability: f64,

    /// Std, in radians, of the heading noise on migration and defensive
    /// moves (default: 0.15).
    #[serde(default = "default_decision_noise")]
    pub decision_noise: f64,

    /// Relative std of the resting recovery amounts (default: 0.1).
    #[serde(default = "default_recovery_noise")]
    pub recovery_noise: f64,

    /// Random headings sampled per migration (default: 8).
    #[serde(default = "default_migration_candidates")]
    pub migration_candidates: usize,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            movement_noise_std: default_movement_noise_std(),
            forage_probability: default_forage_probability(),
            decision_noise: default_decision_noise(),
            recovery_noise: default_recovery_noise(),
            migration_candidates: default_migration_candidates(),
        }
    }
}

/// Settings for the deterministic mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeterministicConfig {
    /// Memoize forage targets within a tick (default: true).
    #[serde(default = "default_use_caching")]
    pub use_caching: bool,

    /// Maximum cached entries before the oldest is evicted (default: 1000).
    #[serde(default = "default_cache_limit")]
    pub cache_limit: usize,
}

impl Default for DeterministicConfig {
    fn default() -> Self {
        Self {
            use_caching: default_use_caching(),
            cache_limit: default_cache_limit(),
        }
    }
}

/// Settings for the hybrid mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HybridConfig {
    /// Share of stochastic noise kept, from 0 (deterministic) to 1
    /// (fully stochastic) (default: 0.5).
    #[serde(default = "default_hybrid_weight")]
    pub stochastic_weight: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            stochastic_weight: default_hybrid_weight(),
        }
    }
}

/// Execution mode configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModeConfig {
    /// Which mode drives clan behavior (default: stochastic).
    #[serde(default)]
    pub kind: ModeKind,

    /// Stochastic noise settings; the hybrid mode scales these.
    #[serde(default)]
    pub stochastic: StochasticConfig,

    /// Deterministic cache settings; the hybrid mode shares these.
    #[serde(default)]
    pub deterministic: DeterministicConfig,

    /// Hybrid blend settings.
    #[serde(default)]
    pub hybrid: HybridConfig,
}

impl ModeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.stochastic;
        for (name, value) in [
            ("mode.stochastic.movement_noise_std", s.movement_noise_std),
            ("mode.stochastic.decision_noise", s.decision_noise),
            ("mode.stochastic.recovery_noise", s.recovery_noise),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }
        for (name, value) in [
            ("mode.stochastic.forage_probability", s.forage_probability),
            ("mode.hybrid.stochastic_weight", self.hybrid.stochastic_weight),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        if s.migration_candidates == 0 {
            return Err(invalid("mode.stochastic.migration_candidates must be at least 1"));
        }
        if self.deterministic.use_caching && self.deterministic.cache_limit == 0 {
            return Err(invalid("mode.deterministic.cache_limit must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Metrics and driver
// ---------------------------------------------------------------------------

/// Metrics history configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricsConfig {
    /// Samples kept before the oldest is evicted (default: 1000).
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

/// Settings for the headless driver binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Real-time milliseconds between ticks; 0 runs flat out (default: 100).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Hard stop after this many ticks, independent of the termination
    /// monitor (default: none).
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_dt() -> f64 {
    0.1
}

const fn default_grid_side() -> usize {
    50
}

const fn default_capacity() -> f64 {
    100.0
}

const fn default_regen_rate() -> f64 {
    1.5
}

const fn default_noise_std() -> f64 {
    0.05
}

const fn default_weight() -> f64 {
    1.0
}

const fn default_strategy() -> ClanStrategy {
    ClanStrategy::Cooperative
}

const fn default_initial_count() -> u32 {
    5
}

const fn default_min_size() -> u64 {
    10
}

const fn default_max_size() -> u64 {
    20
}

const fn default_vitality() -> f64 {
    100.0
}

const fn default_movement_noise_std() -> f64 {
    0.1
}

const fn default_forage_probability() -> f64 {
    0.8
}

const fn default_decision_noise() -> f64 {
    0.15
}

const fn default_recovery_noise() -> f64 {
    0.1
}

const fn default_migration_candidates() -> usize {
    8
}

const fn default_use_caching() -> bool {
    true
}

const fn default_cache_limit() -> usize {
    1000
}

const fn default_hybrid_weight() -> f64 {
    0.5
}

const fn default_history_limit() -> usize {
    1000
}

const fn default_tick_interval_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn expect_invalid(yaml: &str) {
        match SimulationConfig::parse(yaml) {
            Err(ConfigError::InvalidConfiguration { .. }) => {}
            other => panic!("expected InvalidConfiguration for {yaml:?}, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.field.width, 50);
        assert_eq!(config.clans.initial_count, 5);
        assert_eq!(config.mode.kind, ModeKind::Stochastic);
        assert!(config.termination.is_none());
    }

    #[test]
    fn full_document_parses() {
        let yaml = r"
seed: 42
dt: 0.1
field:
  width: 10
  height: 10
  capacity: 10.0
  initial:
    kind: uniform
    fraction: 1.0
mode:
  kind: deterministic
  deterministic:
    cache_limit: 64
clans:
  explicit:
    - id: 1
      size: 10
      position: [5.0, 5.0]
      params:
        birth_rate: 1.0
        death_rate: 0.0
    - id: 2
      size: 10
      position: [1.0, 1.0]
      strategy: aggressive
termination:
  max_steps: 50
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.mode.kind, ModeKind::Deterministic);
        assert_eq!(config.mode.deterministic.cache_limit, 64);
        assert_eq!(config.clans.explicit.len(), 2);
        assert_eq!(config.clans.explicit[1].strategy, ClanStrategy::Aggressive);
        assert_eq!(config.termination.unwrap().max_steps, 50);
    }

    #[test]
    fn invalid_values_are_rejected() {
        expect_invalid("dt: 0.0");
        expect_invalid("dt: -1.0");
        expect_invalid("field: {width: 0}");
        expect_invalid("field: {capacity: -5.0}");
        expect_invalid("clans: {min_size: 30, max_size: 20}");
        expect_invalid("clans: {min_size: 0}");
        expect_invalid("mode: {stochastic: {forage_probability: 1.5}}");
        expect_invalid(
            "clans: {strategy_weights: {cooperative: 0, aggressive: 0, defensive: 0, exploratory: 0}}",
        );
        expect_invalid(
            "clans: {explicit: [{id: 1, size: 5, position: [0, 0]}, {id: 1, size: 5, position: [1, 1]}]}",
        );
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            SimulationConfig::parse("field: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = SimulationConfig::from_file(Path::new("/nonexistent/clanfield.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
