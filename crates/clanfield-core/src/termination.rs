//! Stopping rules evaluated after every tick.
//!
//! The monitor is optional: without a `termination` section the engine never
//! asks to stop and the driver decides when to quit. With `auto_stop`
//! disabled only the step limit applies.

use std::collections::VecDeque;

use clanfield_types::{ClanId, TerminationReason};
use serde::Deserialize;

use crate::config::ConfigError;

/// Stopping rule configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerminationConfig {
    /// Apply the population-based rules (default: true).
    #[serde(default = "default_auto_stop")]
    pub auto_stop: bool,

    /// Stop after this many ticks (default: 500).
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Consecutive empty ticks before declaring extinction (default: 5).
    #[serde(default = "default_extinction_grace")]
    pub extinction_grace: u64,

    /// Earliest tick at which a lone survivor counts as dominant
    /// (default: 50).
    #[serde(default = "default_dominance_after")]
    pub dominance_after: u64,

    /// Totals compared for convergence (default: 20).
    #[serde(default = "default_convergence_window")]
    pub convergence_window: usize,

    /// Ticks observed before convergence is considered (default: 50).
    #[serde(default = "default_convergence_min_samples")]
    pub convergence_min_samples: u64,

    /// Converged when the window's variance is below this fraction of its
    /// mean (default: 0.02).
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// Population at or below which the run is critical (default: 5).
    #[serde(default = "default_critical_population")]
    pub critical_population: u64,

    /// Earliest tick for the critical rule (default: 100).
    #[serde(default = "default_critical_after")]
    pub critical_after: u64,

    /// Clan size at or below which a clan counts as vestigial (default: 3).
    #[serde(default = "default_degenerate_size")]
    pub degenerate_size: u64,

    /// Earliest tick for the degenerate rule (default: 200).
    #[serde(default = "default_degenerate_after")]
    pub degenerate_after: u64,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            auto_stop: default_auto_stop(),
            max_steps: default_max_steps(),
            extinction_grace: default_extinction_grace(),
            dominance_after: default_dominance_after(),
            convergence_window: default_convergence_window(),
            convergence_min_samples: default_convergence_min_samples(),
            convergence_threshold: default_convergence_threshold(),
            critical_population: default_critical_population(),
            critical_after: default_critical_after(),
            degenerate_size: default_degenerate_size(),
            degenerate_after: default_degenerate_after(),
        }
    }
}

impl TerminationConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidConfiguration {
                reason: "termination.max_steps must be at least 1".to_owned(),
            });
        }
        if self.convergence_window < 2 {
            return Err(ConfigError::InvalidConfiguration {
                reason: "termination.convergence_window must be at least 2".to_owned(),
            });
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return Err(ConfigError::InvalidConfiguration {
                reason: format!(
                    "termination.convergence_threshold must be non-negative, got {}",
                    self.convergence_threshold
                ),
            });
        }
        Ok(())
    }
}

const fn default_auto_stop() -> bool {
    true
}

const fn default_max_steps() -> u64 {
    500
}

const fn default_extinction_grace() -> u64 {
    5
}

const fn default_dominance_after() -> u64 {
    50
}

const fn default_convergence_window() -> usize {
    20
}

const fn default_convergence_min_samples() -> u64 {
    50
}

const fn default_convergence_threshold() -> f64 {
    0.02
}

const fn default_critical_population() -> u64 {
    5
}

const fn default_critical_after() -> u64 {
    100
}

const fn default_degenerate_size() -> u64 {
    3
}

const fn default_degenerate_after() -> u64 {
    200
}

/// Tracks the run and reports the first stopping rule that fires.
#[derive(Debug, Clone)]
pub struct TerminationMonitor {
    config: TerminationConfig,
    empty_streak: u64,
    observed: u64,
    window: VecDeque<f64>,
}

impl TerminationMonitor {
    /// A fresh monitor.
    pub fn new(config: TerminationConfig) -> Self {
        let window = VecDeque::with_capacity(config.convergence_window);
        Self {
            config,
            empty_streak: 0,
            observed: 0,
            window,
        }
    }

    /// The rules being applied.
    pub const fn config(&self) -> &TerminationConfig {
        &self.config
    }

    /// Record the state after `tick` and check every rule.
    ///
    /// `clans` lists each surviving clan's id and size. Rules are checked
    /// in order: extinction, dominance, critical population, degenerate
    /// system, convergence, step limit.
    #[allow(clippy::cast_precision_loss)]
    pub fn observe(&mut self, tick: u64, clans: &[(ClanId, u64)]) -> Option<TerminationReason> {
        let total: u64 = clans.iter().map(|&(_, size)| size).sum();
        self.observed = self.observed.saturating_add(1);
        if self.window.len() >= self.config.convergence_window {
            self.window.pop_front();
        }
        self.window.push_back(total as f64);

        if total == 0 {
            self.empty_streak = self.empty_streak.saturating_add(1);
        } else {
            self.empty_streak = 0;
        }

        if self.config.auto_stop {
            if let Some(reason) = self.population_rule(tick, clans, total) {
                return Some(reason);
            }
        }
        (tick >= self.config.max_steps).then_some(TerminationReason::MaxSteps {
            steps: self.config.max_steps,
        })
    }

    fn population_rule(&self, tick: u64, clans: &[(ClanId, u64)], total: u64) -> Option<TerminationReason> {
        let cfg = &self.config;
        if total == 0 {
            return (self.empty_streak >= cfg.extinction_grace).then_some(TerminationReason::Extinction);
        }
        if let [(clan_id, _)] = clans {
            if tick >= cfg.dominance_after {
                return Some(TerminationReason::Dominance { clan_id: *clan_id });
            }
        }
        if tick >= cfg.critical_after && total <= cfg.critical_population {
            return Some(TerminationReason::CriticalPopulation { remaining: total });
        }
        if tick >= cfg.degenerate_after
            && clans.len() > 1
            && clans.iter().all(|&(_, size)| size <= cfg.degenerate_size)
        {
            return Some(TerminationReason::Degenerate);
        }
        self.converged()
    }

    #[allow(clippy::cast_precision_loss)]
    fn converged(&self) -> Option<TerminationReason> {
        let cfg = &self.config;
        if self.observed < cfg.convergence_min_samples || self.window.len() < cfg.convergence_window {
            return None;
        }
        let n = self.window.len() as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        let variance = self.window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean > 0.0 && variance < cfg.convergence_threshold * mean)
            .then_some(TerminationReason::Converged {
                mean_population: mean,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ClanId {
        ClanId::new(n)
    }

    #[test]
    fn extinction_waits_for_the_grace_period() {
        let mut monitor = TerminationMonitor::new(TerminationConfig::default());
        for tick in 1..5 {
            assert_eq!(monitor.observe(tick, &[]), None);
        }
        assert_eq!(monitor.observe(5, &[]), Some(TerminationReason::Extinction));
    }

    #[test]
    fn lone_survivor_dominates_after_window() {
        let mut monitor = TerminationMonitor::new(TerminationConfig::default());
        assert_eq!(monitor.observe(10, &[(id(3), 40)]), None);
        assert_eq!(
            monitor.observe(50, &[(id(3), 40)]),
            Some(TerminationReason::Dominance { clan_id: id(3) })
        );
    }

    #[test]
    fn critical_and_degenerate_rules() {
        let mut monitor = TerminationMonitor::new(TerminationConfig::default());
        assert_eq!(
            monitor.observe(100, &[(id(1), 2), (id(2), 2)]),
            Some(TerminationReason::CriticalPopulation { remaining: 4 })
        );
        let mut monitor = TerminationMonitor::new(TerminationConfig::default());
        assert_eq!(
            monitor.observe(200, &[(id(1), 3), (id(2), 3), (id(3), 2)]),
            Some(TerminationReason::Degenerate)
        );
    }

    #[test]
    fn stable_population_converges() {
        let mut monitor = TerminationMonitor::new(TerminationConfig::default());
        let clans = [(id(1), 30), (id(2), 30)];
        for tick in 1..50 {
            assert_eq!(monitor.observe(tick, &clans), None);
        }
        assert_eq!(
            monitor.observe(50, &clans),
            Some(TerminationReason::Converged {
                mean_population: 60.0
            })
        );
    }

    #[test]
    fn without_auto_stop_only_the_step_limit_applies() {
        let mut monitor = TerminationMonitor::new(TerminationConfig {
            auto_stop: false,
            max_steps: 10,
            ..TerminationConfig::default()
        });
        for tick in 1..10 {
            assert_eq!(monitor.observe(tick, &[]), None);
        }
        assert_eq!(
            monitor.observe(10, &[]),
            Some(TerminationReason::MaxSteps { steps: 10 })
        );
    }
}
