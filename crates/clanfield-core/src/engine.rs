//! The simulation engine and its tick cycle.
//!
//! Each call to [`SimulationEngine::step`] advances the world by one tick of
//! `dt` simulated time, in this order:
//!
//! 1. **Regenerate** the resource field (logistic growth plus noise).
//! 2. **Act**: every clan perceives, picks a behavior state, carries it out
//!    through the execution mode, and eats. Each clan works on a copy that
//!    is committed only if the whole update succeeds; a failing clan is
//!    skipped for the phase and reported in the [`TickSummary`].
//! 3. **Interact**: every close pair cooperates, fights, or competes.
//! 4. **Population**: births, deaths, starvation, and combat casualties.
//! 5. **Extinction**: clans with no members are removed and forgotten by
//!    the survivors.
//! 6. **Territory**: clans expand into free frontier cells and are pruned
//!    back to their size cap. Failures here are isolated per clan too.
//! 7. **Metrics**: system-wide numbers are recorded.
//! 8. **Clock**: time and tick advance; stopping rules are checked.
//!
//! All randomness comes from one seeded [`RandomSource`], so two engines
//! built from the same configuration produce identical runs.

use std::collections::BTreeSet;

use clanfield_agents::{
    resolve_interactions, AgentError, BehaviorConfig, Clan, ClanView, Consumption,
};
use clanfield_types::{
    ClanId, SimulationSnapshot, SimulationSummary, SurvivorSummary, SystemMetrics,
    TerminationReason,
};
use clanfield_world::{Cell, RandomSource, ResourceField};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::error::EngineError;
use crate::metrics::{MetricsHistory, MetricsSample};
use crate::mode::{BehaviorContext, BehaviorExecutor, SimulationMode};
use crate::spawner::spawn_clans;
use crate::termination::TerminationMonitor;

/// Per-clan phases whose failures are isolated to the failing clan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClanPhase {
    /// Perception, behavior, and consumption.
    Act,
    /// Territory expansion and pruning.
    Territory,
}

impl core::fmt::Display for ClanPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Act => f.write_str("act"),
            Self::Territory => f.write_str("territory"),
        }
    }
}

/// A clan whose update was skipped for one phase of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClanFailure {
    /// The clan that was skipped.
    pub clan_id: ClanId,
    /// Which phase was skipped.
    pub phase: ClanPhase,
    /// What went wrong.
    pub message: String,
}

impl ClanFailure {
    fn record(tick: u64, clan_id: ClanId, phase: ClanPhase, err: &AgentError) -> Self {
        warn!(tick, %clan_id, %phase, %err, "clan update failed, skipping phase this tick");
        Self {
            clan_id,
            phase,
            message: err.to_string(),
        }
    }
}

/// Summary of a single completed tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// The tick number that was just completed.
    pub tick: u64,
    /// Simulated time after the tick.
    pub time: f64,
    /// Net change in field resources from regeneration.
    pub regenerated: f64,
    /// Resources eaten by all clans.
    pub consumed: f64,
    /// Alliances formed.
    pub alliances: u32,
    /// Combats fought.
    pub combats: u32,
    /// Competitions resolved.
    pub competitions: u32,
    /// Individuals gained across all clans.
    pub births: u64,
    /// Individuals lost across all clans.
    pub deaths: u64,
    /// Clans removed this tick.
    pub extinct: Vec<ClanId>,
    /// Per-clan phases skipped this tick.
    pub failures: Vec<ClanFailure>,
    /// System-wide numbers after the tick.
    pub metrics: SystemMetrics,
    /// Stopping rule that fired, if any.
    pub termination: Option<TerminationReason>,
}

/// A running clan simulation.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    config: SimulationConfig,
    seed: u64,
    rng: RandomSource,
    field: ResourceField,
    clans: Vec<Clan>,
    mode: SimulationMode,
    time: f64,
    tick: u64,
    initial_clan_count: usize,
    metrics: MetricsHistory,
    termination: Option<TerminationMonitor>,
    last_summary: Option<TickSummary>,
}

impl SimulationEngine {
    /// Validate `config` and build the initial world and roster.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if validation fails or
    /// [`EngineError::World`] if the field cannot be generated.
    pub fn new(config: SimulationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let rng = RandomSource::from_optional_seed(config.seed);
        Self::build(config, rng)
    }

    fn build(config: SimulationConfig, mut rng: RandomSource) -> Result<Self, EngineError> {
        let seed = rng.seed();
        let dims = config.field.dims()?;
        let field = ResourceField::generate(dims, config.field.params(), &config.field.initial, &mut rng)?;
        let clans = spawn_clans(&config.clans, dims, &config.behavior, &mut rng)?;
        let mode = SimulationMode::from_config(&config.mode);

        info!(
            seed,
            width = dims.width(),
            height = dims.height(),
            clans = clans.len(),
            mode = %mode.kind(),
            "simulation initialized"
        );

        Ok(Self {
            seed,
            rng,
            field,
            initial_clan_count: clans.len(),
            clans,
            mode,
            time: 0.0,
            tick: 0,
            metrics: MetricsHistory::new(config.metrics.history_limit),
            termination: config.termination.clone().map(TerminationMonitor::new),
            last_summary: None,
            config,
        })
    }

    /// Advance the simulation by one tick.
    ///
    /// Returns the stopping rule that fired, if any. Stepping past a
    /// termination is allowed; the rule is re-evaluated each tick.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for failures outside the isolated
    /// per-clan phases, which with a validated configuration do not occur.
    pub fn step(&mut self) -> Result<Option<TerminationReason>, EngineError> {
        let dt = self.config.dt;
        let tick = self.tick.saturating_add(1);
        let dims = self.field.dims();

        // Phase 1: regenerate
        let regenerated = self.field.regenerate(dt, &mut self.rng)?;

        // Phase 2: act
        self.mode.begin_tick();
        let roster: Vec<ClanView> = self.clans.iter().map(ClanView::from).collect();
        let mut consumed = 0.0;
        let mut failures = Vec::new();
        for slot in &mut self.clans {
            let mut working = slot.clone();
            match act(
                &mut working,
                &mut self.field,
                &mut self.mode,
                &mut self.rng,
                &roster,
                &self.config.behavior,
                dt,
            ) {
                Ok(consumption) => {
                    consumed += consumption.consumed;
                    *slot = working;
                }
                Err(err) => failures.push(ClanFailure::record(tick, slot.id, ClanPhase::Act, &err)),
            }
        }

        // Phase 3: interact
        let report = resolve_interactions(
            &mut self.clans,
            dims,
            &self.config.interaction,
            &self.config.behavior,
            &mut self.rng,
            dt,
        )
        .map_err(|source| EngineError::Interaction { source })?;

        // Phase 4: population
        let mut births = 0_u64;
        let mut deaths = 0_u64;
        for clan in &mut self.clans {
            let change = clan.update_population(&self.config.behavior, dt);
            births = births.saturating_add(change.after.saturating_sub(change.before));
            deaths = deaths.saturating_add(change.before.saturating_sub(change.after));
        }

        // Phase 5: extinction
        let extinct: Vec<ClanId> = self
            .clans
            .iter()
            .filter(|c| !c.is_alive())
            .map(|c| c.id)
            .collect();
        if !extinct.is_empty() {
            self.clans.retain(Clan::is_alive);
            for clan in &mut self.clans {
                for &gone in &extinct {
                    clan.forget(gone);
                }
            }
            for clan_id in &extinct {
                info!(tick, %clan_id, "clan went extinct");
            }
        }

        // Phase 6: territory
        let mut claimed: BTreeSet<Cell> = self
            .clans
            .iter()
            .flat_map(|c| c.territory.cells())
            .collect();
        for clan in &mut self.clans {
            let before = clan.territory.clone();
            if let Err(err) = clan.update_territory(&mut claimed, dims, &self.config.behavior, &mut self.rng) {
                clan.territory = before;
                failures.push(ClanFailure::record(tick, clan.id, ClanPhase::Territory, &err));
            }
        }

        // Phase 7: metrics, stamped with this step's number and start time
        let metrics = self.system_metrics();
        self.metrics.record(MetricsSample {
            tick,
            time: self.time,
            metrics,
        });

        // Phase 8: clock
        self.tick = tick;
        self.time += dt;

        // Stopping rules
        let termination = self.termination.as_mut().and_then(|monitor| {
            let sizes: Vec<(ClanId, u64)> = self.clans.iter().map(|c| (c.id, c.size)).collect();
            monitor.observe(tick, &sizes)
        });
        if let Some(reason) = &termination {
            info!(tick, %reason, "termination condition met");
        }

        debug!(
            tick,
            population = metrics.total_population,
            clans = metrics.active_clan_count,
            regenerated,
            consumed,
            alliances = report.alliances,
            combats = report.combats,
            competitions = report.competitions,
            "tick complete"
        );

        self.last_summary = Some(TickSummary {
            tick,
            time: self.time,
            regenerated,
            consumed,
            alliances: report.alliances,
            combats: report.combats,
            competitions: report.competitions,
            births,
            deaths,
            extinct,
            failures,
            metrics,
            termination: termination.clone(),
        });
        Ok(termination)
    }

    /// Full observable state.
    pub fn state(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            time: self.time,
            tick: self.tick,
            mode: self.mode.kind(),
            clans: self.clans.iter().map(Clan::snapshot).collect(),
            resource_grid: self.field.to_grid(),
            system_metrics: self.system_metrics(),
        }
    }

    /// End-of-run figures as of now.
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            total_steps: self.tick,
            final_time: self.time,
            final_population: self.total_population(),
            initial_clan_count: self.initial_clan_count,
            survivors: self
                .clans
                .iter()
                .map(|c| SurvivorSummary {
                    id: c.id,
                    size: c.size,
                    energy: c.energy,
                    state: c.state,
                    strategy: c.strategy,
                })
                .collect(),
            seed: self.seed,
        }
    }

    /// Rebuild the initial world from the same configuration and seed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::World`] if the field cannot be regenerated.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        let rng = RandomSource::seeded(self.seed);
        *self = Self::build(self.config.clone(), rng)?;
        info!(seed = self.seed, "simulation reset");
        Ok(())
    }

    /// Aggregate numbers for the current state.
    #[allow(clippy::cast_precision_loss)]
    pub fn system_metrics(&self) -> SystemMetrics {
        let avg_energy = if self.clans.is_empty() {
            0.0
        } else {
            self.clans.iter().map(|c| c.energy).sum::<f64>() / self.clans.len() as f64
        };
        SystemMetrics {
            total_population: self.total_population(),
            active_clan_count: self.clans.len(),
            avg_energy,
            total_resources: self.field.total(),
        }
    }

    fn total_population(&self) -> u64 {
        self.clans.iter().map(|c| c.size).sum()
    }

    /// Seed actually used, including one drawn from entropy.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Ticks completed.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time elapsed.
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// The configuration the engine was built from.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The resource field.
    pub const fn field(&self) -> &ResourceField {
        &self.field
    }

    /// Living clans in roster order.
    pub fn clans(&self) -> &[Clan] {
        &self.clans
    }

    /// Look up a living clan.
    pub fn clan(&self, id: ClanId) -> Option<&Clan> {
        self.clans.iter().find(|c| c.id == id)
    }

    /// The execution mode.
    pub const fn mode(&self) -> &SimulationMode {
        &self.mode
    }

    /// Recorded metrics.
    pub const fn metrics(&self) -> &MetricsHistory {
        &self.metrics
    }

    /// Summary of the most recent tick.
    pub const fn last_summary(&self) -> Option<&TickSummary> {
        self.last_summary.as_ref()
    }
}

/// One clan's act phase: perceive, decide, execute, eat.
fn act(
    clan: &mut Clan,
    field: &mut ResourceField,
    mode: &mut SimulationMode,
    rng: &mut RandomSource,
    roster: &[ClanView],
    behavior: &BehaviorConfig,
    dt: f64,
) -> Result<Consumption, AgentError> {
    clan.perceive(field, roster, behavior);
    clan.decide_state(behavior);
    let ctx = BehaviorContext {
        field: &*field,
        roster,
        behavior,
        dt,
    };
    mode.apply_behavior(clan, &ctx, rng)?;
    clan.check_finite()?;
    let cell = field.dims().cell_of(clan.position);
    let level = field.get_cell(cell);
    let consumption = clan.consume(field, behavior, dt)?;
    if let Err(err) = clan.check_finite() {
        // The working copy is discarded, so its meal is put back.
        field.set_cell(cell, level);
        return Err(err);
    }
    if consumption.consumed > 0.0 {
        mode.field_changed(cell, field.dims());
    }
    Ok(consumption)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn small_config(seed: u64) -> SimulationConfig {
        SimulationConfig::parse(&format!(
            "seed: {seed}\nfield: {{width: 16, height: 12}}\nclans: {{initial_count: 4}}\n"
        ))
        .unwrap()
    }

    #[test]
    fn step_advances_clock() {
        let mut engine = SimulationEngine::new(small_config(5)).unwrap();
        assert_eq!(engine.tick(), 0);
        engine.step().unwrap();
        engine.step().unwrap();
        assert_eq!(engine.tick(), 2);
        assert!((engine.time() - 0.2).abs() < 1e-12);
        assert_eq!(engine.metrics().len(), 2);
        assert_eq!(engine.last_summary().map(|s| s.tick), Some(2));
    }

    #[test]
    fn metrics_are_stamped_with_the_producing_step() {
        let mut engine = SimulationEngine::new(small_config(5)).unwrap();
        for _ in 0..3 {
            engine.step().unwrap();
        }
        let stamps: Vec<(u64, f64)> = engine.metrics().iter().map(|s| (s.tick, s.time)).collect();
        assert_eq!(stamps.len(), 3);
        for (n, (tick, time)) in stamps.into_iter().enumerate() {
            assert_eq!(tick, u64::try_from(n).unwrap() + 1);
            assert!((time - 0.1 * f64::from(u32::try_from(n).unwrap())).abs() < 1e-12);
        }
        let last = engine.metrics().latest().unwrap();
        assert_eq!(last.metrics, engine.system_metrics());
    }

    #[test]
    fn failed_meal_is_returned_to_the_field() {
        let mut engine = SimulationEngine::new(small_config(4)).unwrap();
        // inf - inf leaves energy NaN once the clan has eaten.
        let behavior = BehaviorConfig {
            energy_conversion: f64::INFINITY,
            energy_decay: f64::INFINITY,
            ..BehaviorConfig::default()
        };
        let roster: Vec<ClanView> = engine.clans.iter().map(ClanView::from).collect();
        let mut clan = engine.clans.first().unwrap().clone();
        let before = engine.field.to_grid();
        let result = act(
            &mut clan,
            &mut engine.field,
            &mut engine.mode,
            &mut engine.rng,
            &roster,
            &behavior,
            0.1,
        );
        assert!(matches!(
            result,
            Err(AgentError::NonFiniteState { field: "energy", .. })
        ));
        assert_eq!(engine.field.to_grid(), before);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut engine = SimulationEngine::new(small_config(9)).unwrap();
        let initial = serde_json::to_string(&engine.state()).unwrap();
        for _ in 0..5 {
            engine.step().unwrap();
        }
        engine.reset().unwrap();
        assert_eq!(engine.tick(), 0);
        assert_eq!(serde_json::to_string(&engine.state()).unwrap(), initial);
    }

    #[test]
    fn entropy_seed_is_reported() {
        let mut config = small_config(0);
        config.seed = None;
        let engine = SimulationEngine::new(config).unwrap();
        assert_eq!(engine.summary().seed, engine.seed());
    }

    #[test]
    fn summary_counts_survivors() {
        let mut engine = SimulationEngine::new(small_config(2)).unwrap();
        engine.step().unwrap();
        let summary = engine.summary();
        assert_eq!(summary.total_steps, 1);
        assert_eq!(summary.initial_clan_count, 4);
        assert_eq!(summary.survivors.len(), engine.clans().len());
        assert_eq!(
            summary.final_population,
            summary.survivors.iter().map(|s| s.size).sum::<u64>()
        );
    }
}
