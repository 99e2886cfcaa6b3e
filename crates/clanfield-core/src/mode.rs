//! Execution modes: how faithfully clans follow their chosen behavior.
//!
//! The behavior state machine in `clanfield-agents` decides *what* a clan
//! wants to do. A [`BehaviorExecutor`] decides *how* that is carried out:
//!
//! - [`StochasticMode`] perturbs headings, sometimes wanders instead of
//!   foraging, samples random migration headings, and jitters recovery.
//! - [`DeterministicMode`] follows targets exactly, scores the eight compass
//!   headings for migration, and memoizes forage targets within a tick. The
//!   random source is only consulted to break exact ties.
//! - [`HybridMode`] uses deterministic targeting with the stochastic noise
//!   scaled down by a blend weight.
//!
//! Every mode draws from the engine's single [`RandomSource`], so a seeded
//! run is reproducible in all three.

use std::collections::{BTreeMap, VecDeque};
use std::f64::consts::{FRAC_PI_4, TAU};

use clanfield_agents::{AgentError, BehaviorConfig, Clan, ClanView, richest_cell};
use clanfield_types::{BehaviorState, ModeKind};
use clanfield_world::{Cell, GridDims, Position, RandomSource, ResourceField};

use crate::config::{DeterministicConfig, ModeConfig, StochasticConfig};

/// Scores closer than this are treated as tied.
const SCORE_TIE_EPSILON: f64 = 1e-12;

/// Read-only inputs shared by every clan's behavior in one tick.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorContext<'a> {
    /// The resource field.
    pub field: &'a ResourceField,
    /// Every clan as it stood at the start of the tick.
    pub roster: &'a [ClanView],
    /// Behavior tuning.
    pub behavior: &'a BehaviorConfig,
    /// Simulated time step.
    pub dt: f64,
}

/// Carries out a clan's chosen behavior state.
pub trait BehaviorExecutor {
    /// Which mode this is.
    fn kind(&self) -> ModeKind;

    /// Called once before any clan acts in a tick.
    fn begin_tick(&mut self) {}

    /// Called after a clan eats from `cell`, changing its level.
    fn field_changed(&mut self, _cell: Cell, _dims: GridDims) {}

    /// Move and otherwise act on `clan` according to `clan.state`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when a random draw rejects its arguments.
    fn apply_behavior(
        &mut self,
        clan: &mut Clan,
        ctx: &BehaviorContext<'_>,
        rng: &mut RandomSource,
    ) -> Result<(), AgentError>;
}

// ---------------------------------------------------------------------------
// Noise
// ---------------------------------------------------------------------------

/// How much randomness a mode injects into behavior execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseProfile {
    /// Std of the per-axis noise on movement directions.
    pub movement_noise_std: f64,
    /// Probability of heading for food when foraging.
    pub forage_probability: f64,
    /// Std, in radians, of heading noise on migration and defense.
    pub decision_noise: f64,
    /// Relative std of resting recovery.
    pub recovery_noise: f64,
    /// Random migration headings to sample; `None` scores the compass.
    pub random_headings: Option<usize>,
}

impl NoiseProfile {
    /// No noise at all: exact targeting and compass migration.
    pub const fn silent() -> Self {
        Self {
            movement_noise_std: 0.0,
            forage_probability: 1.0,
            decision_noise: 0.0,
            recovery_noise: 0.0,
            random_headings: None,
        }
    }

    /// Full stochastic noise.
    pub const fn stochastic(config: &StochasticConfig) -> Self {
        Self {
            movement_noise_std: config.movement_noise_std,
            forage_probability: config.forage_probability,
            decision_noise: config.decision_noise,
            recovery_noise: config.recovery_noise,
            random_headings: Some(config.migration_candidates),
        }
    }

    /// Stochastic noise scaled by `weight` on top of compass migration.
    pub fn blended(config: &StochasticConfig, weight: f64) -> Self {
        let weight = weight.clamp(0.0, 1.0);
        Self {
            movement_noise_std: config.movement_noise_std * weight,
            forage_probability: weight.mul_add(config.forage_probability - 1.0, 1.0),
            decision_noise: config.decision_noise * weight,
            recovery_noise: config.recovery_noise * weight,
            random_headings: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Direction cache
// ---------------------------------------------------------------------------

/// Hit and miss counters for a [`DirectionCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to compute the target.
    pub misses: u64,
    /// Entries currently held.
    pub entries: usize,
}

type CacheKey = (Cell, u64);

/// Per-tick memo of forage targets keyed by cell and perception radius.
///
/// Targets are computed from field levels alone, so any clan standing on
/// the same cell with the same radius gets the same answer. An entry is
/// dropped as soon as a cell inside its disc is eaten from, and the whole
/// cache is cleared at the start of every tick. Holds at most `limit`
/// entries; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct DirectionCache {
    limit: usize,
    entries: BTreeMap<CacheKey, Option<Cell>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl DirectionCache {
    /// An empty cache holding at most `limit` entries (minimum 1).
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            entries: BTreeMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached target for `(cell, radius)`, computing it with `compute` on a
    /// miss.
    pub fn lookup(
        &mut self,
        cell: Cell,
        radius: f64,
        compute: impl FnOnce() -> Option<Cell>,
    ) -> Option<Cell> {
        let key = (cell, radius.to_bits());
        if let Some(&target) = self.entries.get(&key) {
            self.hits = self.hits.saturating_add(1);
            return target;
        }
        self.misses = self.misses.saturating_add(1);
        let target = compute();
        if self.entries.len() >= self.limit {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key, target);
        self.order.push_back(key);
        target
    }

    /// Drop every entry whose disc contains `cell`.
    pub fn invalidate_around(&mut self, cell: Cell, dims: GridDims) {
        let stale: Vec<CacheKey> = self
            .entries
            .keys()
            .filter(|(center, radius)| dims.cell_distance(*center, cell) <= f64::from_bits(*radius))
            .copied()
            .collect();
        if stale.is_empty() {
            return;
        }
        for key in &stale {
            self.entries.remove(key);
        }
        self.order.retain(|key| !stale.contains(key));
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

fn cache_for(config: &DeterministicConfig) -> Option<DirectionCache> {
    config
        .use_caching
        .then(|| DirectionCache::new(config.cache_limit))
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// Noisy execution.
#[derive(Debug, Clone)]
pub struct StochasticMode {
    profile: NoiseProfile,
}

impl StochasticMode {
    /// Build from stochastic settings.
    pub const fn new(config: &StochasticConfig) -> Self {
        Self {
            profile: NoiseProfile::stochastic(config),
        }
    }
}

impl BehaviorExecutor for StochasticMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Stochastic
    }

    fn apply_behavior(
        &mut self,
        clan: &mut Clan,
        ctx: &BehaviorContext<'_>,
        rng: &mut RandomSource,
    ) -> Result<(), AgentError> {
        execute(clan, ctx, rng, &self.profile, None)
    }
}

/// Exact execution with an optional per-tick target cache.
#[derive(Debug, Clone)]
pub struct DeterministicMode {
    cache: Option<DirectionCache>,
}

impl DeterministicMode {
    /// Build from deterministic settings.
    pub fn new(config: &DeterministicConfig) -> Self {
        Self {
            cache: cache_for(config),
        }
    }

    /// Cache counters, if caching is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(DirectionCache::stats)
    }
}

impl BehaviorExecutor for DeterministicMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Deterministic
    }

    fn begin_tick(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.clear();
        }
    }

    fn field_changed(&mut self, cell: Cell, dims: GridDims) {
        if let Some(cache) = &mut self.cache {
            cache.invalidate_around(cell, dims);
        }
    }

    fn apply_behavior(
        &mut self,
        clan: &mut Clan,
        ctx: &BehaviorContext<'_>,
        rng: &mut RandomSource,
    ) -> Result<(), AgentError> {
        execute(clan, ctx, rng, &NoiseProfile::silent(), self.cache.as_mut())
    }
}

/// Deterministic targeting with scaled stochastic noise.
#[derive(Debug, Clone)]
pub struct HybridMode {
    profile: NoiseProfile,
    cache: Option<DirectionCache>,
}

impl HybridMode {
    /// Build from the stochastic and deterministic settings and the blend
    /// weight (0 = deterministic, 1 = full noise).
    pub fn new(stochastic: &StochasticConfig, deterministic: &DeterministicConfig, weight: f64) -> Self {
        Self {
            profile: NoiseProfile::blended(stochastic, weight),
            cache: cache_for(deterministic),
        }
    }

    /// Cache counters, if caching is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(DirectionCache::stats)
    }
}

impl BehaviorExecutor for HybridMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Hybrid
    }

    fn begin_tick(&mut self) {
        if let Some(cache) = &mut self.cache {
            cache.clear();
        }
    }

    fn field_changed(&mut self, cell: Cell, dims: GridDims) {
        if let Some(cache) = &mut self.cache {
            cache.invalidate_around(cell, dims);
        }
    }

    fn apply_behavior(
        &mut self,
        clan: &mut Clan,
        ctx: &BehaviorContext<'_>,
        rng: &mut RandomSource,
    ) -> Result<(), AgentError> {
        execute(clan, ctx, rng, &self.profile, self.cache.as_mut())
    }
}

/// The configured execution mode.
#[derive(Debug, Clone)]
pub enum SimulationMode {
    /// See [`StochasticMode`].
    Stochastic(StochasticMode),
    /// See [`DeterministicMode`].
    Deterministic(DeterministicMode),
    /// See [`HybridMode`].
    Hybrid(HybridMode),
}

impl SimulationMode {
    /// Build the mode selected by `config.kind`.
    pub fn from_config(config: &ModeConfig) -> Self {
        match config.kind {
            ModeKind::Stochastic => Self::Stochastic(StochasticMode::new(&config.stochastic)),
            ModeKind::Deterministic => {
                Self::Deterministic(DeterministicMode::new(&config.deterministic))
            }
            ModeKind::Hybrid => Self::Hybrid(HybridMode::new(
                &config.stochastic,
                &config.deterministic,
                config.hybrid.stochastic_weight,
            )),
        }
    }

    /// Cache counters for the modes that cache.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        match self {
            Self::Stochastic(_) => None,
            Self::Deterministic(mode) => mode.cache_stats(),
            Self::Hybrid(mode) => mode.cache_stats(),
        }
    }
}

impl BehaviorExecutor for SimulationMode {
    fn kind(&self) -> ModeKind {
        match self {
            Self::Stochastic(mode) => mode.kind(),
            Self::Deterministic(mode) => mode.kind(),
            Self::Hybrid(mode) => mode.kind(),
        }
    }

    fn begin_tick(&mut self) {
        match self {
            Self::Stochastic(mode) => mode.begin_tick(),
            Self::Deterministic(mode) => mode.begin_tick(),
            Self::Hybrid(mode) => mode.begin_tick(),
        }
    }

    fn field_changed(&mut self, cell: Cell, dims: GridDims) {
        match self {
            Self::Stochastic(mode) => mode.field_changed(cell, dims),
            Self::Deterministic(mode) => mode.field_changed(cell, dims),
            Self::Hybrid(mode) => mode.field_changed(cell, dims),
        }
    }

    fn apply_behavior(
        &mut self,
        clan: &mut Clan,
        ctx: &BehaviorContext<'_>,
        rng: &mut RandomSource,
    ) -> Result<(), AgentError> {
        match self {
            Self::Stochastic(mode) => mode.apply_behavior(clan, ctx, rng),
            Self::Deterministic(mode) => mode.apply_behavior(clan, ctx, rng),
            Self::Hybrid(mode) => mode.apply_behavior(clan, ctx, rng),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-state execution
// ---------------------------------------------------------------------------

fn execute(
    clan: &mut Clan,
    ctx: &BehaviorContext<'_>,
    rng: &mut RandomSource,
    profile: &NoiseProfile,
    cache: Option<&mut DirectionCache>,
) -> Result<(), AgentError> {
    match clan.state {
        BehaviorState::Foraging => forage(clan, ctx, rng, profile, cache),
        BehaviorState::Migrating => migrate(clan, ctx, rng, profile),
        BehaviorState::Resting => rest(clan, ctx, rng, profile),
        BehaviorState::Defending => defend(clan, ctx, rng, profile),
        BehaviorState::Fighting => fight(clan, ctx, rng, profile),
    }
}

fn forage(
    clan: &mut Clan,
    ctx: &BehaviorContext<'_>,
    rng: &mut RandomSource,
    profile: &NoiseProfile,
    cache: Option<&mut DirectionCache>,
) -> Result<(), AgentError> {
    let dims = ctx.field.dims();
    let step = clan.params.movement_speed * ctx.dt;

    if profile.forage_probability < 1.0 && !rng.chance(profile.forage_probability) {
        let angle = rng.uniform(0.0, TAU)?;
        clan.move_along((angle.cos(), angle.sin()), step, dims);
        return Ok(());
    }

    let here = clan.cell(dims);
    let radius = clan.params.perception_radius;
    let target = cache.map_or_else(
        || clan.forage_target(dims),
        |cache| {
            cache.lookup(here, radius, || {
                richest_cell(dims, here, radius, |cell| Some(ctx.field.get_cell(cell)))
            })
        },
    );
    let Some(target) = target else {
        return Ok(());
    };
    head_for(clan, target.center(), step, dims, rng, profile.movement_noise_std)
}

fn migrate(
    clan: &mut Clan,
    ctx: &BehaviorContext<'_>,
    rng: &mut RandomSource,
    profile: &NoiseProfile,
) -> Result<(), AgentError> {
    let dims = ctx.field.dims();
    let headings = match profile.random_headings {
        Some(count) => rng.uniform_vec(0.0, TAU, count)?,
        None => (0..8_u8).map(|k| f64::from(k) * FRAC_PI_4).collect(),
    };

    let mut best_score = f64::NEG_INFINITY;
    let mut best: Vec<f64> = Vec::new();
    for angle in headings {
        let landing = clan.migration_landing((angle.cos(), angle.sin()), dims);
        let score = clan.migration_score(landing, ctx.field, ctx.behavior);
        if score > best_score + SCORE_TIE_EPSILON {
            best_score = score;
            best.clear();
            best.push(angle);
        } else if (score - best_score).abs() <= SCORE_TIE_EPSILON {
            best.push(angle);
        }
    }
    let chosen = match best.as_slice() {
        [] => return Ok(()),
        [only] => *only,
        // Random sampling already decorrelates headings; the compass needs
        // an explicit tie break.
        [first, ..] if profile.random_headings.is_some() => *first,
        ties => *rng.choice(ties)?,
    };
    let angle = perturb_angle(chosen, profile.decision_noise, rng)?;
    let distance = clan.params.movement_speed * ctx.behavior.migration_speed_multiplier * ctx.dt;
    clan.move_along((angle.cos(), angle.sin()), distance, dims);
    clan.adjust_energy(-ctx.behavior.migration_energy_cost * ctx.dt);
    Ok(())
}

fn rest(
    clan: &mut Clan,
    ctx: &BehaviorContext<'_>,
    rng: &mut RandomSource,
    profile: &NoiseProfile,
) -> Result<(), AgentError> {
    let dims = ctx.field.dims();
    if profile.movement_noise_std > 0.0 {
        let dx = rng.normal(0.0, profile.movement_noise_std)?;
        let dy = rng.normal(0.0, profile.movement_noise_std)?;
        clan.move_by(dx * ctx.dt, dy * ctx.dt, dims);
    }
    let (extra_energy, extra_morale) = if profile.recovery_noise > 0.0 {
        let e = rng.normal(0.0, profile.recovery_noise)?;
        let m = rng.normal(0.0, profile.recovery_noise)?;
        (
            ctx.behavior.rest_energy_recovery * e,
            ctx.behavior.rest_morale_recovery * m,
        )
    } else {
        (0.0, 0.0)
    };
    clan.rest(ctx.behavior, ctx.dt, extra_energy, extra_morale);
    Ok(())
}

fn defend(
    clan: &mut Clan,
    ctx: &BehaviorContext<'_>,
    rng: &mut RandomSource,
    profile: &NoiseProfile,
) -> Result<(), AgentError> {
    let dims = ctx.field.dims();
    if let Some(centroid) = clan.defend_target(dims, ctx.behavior) {
        let step = clan.params.movement_speed * ctx.dt;
        let (dx, dy) = dims.delta(clan.position, centroid);
        let distance = dx.hypot(dy);
        let angle = perturb_angle(dy.atan2(dx), profile.decision_noise, rng)?;
        clan.move_along((angle.cos(), angle.sin()), step.min(distance), dims);
    }
    clan.adjust_morale(ctx.behavior.defend_morale_gain * ctx.dt);
    Ok(())
}

fn fight(
    clan: &mut Clan,
    ctx: &BehaviorContext<'_>,
    rng: &mut RandomSource,
    profile: &NoiseProfile,
) -> Result<(), AgentError> {
    let dims = ctx.field.dims();
    let Some((target_id, target_pos)) = clan.fight_target(ctx.roster, dims, ctx.behavior) else {
        return Ok(());
    };
    let step = clan.params.movement_speed * ctx.dt;
    head_for(clan, target_pos, step, dims, rng, profile.movement_noise_std)?;
    if dims.distance(clan.position, target_pos) <= ctx.behavior.melee_range {
        clan.declare_enemy(target_id);
    }
    Ok(())
}

/// Move up to `step` toward `goal`, with per-axis heading noise when
/// `noise_std` is positive.
fn head_for(
    clan: &mut Clan,
    goal: Position,
    step: f64,
    dims: GridDims,
    rng: &mut RandomSource,
    noise_std: f64,
) -> Result<(), AgentError> {
    if noise_std <= 0.0 {
        clan.move_toward(goal, step, dims);
        return Ok(());
    }
    let (dx, dy) = dims.delta(clan.position, goal);
    let distance = dx.hypot(dy);
    if distance <= f64::EPSILON {
        return Ok(());
    }
    let nx = dx / distance + rng.normal(0.0, noise_std)?;
    let ny = dy / distance + rng.normal(0.0, noise_std)?;
    let norm = nx.hypot(ny);
    let direction = if norm > f64::EPSILON {
        (nx / norm, ny / norm)
    } else {
        (dx / distance, dy / distance)
    };
    clan.move_along(direction, step.min(distance), dims);
    Ok(())
}

fn perturb_angle(angle: f64, noise_std: f64, rng: &mut RandomSource) -> Result<f64, AgentError> {
    if noise_std > 0.0 {
        Ok(angle + rng.normal(0.0, noise_std)?)
    } else {
        Ok(angle)
    }
}
