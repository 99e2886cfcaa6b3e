//! The toroidal resource field.
//!
//! A grid of non-negative resource levels with a common carrying capacity.
//! Levels grow logistically once per tick and shrink when clans eat. Every
//! mutating operation clamps its result to `[0, capacity]`, so that bound
//! holds after any sequence of calls.

use tracing::debug;

use crate::distribution::InitialDistribution;
use crate::error::WorldError;
use crate::geometry::{Cell, GridDims, Position};
use crate::rng::RandomSource;
use crate::stats::{FieldStats, Hotspot, Percentiles, mean_and_std, percentile_sorted};

/// Growth and noise settings shared by every cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    /// Logistic carrying capacity per cell.
    pub capacity: f64,
    /// Logistic growth rate per unit time.
    pub regen_rate: f64,
    /// Standard deviation of the per-cell regeneration noise.
    pub noise_std: f64,
}

impl FieldParams {
    /// Reject non-positive capacity and negative rates.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(WorldError::invalid_parameter(format!(
                "capacity must be positive, got {}",
                self.capacity
            )));
        }
        if !self.regen_rate.is_finite() || self.regen_rate < 0.0 {
            return Err(WorldError::invalid_parameter(format!(
                "regen_rate must be non-negative, got {}",
                self.regen_rate
            )));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(WorldError::invalid_parameter(format!(
                "noise_std must be non-negative, got {}",
                self.noise_std
            )));
        }
        Ok(())
    }
}

/// A 2-D toroidal grid of resource levels, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceField {
    dims: GridDims,
    params: FieldParams,
    cells: Vec<f64>,
}

impl ResourceField {
    /// An empty field (every cell at 0).
    pub fn new(dims: GridDims, params: FieldParams) -> Result<Self, WorldError> {
        params.validate()?;
        Ok(Self {
            dims,
            params,
            cells: vec![0.0; dims.cell_count()],
        })
    }

    /// A field filled from an initial distribution.
    pub fn generate(
        dims: GridDims,
        params: FieldParams,
        distribution: &InitialDistribution,
        rng: &mut RandomSource,
    ) -> Result<Self, WorldError> {
        let mut field = Self::new(dims, params)?;
        field.reset(distribution, rng)?;
        Ok(field)
    }

    /// Grid dimensions.
    pub const fn dims(&self) -> GridDims {
        self.dims
    }

    /// Per-cell carrying capacity.
    pub const fn capacity(&self) -> f64 {
        self.params.capacity
    }

    /// Growth and noise settings.
    pub const fn params(&self) -> FieldParams {
        self.params
    }

    /// Map any position onto the grid.
    pub fn toroidal_wrap(&self, position: Position) -> Position {
        self.dims.wrap(position)
    }

    /// Whether `position` is finite and already inside the grid bounds.
    #[allow(clippy::cast_precision_loss)]
    pub fn is_valid_position(&self, position: Position) -> bool {
        position.is_finite()
            && position.x >= 0.0
            && position.y >= 0.0
            && position.x < self.dims.width() as f64
            && position.y < self.dims.height() as f64
    }

    /// Level of the cell containing `position` (after wrapping).
    pub fn get(&self, position: Position) -> f64 {
        self.get_cell(self.dims.cell_of(position))
    }

    /// Level of a cell. Out-of-range cells read as 0.
    pub fn get_cell(&self, cell: Cell) -> f64 {
        self.cells.get(self.dims.index(cell)).copied().unwrap_or(0.0)
    }

    /// Overwrite a cell, clamping to `[0, capacity]`.
    pub fn set_cell(&mut self, cell: Cell, level: f64) {
        let capacity = self.params.capacity;
        let idx = self.dims.index(cell);
        if let Some(slot) = self.cells.get_mut(idx) {
            *slot = clamp_level(level, capacity);
        }
    }

    /// Remove up to `amount` from the cell containing `position`.
    ///
    /// Returns what was actually removed, which never exceeds the level the
    /// cell held before the call.
    pub fn consume(&mut self, position: Position, amount: f64) -> Result<f64, WorldError> {
        if amount.is_nan() || amount < 0.0 {
            return Err(WorldError::invalid_argument(format!(
                "consumption amount must be non-negative, got {amount}"
            )));
        }
        let idx = self.dims.index(self.dims.cell_of(position));
        let Some(slot) = self.cells.get_mut(idx) else {
            return Ok(0.0);
        };
        let taken = slot.min(amount).max(0.0);
        *slot = (*slot - taken).max(0.0);
        Ok(taken)
    }

    /// Apply one tick of logistic growth and noise.
    ///
    /// Returns the net change in total resources. Must run at most once per
    /// tick, before any consumption.
    pub fn regenerate(&mut self, dt: f64, rng: &mut RandomSource) -> Result<f64, WorldError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(WorldError::invalid_argument(format!(
                "regeneration step must be non-negative, got {dt}"
            )));
        }
        let FieldParams {
            capacity,
            regen_rate,
            noise_std,
        } = self.params;
        let before = self.total();

        for slot in &mut self.cells {
            let current = *slot;
            let grown = regen_rate * current * (1.0 - current / capacity);
            let mut next = clamp_level(grown.mul_add(dt, current), capacity);
            if noise_std > 0.0 {
                let noise = rng.normal(0.0, noise_std)?;
                next = clamp_level(noise.mul_add(dt, next), capacity);
            }
            *slot = next;
        }

        let delta = self.total() - before;
        debug!(delta, "field regenerated");
        Ok(delta)
    }

    /// Mean level over the disc of `radius` around `position`.
    #[allow(clippy::cast_precision_loss)]
    pub fn local_density(&self, position: Position, radius: f64) -> f64 {
        let cells = self.dims.disc_cells(position, radius);
        if cells.is_empty() {
            return 0.0;
        }
        let sum: f64 = cells.iter().map(|&c| self.get_cell(c)).sum();
        sum / cells.len() as f64
    }

    /// Sum of every cell.
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    /// Mean cell level.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.total() / self.cells.len() as f64
    }

    /// Aggregate statistics over the field.
    pub fn grid_info(&self) -> FieldStats {
        let (average, std) = mean_and_std(&self.cells);
        let max = self.cells.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.cells.iter().copied().fold(f64::INFINITY, f64::min);
        FieldStats {
            total: self.total(),
            average,
            max: if max.is_finite() { max } else { 0.0 },
            min: if min.is_finite() { min } else { 0.0 },
            std,
            max_capacity: self.params.capacity,
        }
    }

    fn sorted_levels(&self) -> Vec<f64> {
        let mut sorted = self.cells.clone();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    /// The 25th, 50th, 75th, 90th and 95th percentiles of cell levels.
    pub fn percentiles(&self) -> Percentiles {
        let sorted = self.sorted_levels();
        Percentiles {
            p25: percentile_sorted(&sorted, 25.0),
            p50: percentile_sorted(&sorted, 50.0),
            p75: percentile_sorted(&sorted, 75.0),
            p90: percentile_sorted(&sorted, 90.0),
            p95: percentile_sorted(&sorted, 95.0),
        }
    }

    /// Cells at or above the given percentile, richest first.
    pub fn hotspots(&self, percentile: f64) -> Result<Vec<Hotspot>, WorldError> {
        if !percentile.is_finite() || !(0.0..=100.0).contains(&percentile) {
            return Err(WorldError::invalid_argument(format!(
                "percentile must be in [0, 100], got {percentile}"
            )));
        }
        let threshold = percentile_sorted(&self.sorted_levels(), percentile);
        let mut spots: Vec<Hotspot> = self
            .cells
            .iter()
            .enumerate()
            .filter(|&(_, &level)| level >= threshold)
            .map(|(i, &level)| Hotspot {
                cell: self.dims.cell_at(i),
                level,
            })
            .collect();
        spots.sort_by(|a, b| b.level.total_cmp(&a.level).then(a.cell.cmp(&b.cell)));
        Ok(spots)
    }

    /// Central-difference gradient `(d/dx, d/dy)` at the cell containing
    /// `position`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn gradient(&self, position: Position) -> (f64, f64) {
        let c = self.dims.cell_of(position);
        let x = c.x as i64;
        let y = c.y as i64;
        let at = |dx: i64, dy: i64| {
            self.get_cell(self.dims.wrap_cell(x.saturating_add(dx), y.saturating_add(dy)))
        };
        ((at(1, 0) - at(-1, 0)) / 2.0, (at(0, 1) - at(0, -1)) / 2.0)
    }

    /// Add a Gaussian-shaped bump of peak `amount` around `center`.
    pub fn add_patch(&mut self, center: Position, radius: f64, amount: f64) -> Result<(), WorldError> {
        if !radius.is_finite() || radius <= 0.0 || !amount.is_finite() || amount < 0.0 {
            return Err(WorldError::invalid_argument(format!(
                "patch needs a positive radius and non-negative amount, got {radius} and {amount}"
            )));
        }
        let sigma = radius / 2.0;
        let origin = self.dims.cell_of(center).center();
        for cell in self.dims.disc_cells(center, radius) {
            let d = self.dims.distance(origin, cell.center());
            let weight = (-(d * d) / (2.0 * sigma * sigma)).exp();
            let level = amount.mul_add(weight, self.get_cell(cell));
            self.set_cell(cell, level);
        }
        Ok(())
    }

    /// Remove a share of the resources around `center`, heaviest at the
    /// centre and fading linearly towards the edge of the disc.
    pub fn deplete_area(&mut self, center: Position, radius: f64, factor: f64) -> Result<(), WorldError> {
        if !radius.is_finite() || radius < 0.0 || !factor.is_finite() || !(0.0..=1.0).contains(&factor) {
            return Err(WorldError::invalid_argument(format!(
                "depletion needs a non-negative radius and a factor in [0, 1], got {radius} and {factor}"
            )));
        }
        let origin = self.dims.cell_of(center).center();
        for cell in self.dims.disc_cells(center, radius) {
            let d = self.dims.distance(origin, cell.center());
            let weight = 1.0 - d / (radius + 1.0);
            let level = self.get_cell(cell) * factor.mul_add(-weight, 1.0);
            self.set_cell(cell, level);
        }
        Ok(())
    }

    /// Refill the whole field from a distribution.
    #[allow(clippy::cast_precision_loss)]
    pub fn reset(
        &mut self,
        distribution: &InitialDistribution,
        rng: &mut RandomSource,
    ) -> Result<(), WorldError> {
        distribution.validate()?;
        let capacity = self.params.capacity;
        match *distribution {
            InitialDistribution::Uniform { fraction } => {
                self.cells.fill(clamp_level(fraction * capacity, capacity));
            }
            InitialDistribution::RandomUniform {
                min_fraction,
                max_fraction,
            } => {
                for slot in &mut self.cells {
                    let v = rng.uniform(min_fraction * capacity, max_fraction * capacity)?;
                    *slot = clamp_level(v, capacity);
                }
            }
            InitialDistribution::Gaussian {
                mean_fraction,
                std_fraction,
            } => {
                for slot in &mut self.cells {
                    let v = rng.normal(mean_fraction * capacity, std_fraction * capacity)?;
                    *slot = clamp_level(v, capacity);
                }
            }
            InitialDistribution::Patches {
                count,
                radius,
                intensity_fraction,
                background_fraction,
            } => {
                self.cells.fill(clamp_level(background_fraction * capacity, capacity));
                let w = self.dims.width() as f64;
                let h = self.dims.height() as f64;
                for _ in 0..count {
                    let center = Position::new(rng.uniform(0.0, w)?, rng.uniform(0.0, h)?);
                    self.add_patch(center, radius, intensity_fraction * capacity)?;
                }
            }
        }
        debug!(total = self.total(), "field reset");
        Ok(())
    }

    /// Levels as nested vectors indexed `[x][y]`.
    pub fn to_grid(&self) -> Vec<Vec<f64>> {
        (0..self.dims.width())
            .map(|x| {
                (0..self.dims.height())
                    .map(|y| self.get_cell(Cell::new(x, y)))
                    .collect()
            })
            .collect()
    }

    /// Raw row-major levels.
    pub fn levels(&self) -> &[f64] {
        &self.cells
    }
}

fn clamp_level(v: f64, capacity: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, capacity) }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn params(capacity: f64) -> FieldParams {
        FieldParams {
            capacity,
            regen_rate: 1.5,
            noise_std: 0.05,
        }
    }

    fn full_field(w: usize, h: usize, capacity: f64) -> ResourceField {
        let mut rng = RandomSource::seeded(1);
        ResourceField::generate(
            GridDims::new(w, h).unwrap(),
            params(capacity),
            &InitialDistribution::Uniform { fraction: 1.0 },
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn invalid_params_are_rejected() {
        let dims = GridDims::new(4, 4).unwrap();
        assert!(ResourceField::new(dims, params(0.0)).is_err());
        let mut p = params(10.0);
        p.regen_rate = -1.0;
        assert!(ResourceField::new(dims, p).is_err());
    }

    #[test]
    fn consume_never_exceeds_stored_amount() {
        let mut field = full_field(5, 5, 10.0);
        let pos = Position::new(2.2, 3.7);
        let taken = field.consume(pos, 4.0).unwrap();
        assert!((taken - 4.0).abs() < 1e-12);
        let rest = field.consume(pos, 100.0).unwrap();
        assert!((rest - 6.0).abs() < 1e-12);
        assert!(field.get(pos).abs() < f64::EPSILON);
        assert!(field.consume(pos, 1.0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn negative_consumption_is_invalid() {
        let mut field = full_field(3, 3, 10.0);
        assert!(matches!(
            field.consume(Position::new(0.0, 0.0), -1.0),
            Err(WorldError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn get_wraps_positions() {
        let mut field = full_field(4, 4, 10.0);
        field.set_cell(Cell::new(3, 0), 2.5);
        assert!((field.get(Position::new(-0.5, 4.2)) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn regeneration_respects_bounds() {
        let mut rng = RandomSource::seeded(42);
        let dims = GridDims::new(20, 20).unwrap();
        let mut field = ResourceField::generate(
            dims,
            FieldParams {
                capacity: 10.0,
                regen_rate: 1.5,
                noise_std: 5.0,
            },
            &InitialDistribution::default(),
            &mut rng,
        )
        .unwrap();
        for _ in 0..50 {
            field.regenerate(0.5, &mut rng).unwrap();
            assert!(field.levels().iter().all(|&v| (0.0..=10.0).contains(&v)));
        }
    }

    #[test]
    fn logistic_growth_without_noise() {
        let mut rng = RandomSource::seeded(1);
        let dims = GridDims::new(1, 1).unwrap();
        let mut field = ResourceField::new(
            dims,
            FieldParams {
                capacity: 10.0,
                regen_rate: 1.0,
                noise_std: 0.0,
            },
        )
        .unwrap();
        field.set_cell(Cell::new(0, 0), 5.0);
        let delta = field.regenerate(1.0, &mut rng).unwrap();
        // 5 + 1 * 5 * (1 - 0.5) * 1 = 7.5
        assert!((field.get_cell(Cell::new(0, 0)) - 7.5).abs() < 1e-12);
        assert!((delta - 2.5).abs() < 1e-12);
    }

    #[test]
    fn local_density_is_disc_mean() {
        let mut field = full_field(10, 10, 10.0);
        field.set_cell(Cell::new(5, 5), 0.0);
        // Radius 1 covers the centre and four neighbours.
        let d = field.local_density(Position::new(5.5, 5.5), 1.0);
        assert!((d - 8.0).abs() < 1e-12);
    }

    #[test]
    fn stats_and_percentiles() {
        let mut field = full_field(2, 2, 10.0);
        field.set_cell(Cell::new(0, 0), 0.0);
        field.set_cell(Cell::new(1, 0), 2.0);
        field.set_cell(Cell::new(0, 1), 4.0);
        field.set_cell(Cell::new(1, 1), 6.0);
        let info = field.grid_info();
        assert!((info.total - 12.0).abs() < 1e-12);
        assert!((info.average - 3.0).abs() < 1e-12);
        assert!((info.max - 6.0).abs() < 1e-12);
        assert!(info.min.abs() < 1e-12);
        let p = field.percentiles();
        assert!((p.p50 - 3.0).abs() < 1e-12);
        let spots = field.hotspots(75.0).unwrap();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots.first().unwrap().cell, Cell::new(1, 1));
        assert!(field.hotspots(101.0).is_err());
    }

    #[test]
    fn gradient_points_uphill() {
        let mut field = full_field(5, 5, 10.0);
        for x in 0..5 {
            for y in 0..5 {
                #[allow(clippy::cast_precision_loss)]
                field.set_cell(Cell::new(x, y), x as f64);
            }
        }
        let (gx, gy) = field.gradient(Position::new(2.0, 2.0));
        assert!((gx - 1.0).abs() < 1e-12);
        assert!(gy.abs() < 1e-12);
    }

    #[test]
    fn patches_and_depletion_stay_in_bounds() {
        let mut field = full_field(12, 12, 10.0);
        field.deplete_area(Position::new(6.0, 6.0), 3.0, 1.0).unwrap();
        assert!(field.get(Position::new(6.0, 6.0)).abs() < 1e-12);
        assert!(field.get(Position::new(8.0, 6.0)) > 0.0);
        field.add_patch(Position::new(6.0, 6.0), 3.0, 50.0).unwrap();
        assert!((field.get(Position::new(6.0, 6.0)) - 10.0).abs() < 1e-12);
        assert!(field.levels().iter().all(|&v| (0.0..=10.0).contains(&v)));
        assert!(field.deplete_area(Position::new(0.0, 0.0), 1.0, 2.0).is_err());
    }

    #[test]
    fn grid_is_indexed_x_then_y() {
        let mut field = full_field(3, 2, 10.0);
        field.set_cell(Cell::new(2, 1), 1.0);
        let grid = field.to_grid();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.first().unwrap().len(), 2);
        let level = grid.get(2).and_then(|col| col.get(1)).copied().unwrap();
        assert!((level - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validity_check_requires_in_bounds() {
        let field = full_field(4, 4, 1.0);
        assert!(field.is_valid_position(Position::new(3.9, 0.0)));
        assert!(!field.is_valid_position(Position::new(4.0, 0.0)));
        assert!(!field.is_valid_position(Position::new(f64::NAN, 0.0)));
    }
}
