//! Summary statistics over field levels.

use serde::{Deserialize, Serialize};

use crate::geometry::Cell;

/// Aggregate figures over every cell of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Sum of all cells.
    pub total: f64,
    /// Mean cell level.
    pub average: f64,
    /// Highest cell level.
    pub max: f64,
    /// Lowest cell level.
    pub min: f64,
    /// Population standard deviation of cell levels.
    pub std: f64,
    /// Per-cell carrying capacity.
    pub max_capacity: f64,
}

/// Selected percentiles of the cell levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 25th percentile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 90th percentile.
    pub p90: f64,
    /// 95th percentile.
    pub p95: f64,
}

/// A cell at or above a requested percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// The cell.
    pub cell: Cell,
    /// Its current level.
    pub level: f64,
}

/// Percentile `q` (0 to 100) of an ascending slice, linearly interpolated
/// between the two nearest ranks. Returns 0 for an empty slice.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    let rank = (q.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let a = sorted.get(lo).copied().unwrap_or(0.0);
    let b = sorted.get(hi).copied().unwrap_or(a);
    let frac = rank - rank.floor();
    (b - a).mul_add(frac, a)
}

/// Mean and population standard deviation.
#[allow(clippy::cast_precision_loss)]
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates() {
        let v = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert!((percentile_sorted(&v, 50.0) - 20.0).abs() < 1e-12);
        assert!((percentile_sorted(&v, 25.0) - 10.0).abs() < 1e-12);
        assert!((percentile_sorted(&v, 90.0) - 36.0).abs() < 1e-12);
        assert!(percentile_sorted(&[], 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn std_of_constant_is_zero() {
        let (mean, std) = mean_and_std(&[4.0, 4.0, 4.0]);
        assert!((mean - 4.0).abs() < 1e-12);
        assert!(std.abs() < 1e-12);
    }
}
