//! Seeded random source shared by every stochastic decision in a run.
//!
//! A single [`RandomSource`] is created by the engine and lent by `&mut` to
//! the field, the clans, and the execution mode. There is no global or
//! thread-local randomness anywhere in the kernel, so two runs built from
//! the same seed consume the same stream in the same order and produce the
//! same result.
//!
//! The generator is `ChaCha8Rng`: its output stream is fixed by the seed and
//! does not depend on platform word size or crate-internal tuning, which
//! keeps recorded seeds meaningful across builds.

use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::error::WorldError;

/// Seeded pseudo-random generator with range-checked sampling helpers.
///
/// Every call advances the internal state; there is no way to peek.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: ChaCha8Rng,
    seed: u64,
}

impl RandomSource {
    /// Create a source from an explicit seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a source from a seed drawn from the thread entropy pool.
    ///
    /// The drawn seed is kept and reported by [`RandomSource::seed`] so the
    /// run can be reproduced later.
    pub fn from_entropy() -> Self {
        let seed: u64 = rand::rng().random();
        Self::seeded(seed)
    }

    /// Use the given seed, or draw one from entropy when absent.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// The seed this source was created from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in `[0, 1)`.
    pub fn uniform_float(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Bernoulli trial: `true` with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f64) -> bool {
        self.uniform_float() < p
    }

    /// Uniform float in `[low, high)`; returns `low` when the bounds coincide.
    pub fn uniform(&mut self, low: f64, high: f64) -> Result<f64, WorldError> {
        check_range(low, high)?;
        let span = high - low;
        if span > 0.0 {
            Ok(self.uniform_float().mul_add(span, low))
        } else {
            Ok(low)
        }
    }

    /// `count` independent uniform samples in `[low, high)`.
    pub fn uniform_vec(&mut self, low: f64, high: f64, count: usize) -> Result<Vec<f64>, WorldError> {
        check_range(low, high)?;
        (0..count).map(|_| self.uniform(low, high)).collect()
    }

    /// Normal sample with the given mean and standard deviation.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> Result<f64, WorldError> {
        check_normal(mean, std_dev)?;
        let z: f64 = self.rng.sample(StandardNormal);
        Ok(z.mul_add(std_dev, mean))
    }

    /// `count` independent normal samples.
    pub fn normal_vec(&mut self, mean: f64, std_dev: f64, count: usize) -> Result<Vec<f64>, WorldError> {
        check_normal(mean, std_dev)?;
        (0..count).map(|_| self.normal(mean, std_dev)).collect()
    }

    /// Uniform integer in `[low, high]` (both ends inclusive).
    pub fn int_range(&mut self, low: i64, high: i64) -> Result<i64, WorldError> {
        if low > high {
            return Err(WorldError::invalid_argument(format!(
                "integer range is inverted: low {low} > high {high}"
            )));
        }
        Ok(self.rng.random_range(low..=high))
    }

    /// Pick one element uniformly.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, WorldError> {
        items
            .choose(&mut self.rng)
            .ok_or_else(|| WorldError::invalid_argument("cannot choose from an empty sequence"))
    }

    /// Pick `k` elements, with or without replacement.
    ///
    /// Without replacement `k` may not exceed `items.len()`; the picks come
    /// back in random order.
    pub fn choose_many<T: Clone>(
        &mut self,
        items: &[T],
        k: usize,
        with_replacement: bool,
    ) -> Result<Vec<T>, WorldError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if with_replacement {
            return (0..k).map(|_| self.choice(items).cloned()).collect();
        }
        if k > items.len() {
            return Err(WorldError::invalid_argument(format!(
                "cannot choose {k} distinct items from {}",
                items.len()
            )));
        }
        Ok(items.choose_multiple(&mut self.rng, k).cloned().collect())
    }

    /// Index drawn with probability proportional to `weights[i]`.
    ///
    /// Weights must be finite and non-negative with a positive sum.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Result<usize, WorldError> {
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(WorldError::invalid_argument(format!("invalid weight {w}")));
        }
        let dist = WeightedIndex::new(weights)
            .map_err(|e| WorldError::invalid_argument(format!("invalid weights: {e}")))?;
        Ok(self.rng.sample(&dist))
    }
}

fn check_range(low: f64, high: f64) -> Result<(), WorldError> {
    if !low.is_finite() || !high.is_finite() || low > high || !(high - low).is_finite() {
        return Err(WorldError::invalid_argument(format!(
            "uniform range is invalid: low {low}, high {high}"
        )));
    }
    Ok(())
}

fn check_normal(mean: f64, std_dev: f64) -> Result<(), WorldError> {
    if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
        return Err(WorldError::invalid_argument(format!(
            "normal parameters are invalid: mean {mean}, std {std_dev}"
        )));
    }
    Ok(())
}
