//! Rolling per-tick metrics.

use std::collections::VecDeque;

use clanfield_types::SystemMetrics;
use serde::Serialize;

/// System-wide numbers recorded at the end of one step.
///
/// The sample is taken before the clock advances: `tick` is the 1-based
/// number of the step that produced it and `time` is the simulation time
/// at which that step began.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSample {
    /// Number of the step that produced the sample.
    pub tick: u64,
    /// Simulation time when that step began.
    pub time: f64,
    /// Aggregate numbers.
    pub metrics: SystemMetrics,
}

/// Bounded history of [`MetricsSample`]s; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct MetricsHistory {
    limit: usize,
    samples: VecDeque<MetricsSample>,
}

impl MetricsHistory {
    /// An empty history holding at most `limit` samples (minimum 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            samples: VecDeque::with_capacity(limit.min(1024)),
        }
    }

    /// Append a sample, evicting the oldest if full.
    pub fn record(&mut self, sample: MetricsSample) {
        if self.samples.len() >= self.limit {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&MetricsSample> {
        self.samples.back()
    }

    /// Samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MetricsSample> + '_ {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn sample(tick: u64, population: u64) -> MetricsSample {
        MetricsSample {
            tick,
            time: tick as f64 * 0.1,
            metrics: SystemMetrics {
                total_population: population,
                ..SystemMetrics::default()
            },
        }
    }

    #[test]
    fn history_is_bounded() {
        let mut history = MetricsHistory::new(3);
        for tick in 1..=5 {
            history.record(sample(tick, tick * 10));
        }
        assert_eq!(history.len(), 3);
        let populations: Vec<u64> = history.iter().map(|s| s.metrics.total_population).collect();
        assert_eq!(populations, vec![30, 40, 50]);
        assert_eq!(history.latest().map(|s| s.tick), Some(5));
    }
}
