//! Real-time run loop around the engine handle.
//!
//! [`run_simulation`] steps the shared [`EngineHandle`] once per tick
//! interval until one of these happens:
//!
//! - the engine reports a termination condition,
//! - the driver's `max_ticks` bound is reached,
//! - the shutdown future resolves (Ctrl-C in the binary).
//!
//! The handle lives behind a [`tokio::sync::Mutex`] so other tasks can take
//! snapshots between ticks; the lock is held only while a tick runs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clanfield_core::config::DriverConfig;
use clanfield_core::{EngineError, EngineHandle, TickSummary};
use clanfield_types::TerminationReason;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Errors that can occur during the run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick or engine query failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },
}

/// Why the run loop returned.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEndReason {
    /// The engine's stopping rules fired.
    Terminated(TerminationReason),
    /// The driver's tick bound was reached.
    MaxTicksReached {
        /// The bound.
        limit: u64,
    },
    /// Shutdown was requested.
    Interrupted,
}

/// Result of a run.
#[derive(Debug)]
pub struct RunResult {
    /// Why the loop ended.
    pub end_reason: RunEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed by this loop.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called with the summary of the tick that just ran.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// Logs a progress line every `every` ticks and a warning per skipped clan.
#[derive(Debug, Clone)]
pub struct LogCallback {
    every: u64,
}

impl LogCallback {
    /// Log every `every` ticks (minimum 1).
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl TickCallback for LogCallback {
    fn on_tick(&mut self, summary: &TickSummary) {
        if summary.tick.checked_rem(self.every) == Some(0) {
            info!(
                tick = summary.tick,
                time = summary.time,
                population = summary.metrics.total_population,
                clans = summary.metrics.active_clan_count,
                avg_energy = summary.metrics.avg_energy,
                resources = summary.metrics.total_resources,
                "Progress"
            );
        }
        for failure in &summary.failures {
            warn!(tick = summary.tick, clan_id = %failure.clan_id, error = %failure.message, "Clan skipped");
        }
    }
}

/// Step the simulation until it terminates, hits the tick bound, or
/// `shutdown` resolves.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails or the handle is uninitialized.
pub async fn run_simulation(
    handle: Arc<Mutex<EngineHandle>>,
    settings: &DriverConfig,
    callback: &mut dyn TickCallback,
    shutdown: impl Future<Output = ()>,
) -> Result<RunResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;
    let interval = Duration::from_millis(settings.tick_interval_ms);
    tokio::pin!(shutdown);

    info!(
        tick_interval_ms = settings.tick_interval_ms,
        max_ticks = ?settings.max_ticks,
        "Simulation starting"
    );

    loop {
        let (outcome, summary) = {
            let mut engine = handle.lock().await;
            let outcome = engine.step()?;
            (outcome, engine.last_tick()?.cloned())
        };
        total_ticks = total_ticks.saturating_add(1);

        if let Some(summary) = &summary {
            callback.on_tick(summary);
        }

        if let Some(reason) = outcome {
            return Ok(RunResult {
                end_reason: RunEndReason::Terminated(reason),
                final_summary: summary,
                total_ticks,
            });
        }

        if let Some(limit) = settings.max_ticks {
            if total_ticks >= limit {
                info!(limit, "Tick limit reached");
                return Ok(RunResult {
                    end_reason: RunEndReason::MaxTicksReached { limit },
                    final_summary: summary,
                    total_ticks,
                });
            }
        }

        last_summary = summary;

        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(total_ticks, "Shutdown requested");
                return Ok(RunResult {
                    end_reason: RunEndReason::Interrupted,
                    final_summary: last_summary,
                    total_ticks,
                });
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}

/// Log how the run ended.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_population = result.final_summary.as_ref().map(|s| s.metrics.total_population),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            clans = summary.metrics.active_clan_count,
            avg_energy = summary.metrics.avg_energy,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}
