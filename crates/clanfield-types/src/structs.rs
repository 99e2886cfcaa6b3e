//! Snapshot and summary structs for the Clanfield simulation.
//!
//! These are the payloads the engine hands to external collaborators: the
//! per-tick state query result and the end-of-run summary. They carry no
//! behavior; the engine builds them and callers serialize them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::{BehaviorState, ClanStrategy, ModeKind};
use crate::ids::ClanId;

// ---------------------------------------------------------------------------
// State query payload
// ---------------------------------------------------------------------------

/// Observable state of a single clan at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClanSnapshot {
    /// Stable clan identifier.
    pub id: ClanId,
    /// Population count.
    pub size: u64,
    /// Position on the torus as `[x, y]`.
    pub position: [f64; 2],
    /// Energy in `[0, 100]`.
    pub energy: f64,
    /// Morale in `[0, 100]`.
    pub morale: f64,
    /// Behavior chosen during the last behavior phase.
    pub state: BehaviorState,
    /// Fixed social strategy.
    pub strategy: ClanStrategy,
    /// Number of claimed territory cells.
    pub territory_size: usize,
    /// Suggested marker radius for renderers, `clamp(sqrt(size) * 1.5, 3, 12)`.
    pub visual_size_hint: f64,
    /// Current allies, ascending by id.
    pub allies: BTreeSet<ClanId>,
    /// Current enemies, ascending by id.
    pub enemies: BTreeSet<ClanId>,
}

/// Aggregate figures over the whole system at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Sum of all clan sizes.
    pub total_population: u64,
    /// Number of clans in the active roster.
    pub active_clan_count: usize,
    /// Mean clan energy, 0 when no clans remain.
    pub avg_energy: f64,
    /// Sum of every field cell.
    pub total_resources: f64,
}

/// Full simulation state returned by the engine's state query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Elapsed simulation time (ticks times `dt`).
    pub time: f64,
    /// Number of completed ticks.
    pub tick: u64,
    /// Execution mode driving clan behavior.
    pub mode: ModeKind,
    /// Active clans in roster order.
    pub clans: Vec<ClanSnapshot>,
    /// Resource levels indexed `[x][y]`.
    pub resource_grid: Vec<Vec<f64>>,
    /// Aggregates over clans and field.
    pub system_metrics: SystemMetrics,
}

// ---------------------------------------------------------------------------
// End-of-run summary
// ---------------------------------------------------------------------------

/// Final figures for one clan still alive when a summary is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivorSummary {
    /// Clan identifier.
    pub id: ClanId,
    /// Final population.
    pub size: u64,
    /// Final energy.
    pub energy: f64,
    /// Last behavior state.
    pub state: BehaviorState,
    /// Fixed social strategy.
    pub strategy: ClanStrategy,
}

/// Summary of a run so far, produced on demand by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Completed ticks.
    pub total_steps: u64,
    /// Elapsed simulation time.
    pub final_time: f64,
    /// Sum of surviving clan sizes.
    pub final_population: u64,
    /// Number of clans at initialization.
    pub initial_clan_count: usize,
    /// Clans still in the roster.
    pub survivors: Vec<SurvivorSummary>,
    /// Seed the run was started from.
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn sample_clan() -> ClanSnapshot {
        ClanSnapshot {
            id: ClanId::new(1),
            size: 12,
            position: [2.5, 7.25],
            energy: 80.0,
            morale: 95.5,
            state: BehaviorState::Foraging,
            strategy: ClanStrategy::Cooperative,
            territory_size: 3,
            visual_size_hint: 5.196,
            allies: BTreeSet::from([ClanId::new(4)]),
            enemies: BTreeSet::new(),
        }
    }

    #[test]
    fn snapshot_field_names_are_snake_case() {
        let snapshot = SimulationSnapshot {
            time: 0.1,
            tick: 1,
            mode: ModeKind::Stochastic,
            clans: vec![sample_clan()],
            resource_grid: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            system_metrics: SystemMetrics {
                total_population: 12,
                active_clan_count: 1,
                avg_energy: 80.0,
                total_resources: 10.0,
            },
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("resource_grid").is_some());
        assert_eq!(value["system_metrics"]["active_clan_count"], 1);
        assert_eq!(value["clans"][0]["state"], "foraging");
        assert_eq!(value["clans"][0]["allies"][0], 4);
    }

    #[test]
    fn clan_snapshot_survives_json() {
        let clan = sample_clan();
        let json = serde_json::to_string(&clan).unwrap();
        let back: ClanSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clan);
    }
}
