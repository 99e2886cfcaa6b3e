//! End-to-end scenarios with hand-checked outcomes.

#![allow(clippy::unwrap_used)]

use clanfield_core::{EngineError, EngineHandle, SimulationConfig, SimulationEngine};
use clanfield_types::ClanId;

const TWO_CLANS: &str = r"
seed: 42
dt: 0.1
field:
  width: 10
  height: 10
  capacity: 10.0
  regen_rate: 1.5
  noise_std: 0.0
  initial:
    kind: uniform
    fraction: 1.0
clans:
  explicit:
    - id: 1
      size: 10
      position: [5.0, 5.0]
      params: {birth_rate: 1.0, death_rate: 0.0}
    - id: 2
      size: 10
      position: [1.0, 1.0]
      params: {birth_rate: 0.0, death_rate: 1.0}
";

#[test]
fn fertile_clan_grows_and_mortal_clan_shrinks() {
    let mut engine = SimulationEngine::new(SimulationConfig::parse(TWO_CLANS).unwrap()).unwrap();
    let before = engine.field().total();

    assert_eq!(engine.step().unwrap(), None);

    assert_eq!(engine.clan(ClanId::new(1)).unwrap().size, 12);
    assert_eq!(engine.clan(ClanId::new(2)).unwrap().size, 9);

    let tick = engine.last_summary().unwrap();
    assert!(tick.consumed > 0.0);
    assert!(engine.field().total() <= before + tick.regenerated - tick.consumed + 1e-9);
    assert_eq!(tick.births, 2);
    assert_eq!(tick.deaths, 1);
}

#[test]
fn lone_individual_dies_out_and_is_removed() {
    let yaml = r"
seed: 1
dt: 1.0
field: {width: 8, height: 8}
clans:
  explicit:
    - id: 1
      size: 1
      position: [4.0, 4.0]
      params: {death_rate: 1.0}
";
    let mut engine = SimulationEngine::new(SimulationConfig::parse(yaml).unwrap()).unwrap();
    engine.step().unwrap();
    assert!(engine.clans().is_empty());
    assert_eq!(engine.last_summary().unwrap().extinct, vec![ClanId::new(1)]);
    let state = engine.state();
    assert!(state.clans.is_empty());
    assert_eq!(state.system_metrics.total_population, 0);
    assert!(state.system_metrics.avg_energy.abs() < f64::EPSILON);
}

#[test]
fn extinction_stops_the_run_after_grace_period() {
    let yaml = r"
seed: 3
dt: 1.0
field: {width: 8, height: 8}
clans:
  explicit:
    - {id: 1, size: 1, position: [2.0, 2.0], params: {death_rate: 1.0}}
termination: {extinction_grace: 2}
";
    let mut engine = SimulationEngine::new(SimulationConfig::parse(yaml).unwrap()).unwrap();
    assert_eq!(engine.step().unwrap(), None);
    assert_eq!(
        engine.step().unwrap(),
        Some(clanfield_types::TerminationReason::Extinction)
    );
}

#[test]
fn state_grid_is_indexed_by_column_then_row() {
    let yaml = "seed: 5\nfield: {width: 7, height: 4}\n";
    let engine = SimulationEngine::new(SimulationConfig::parse(yaml).unwrap()).unwrap();
    let grid = engine.state().resource_grid;
    assert_eq!(grid.len(), 7);
    assert!(grid.iter().all(|column| column.len() == 4));
}

#[test]
fn handle_requires_initialization() {
    let mut handle = EngineHandle::new();
    assert!(matches!(handle.step(), Err(EngineError::NotInitialized)));
    handle
        .initialize(SimulationConfig::parse(TWO_CLANS).unwrap())
        .unwrap();
    handle.step().unwrap();
    assert_eq!(handle.summary().unwrap().total_steps, 1);
}

#[test]
fn config_loads_from_file() {
    let path = std::env::temp_dir().join(format!("clanfield-scenario-{}.yaml", std::process::id()));
    std::fs::write(&path, TWO_CLANS).unwrap();
    let config = SimulationConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.clans.explicit.len(), 2);
}
