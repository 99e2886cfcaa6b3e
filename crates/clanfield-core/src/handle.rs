//! The engine handle exposed to drivers.
//!
//! A handle starts out empty. Every query or step before [`initialize`]
//! (or [`EngineHandle::initialize`]) fails with
//! [`EngineError::NotInitialized`] instead of panicking.

use clanfield_types::{SimulationSnapshot, SimulationSummary, TerminationReason};

use crate::config::{ClanConfig, FieldConfig, ModeConfig, SimulationConfig};
use crate::engine::{SimulationEngine, TickSummary};
use crate::error::EngineError;

/// Owner of an optional [`SimulationEngine`].
#[derive(Debug, Default)]
pub struct EngineHandle {
    engine: Option<SimulationEngine>,
}

impl EngineHandle {
    /// An uninitialized handle.
    pub const fn new() -> Self {
        Self { engine: None }
    }

    /// Build (or rebuild) the engine from `config`.
    pub fn initialize(&mut self, config: SimulationConfig) -> Result<(), EngineError> {
        self.engine = Some(SimulationEngine::new(config)?);
        Ok(())
    }

    /// Whether an engine has been built.
    pub const fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Advance one tick.
    pub fn step(&mut self) -> Result<Option<TerminationReason>, EngineError> {
        self.engine_mut()?.step()
    }

    /// Full observable state.
    pub fn state(&self) -> Result<SimulationSnapshot, EngineError> {
        Ok(self.engine()?.state())
    }

    /// End-of-run figures as of now.
    pub fn summary(&self) -> Result<SimulationSummary, EngineError> {
        Ok(self.engine()?.summary())
    }

    /// Summary of the most recent tick, if any tick has run.
    pub fn last_tick(&self) -> Result<Option<&TickSummary>, EngineError> {
        Ok(self.engine()?.last_summary())
    }

    /// Restore the initial conditions with the same seed.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.engine_mut()?.reset()
    }

    /// The engine, if initialized.
    pub fn engine(&self) -> Result<&SimulationEngine, EngineError> {
        self.engine.as_ref().ok_or(EngineError::NotInitialized)
    }

    /// The engine, mutably, if initialized.
    pub fn engine_mut(&mut self) -> Result<&mut SimulationEngine, EngineError> {
        self.engine.as_mut().ok_or(EngineError::NotInitialized)
    }
}

/// Build an initialized handle from the field, roster, and mode sections,
/// with defaults for everything else.
pub fn initialize(
    field: FieldConfig,
    clans: ClanConfig,
    mode: ModeConfig,
    seed: Option<u64>,
) -> Result<EngineHandle, EngineError> {
    let mut handle = EngineHandle::new();
    handle.initialize(SimulationConfig {
        seed,
        field,
        clans,
        mode,
        ..SimulationConfig::default()
    })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn uninitialized_handle_reports_not_initialized() {
        let mut handle = EngineHandle::default();
        assert!(!handle.is_initialized());
        assert!(matches!(handle.step(), Err(EngineError::NotInitialized)));
        assert!(matches!(handle.state(), Err(EngineError::NotInitialized)));
        assert!(matches!(handle.summary(), Err(EngineError::NotInitialized)));
        assert!(matches!(handle.reset(), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn free_initialize_builds_a_ready_handle() {
        let mut handle = initialize(
            FieldConfig {
                width: 12,
                height: 12,
                ..FieldConfig::default()
            },
            ClanConfig {
                initial_count: 3,
                ..ClanConfig::default()
            },
            ModeConfig::default(),
            Some(17),
        )
        .unwrap();
        assert!(handle.is_initialized());
        handle.step().unwrap();
        assert_eq!(handle.state().unwrap().tick, 1);
        assert_eq!(handle.summary().unwrap().seed, 17);
    }

    #[test]
    fn invalid_config_leaves_handle_empty() {
        let mut handle = EngineHandle::new();
        let config = SimulationConfig {
            dt: -1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            handle.initialize(config),
            Err(EngineError::Config { .. })
        ));
        assert!(!handle.is_initialized());
    }
}
