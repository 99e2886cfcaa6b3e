//! Error types for the `clanfield-core` crate.
//!
//! Per-clan failures inside a tick are not errors at this level: the engine
//! skips the clan, records a [`ClanFailure`](crate::engine::ClanFailure), and
//! carries on. [`EngineError`] covers what stops an operation outright.

use clanfield_agents::AgentError;
use clanfield_world::WorldError;

use crate::config::ConfigError;

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration could not be loaded or failed validation.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A field or random-source operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An operation was called before `initialize`.
    #[error("simulation engine is not initialized")]
    NotInitialized,

    /// The pairwise interaction pass failed.
    #[error("interaction pass failed: {source}")]
    Interaction {
        /// The underlying agent error.
        source: AgentError,
    },
}
