//! Error types for the `clanfield-agents` crate.
//!
//! Clan updates never panic. Anything that goes wrong while a single clan
//! perceives, acts, or eats surfaces as an [`AgentError`] so the engine can
//! skip that clan for the tick and carry on with the rest.

use clanfield_types::ClanId;
use clanfield_world::WorldError;

/// Errors that can occur while updating a clan.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A field or random-source call rejected its input.
    #[error("world operation failed: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A NaN or infinite value escaped an update.
    #[error("clan {clan_id} has a non-finite {field}")]
    NonFiniteState {
        /// The affected clan.
        clan_id: ClanId,
        /// Which state variable went non-finite.
        field: &'static str,
    },

    /// A clan parameter is out of range.
    #[error("invalid clan parameter: {reason}")]
    InvalidParameter {
        /// What was wrong with the parameter.
        reason: String,
    },
}
