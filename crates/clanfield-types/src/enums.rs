//! Enumeration types for the Clanfield simulation.

use serde::{Deserialize, Serialize};

use crate::ids::ClanId;

// ---------------------------------------------------------------------------
// Behavior states
// ---------------------------------------------------------------------------

/// The behavior a clan has chosen for the current tick.
///
/// Re-evaluated once per tick before the clan acts. The priority order of
/// the transition rule is Resting, then Fighting/Defending, then Migrating,
/// with Foraging as the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    /// Moving toward the richest remembered cell and eating.
    Foraging,
    /// Relocating toward a better region at increased speed.
    Migrating,
    /// Recovering energy and morale in place.
    Resting,
    /// Falling back toward the territory centroid.
    Defending,
    /// Closing on the nearest enemy to engage it.
    Fighting,
}

impl BehaviorState {
    /// All states in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Foraging,
        Self::Migrating,
        Self::Resting,
        Self::Defending,
        Self::Fighting,
    ];

    /// Lowercase name used in logs and external payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Foraging => "foraging",
            Self::Migrating => "migrating",
            Self::Resting => "resting",
            Self::Defending => "defending",
            Self::Fighting => "fighting",
        }
    }
}

impl core::fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A clan's social strategy, fixed at creation.
///
/// Strategy decides which pairwise interaction rule applies when two clans
/// meet: cooperative pairs try to ally, aggressive clans start fights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClanStrategy {
    /// Seeks alliances with other cooperative clans.
    Cooperative,
    /// Attacks clans within melee range.
    Aggressive,
    /// Holds territory; never initiates combat.
    Defensive,
    /// Favors unvisited cells when migrating.
    Exploratory,
}

impl ClanStrategy {
    /// All strategies in declaration order (the order strategy weights use).
    pub const ALL: [Self; 4] = [
        Self::Cooperative,
        Self::Aggressive,
        Self::Defensive,
        Self::Exploratory,
    ];

    /// Lowercase name used in logs and external payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cooperative => "cooperative",
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
            Self::Exploratory => "exploratory",
        }
    }
}

impl core::fmt::Display for ClanStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Execution modes
// ---------------------------------------------------------------------------

/// Which execution strategy drives clan behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    /// Noisy movement, probabilistic foraging.
    #[default]
    Stochastic,
    /// Locally optimal, noise-free movement with memoized directions.
    Deterministic,
    /// Deterministic directions with scaled-down stochastic noise.
    Hybrid,
}

impl ModeKind {
    /// Lowercase name used in logs and external payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stochastic => "stochastic",
            Self::Deterministic => "deterministic",
            Self::Hybrid => "hybrid",
        }
    }
}

impl core::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

/// Why a termination monitor asked the driver to stop.
///
/// The kernel never stops on its own; these are only produced when the
/// engine is configured with a termination monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TerminationReason {
    /// No individuals left in any clan for the configured grace period.
    Extinction,
    /// A single clan survives past the dominance window.
    Dominance {
        /// The surviving clan.
        clan_id: ClanId,
    },
    /// The configured step limit was reached.
    MaxSteps {
        /// The limit that was hit.
        steps: u64,
    },
    /// Total population has stopped changing meaningfully.
    Converged {
        /// Mean total population over the evaluation window.
        mean_population: f64,
    },
    /// Very few individuals remain.
    CriticalPopulation {
        /// Total individuals remaining.
        remaining: u64,
    },
    /// Several clans survive but all are vanishingly small.
    Degenerate,
}

impl core::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Extinction => f.write_str("total extinction: no individuals remain in any clan"),
            Self::Dominance { clan_id } => write!(f, "total dominance: only clan {clan_id} remains"),
            Self::MaxSteps { steps } => write!(f, "step limit reached ({steps})"),
            Self::Converged { mean_population } => {
                write!(f, "converged: population stable at {mean_population:.0} individuals")
            }
            Self::CriticalPopulation { remaining } => {
                write!(f, "critical population: only {remaining} individuals remain")
            }
            Self::Degenerate => f.write_str("degenerate system: every clan is very small"),
        }
    }
}
