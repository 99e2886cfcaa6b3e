//! The clan entity.
//!
//! A [`Clan`] is a population cluster with a position on the torus, a
//! size, energy and morale, a behavior state, and the bounded memories and
//! territory it accumulates over a run. Fields are public so the execution
//! mode and the interaction pass can act on them directly; the methods here
//! keep the numeric invariants (energy and morale in `[0, 100]`, wrapped
//! positions, bounded history) whenever they are used to mutate state.

use std::collections::BTreeSet;

use clanfield_types::{BehaviorState, ClanId, ClanSnapshot, ClanStrategy};
use clanfield_world::{Cell, GridDims, Position};

use crate::config::BehaviorConfig;
use crate::error::AgentError;
use crate::memory::{MovementHistory, ResourceMemory};
use crate::params::ClanParameters;
use crate::perception::Perception;
use crate::territory::Territory;

/// Upper bound of energy and morale.
pub const MAX_VITALITY: f64 = 100.0;

/// Everything needed to create a clan apart from its id.
#[derive(Debug, Clone, PartialEq)]
pub struct ClanSeed {
    /// Initial population.
    pub size: u64,
    /// Initial position (wrapped on creation).
    pub position: Position,
    /// Fixed social strategy.
    pub strategy: ClanStrategy,
    /// Initial energy.
    pub energy: f64,
    /// Initial morale.
    pub morale: f64,
    /// Tuning parameters.
    pub params: ClanParameters,
}

/// A population cluster on the resource field.
#[derive(Debug, Clone, PartialEq)]
pub struct Clan {
    /// Stable identifier.
    pub id: ClanId,
    /// Position on the torus, always wrapped.
    pub position: Position,
    /// Population count.
    pub size: u64,
    /// Energy in `[0, 100]`.
    pub energy: f64,
    /// Morale in `[0, 100]`.
    pub morale: f64,
    /// Behavior chosen for the current tick.
    pub state: BehaviorState,
    /// Fixed social strategy.
    pub strategy: ClanStrategy,
    /// Tuning parameters.
    pub params: ClanParameters,
    /// Claimed cells.
    pub territory: Territory,
    /// Allied clans. Never overlaps `enemies`.
    pub allies: BTreeSet<ClanId>,
    /// Hostile clans. Never overlaps `allies`.
    pub enemies: BTreeSet<ClanId>,
    /// Last observed level of scanned cells.
    pub memory: ResourceMemory,
    /// Recently occupied cells.
    pub movement_history: MovementHistory,
    /// Fractional combat casualties waiting for the population update.
    pub pending_losses: f64,
    /// Result of the most recent scan.
    pub perception: Perception,
}

impl Clan {
    /// Create a clan at its seed position, claiming the cell it starts on.
    pub fn new(id: ClanId, seed: ClanSeed, dims: GridDims, behavior: &BehaviorConfig) -> Self {
        let position = dims.wrap(seed.position);
        let start = dims.cell_of(position);
        let mut territory = Territory::new();
        territory.claim(start);
        let mut movement_history = MovementHistory::new(behavior.movement_history);
        movement_history.push(start);
        Self {
            id,
            position,
            size: seed.size,
            energy: seed.energy.clamp(0.0, MAX_VITALITY),
            morale: seed.morale.clamp(0.0, MAX_VITALITY),
            state: BehaviorState::Foraging,
            strategy: seed.strategy,
            params: seed.params,
            territory,
            allies: BTreeSet::new(),
            enemies: BTreeSet::new(),
            memory: ResourceMemory::new(behavior.memory_capacity),
            movement_history,
            pending_losses: 0.0,
            perception: Perception::default(),
        }
    }

    /// Whether the clan still has members.
    pub const fn is_alive(&self) -> bool {
        self.size > 0
    }

    /// The cell the clan stands on.
    pub fn cell(&self, dims: GridDims) -> Cell {
        dims.cell_of(self.position)
    }

    /// Add `delta` to energy, clamped to `[0, 100]`.
    pub fn adjust_energy(&mut self, delta: f64) {
        self.energy = (self.energy + delta).clamp(0.0, MAX_VITALITY);
    }

    /// Add `delta` to morale, clamped to `[0, 100]`.
    pub fn adjust_morale(&mut self, delta: f64) {
        self.morale = (self.morale + delta).clamp(0.0, MAX_VITALITY);
    }

    /// Displace by `(dx, dy)`, wrap, and record the landing cell.
    pub fn move_by(&mut self, dx: f64, dy: f64, dims: GridDims) {
        self.position = dims.wrap(self.position.offset(dx, dy));
        self.movement_history.push(dims.cell_of(self.position));
    }

    /// Move up to `distance` along the shortest path to `target`, stopping
    /// on it if it is closer than that.
    pub fn move_toward(&mut self, target: Position, distance: f64, dims: GridDims) {
        let (dx, dy) = dims.delta(self.position, target);
        let len = dx.hypot(dy);
        if len <= f64::EPSILON || distance <= 0.0 {
            self.move_by(0.0, 0.0, dims);
            return;
        }
        let step = distance.min(len) / len;
        self.move_by(dx * step, dy * step, dims);
    }

    /// Move `distance` along the unit direction `(ux, uy)`.
    pub fn move_along(&mut self, direction: (f64, f64), distance: f64, dims: GridDims) {
        let (ux, uy) = direction;
        self.move_by(ux * distance, uy * distance, dims);
    }

    /// Record `other` as an ally, dropping any hostility.
    pub fn ally_with(&mut self, other: ClanId) {
        self.enemies.remove(&other);
        self.allies.insert(other);
    }

    /// Record `other` as an enemy, dissolving any alliance.
    pub fn declare_enemy(&mut self, other: ClanId) {
        self.allies.remove(&other);
        self.enemies.insert(other);
    }

    /// Drop every relation with `other`.
    pub fn forget(&mut self, other: ClanId) {
        self.allies.remove(&other);
        self.enemies.remove(&other);
    }

    /// Marker radius for renderers: `clamp(sqrt(size) * 1.5, 3, 12)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn visual_size_hint(&self) -> f64 {
        ((self.size as f64).sqrt() * 1.5).clamp(3.0, 12.0)
    }

    /// Fail if any continuous state variable is NaN or infinite.
    pub fn check_finite(&self) -> Result<(), AgentError> {
        let checks = [
            ("position", self.position.is_finite()),
            ("energy", self.energy.is_finite()),
            ("morale", self.morale.is_finite()),
            ("pending_losses", self.pending_losses.is_finite()),
        ];
        for (field, ok) in checks {
            if !ok {
                return Err(AgentError::NonFiniteState {
                    clan_id: self.id,
                    field,
                });
            }
        }
        Ok(())
    }

    /// Observable state for the engine's state query.
    pub fn snapshot(&self) -> ClanSnapshot {
        ClanSnapshot {
            id: self.id,
            size: self.size,
            position: self.position.to_array(),
            energy: self.energy,
            morale: self.morale,
            state: self.state,
            strategy: self.strategy,
            territory_size: self.territory.len(),
            visual_size_hint: self.visual_size_hint(),
            allies: self.allies.clone(),
            enemies: self.enemies.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn clan_at(x: f64, y: f64) -> Clan {
        let dims = GridDims::new(10, 10).unwrap();
        Clan::new(
            ClanId::new(1),
            ClanSeed {
                size: 16,
                position: Position::new(x, y),
                strategy: ClanStrategy::Cooperative,
                energy: 150.0,
                morale: 50.0,
                params: ClanParameters::default(),
            },
            dims,
            &BehaviorConfig::default(),
        )
    }

    #[test]
    fn creation_wraps_and_clamps() {
        let clan = clan_at(-1.0, 12.0);
        assert_eq!(clan.position, Position::new(9.0, 2.0));
        assert!((clan.energy - 100.0).abs() < f64::EPSILON);
        assert_eq!(clan.territory.len(), 1);
        assert!(clan.territory.contains(Cell::new(9, 2)));
    }

    #[test]
    fn move_toward_stops_on_target() {
        let dims = GridDims::new(10, 10).unwrap();
        let mut clan = clan_at(1.0, 1.0);
        clan.move_toward(Position::new(1.5, 1.0), 2.0, dims);
        assert!((clan.position.x - 1.5).abs() < 1e-12);
        clan.move_toward(Position::new(9.5, 1.0), 1.0, dims);
        // The short way to x = 9.5 from 1.5 crosses the seam.
        assert!((clan.position.x - 0.5).abs() < 1e-12);
        assert_eq!(clan.movement_history.last(), Some(Cell::new(0, 1)));
    }

    #[test]
    fn relations_stay_exclusive() {
        let mut clan = clan_at(0.0, 0.0);
        let other = ClanId::new(2);
        clan.ally_with(other);
        clan.declare_enemy(other);
        assert!(!clan.allies.contains(&other));
        assert!(clan.enemies.contains(&other));
        clan.ally_with(other);
        assert!(clan.allies.contains(&other));
        assert!(!clan.enemies.contains(&other));
    }

    #[test]
    fn visual_hint_is_clamped() {
        let mut clan = clan_at(0.0, 0.0);
        assert!((clan.visual_size_hint() - 6.0).abs() < 1e-12);
        clan.size = 1;
        assert!((clan.visual_size_hint() - 3.0).abs() < 1e-12);
        clan.size = 10_000;
        assert!((clan.visual_size_hint() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_state_is_reported() {
        let mut clan = clan_at(0.0, 0.0);
        clan.energy = f64::NAN;
        assert!(matches!(
            clan.check_finite(),
            Err(AgentError::NonFiniteState { field: "energy", .. })
        ));
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut clan = clan_at(3.0, 4.0);
        clan.declare_enemy(ClanId::new(7));
        let snap = clan.snapshot();
        assert_eq!(snap.position, [3.0, 4.0]);
        assert_eq!(snap.territory_size, 1);
        assert!(snap.enemies.contains(&ClanId::new(7)));
    }
}
