//! Territory: the set of grid cells a clan claims.
//!
//! Cells remember the order in which they were claimed so that pruning a
//! territory back to its cap always drops the oldest claims first.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;

use clanfield_world::{Cell, GridDims, Position, RandomSource};

use crate::clan::{Clan, MAX_VITALITY};
use crate::config::BehaviorConfig;
use crate::error::AgentError;

/// A clan's claimed cells, ordered by claim age.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Territory {
    cells: BTreeMap<Cell, u64>,
    order: BTreeMap<u64, Cell>,
    next_seq: u64,
}

impl Territory {
    /// An empty territory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of claimed cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell is claimed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `cell` is claimed.
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Claimed cells in cell order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.keys().copied()
    }

    /// Claim `cell`. Returns `false` if it was already claimed.
    pub fn claim(&mut self, cell: Cell) -> bool {
        if self.cells.contains_key(&cell) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.cells.insert(cell, seq);
        self.order.insert(seq, cell);
        true
    }

    /// Release `cell`. Returns `false` if it was not claimed.
    pub fn release(&mut self, cell: Cell) -> bool {
        match self.cells.remove(&cell) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    /// Drop the oldest claims until at most `cap` remain; returns the
    /// released cells, oldest first.
    pub fn prune_to(&mut self, cap: usize) -> Vec<Cell> {
        let mut released = Vec::new();
        while self.cells.len() > cap {
            let Some((_, cell)) = self.order.pop_first() else {
                break;
            };
            self.cells.remove(&cell);
            released.push(cell);
        }
        released
    }

    /// Unclaimed cells edge-adjacent to the territory.
    pub fn frontier(&self, dims: GridDims) -> BTreeSet<Cell> {
        self.cells
            .keys()
            .flat_map(|&c| dims.neighbors4(c))
            .filter(|c| !self.cells.contains_key(c))
            .collect()
    }

    /// Centroid of the claimed cells' centres.
    ///
    /// Each axis is averaged as an angle around the torus, so a territory
    /// straddling the wrap seam gets a centroid on the seam rather than in
    /// the middle of the grid. When the cells are spread evenly around an
    /// axis the angular mean is undefined and the plain mean is used.
    #[allow(clippy::cast_precision_loss)] // cell counts and axes are far below 2^52
    pub fn centroid(&self, dims: GridDims) -> Option<Position> {
        if self.cells.is_empty() {
            return None;
        }
        let n = self.cells.len() as f64;
        let centres: Vec<Position> = self.cells.keys().map(|c| c.center()).collect();
        let x = circular_mean(centres.iter().map(|p| p.x), dims.width() as f64, n);
        let y = circular_mean(centres.iter().map(|p| p.y), dims.height() as f64, n);
        Some(dims.wrap(Position::new(x, y)))
    }
}

/// What a territory update changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerritoryChange {
    /// Newly claimed cell, if any.
    pub claimed: Option<Cell>,
    /// Cells released by the size cap, oldest first.
    pub released: Vec<Cell>,
}

impl Clan {
    /// Possibly claim one unclaimed cell next to the territory, then prune
    /// back to `size * territory_per_individual` cells.
    ///
    /// `claimed_by_any` holds every cell owned by any clan; it is updated in
    /// place so clans processed later in the same tick see this claim. The
    /// claim probability is `territorial_expansion_rate * energy/100 *
    /// morale/100`. A clan with no territory left claims its own cell.
    pub fn update_territory(
        &mut self,
        claimed_by_any: &mut BTreeSet<Cell>,
        dims: GridDims,
        behavior: &BehaviorConfig,
        rng: &mut RandomSource,
    ) -> Result<TerritoryChange, AgentError> {
        let mut change = TerritoryChange::default();
        let probability = (self.params.territorial_expansion_rate
            * (self.energy / MAX_VITALITY)
            * (self.morale / MAX_VITALITY))
            .clamp(0.0, 1.0);

        if rng.chance(probability) {
            let candidates: Vec<Cell> = if self.territory.is_empty() {
                vec![self.cell(dims)]
            } else {
                self.territory.frontier(dims).into_iter().collect()
            };
            let free: Vec<Cell> = candidates
                .into_iter()
                .filter(|c| !claimed_by_any.contains(c))
                .collect();
            if !free.is_empty() {
                let cell = *rng.choice(&free)?;
                self.territory.claim(cell);
                claimed_by_any.insert(cell);
                change.claimed = Some(cell);
            }
        }

        let cap = usize::try_from(self.size.saturating_mul(behavior.territory_per_individual))
            .unwrap_or(usize::MAX);
        change.released = self.territory.prune_to(cap);
        for cell in &change.released {
            claimed_by_any.remove(cell);
        }
        Ok(change)
    }
}

fn circular_mean(values: impl Iterator<Item = f64> + Clone, extent: f64, n: f64) -> f64 {
    let (sin_sum, cos_sum) = values.clone().fold((0.0_f64, 0.0_f64), |(s, c), v| {
        let angle = v / extent * TAU;
        (s + angle.sin(), c + angle.cos())
    });
    if sin_sum.hypot(cos_sum) / n < 1e-9 {
        return values.sum::<f64>() / n;
    }
    let angle = sin_sum.atan2(cos_sum).rem_euclid(TAU);
    angle / TAU * extent
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clanfield_types::{ClanId, ClanStrategy};

    use super::*;
    use crate::clan::ClanSeed;
    use crate::params::ClanParameters;

    fn dims() -> GridDims {
        GridDims::new(20, 20).unwrap()
    }

    fn expanding_clan(size: u64) -> Clan {
        Clan::new(
            ClanId::new(1),
            ClanSeed {
                size,
                position: Position::new(5.5, 5.5),
                strategy: ClanStrategy::Defensive,
                energy: 100.0,
                morale: 100.0,
                params: ClanParameters {
                    territorial_expansion_rate: 1.0,
                    ..ClanParameters::default()
                },
            },
            dims(),
            &BehaviorConfig::default(),
        )
    }

    #[test]
    fn claims_are_unique() {
        let mut t = Territory::new();
        assert!(t.claim(Cell::new(1, 1)));
        assert!(!t.claim(Cell::new(1, 1)));
        assert_eq!(t.len(), 1);
        assert!(t.release(Cell::new(1, 1)));
        assert!(t.is_empty());
    }

    #[test]
    fn pruning_drops_oldest_claims() {
        let mut t = Territory::new();
        for x in 0..6 {
            t.claim(Cell::new(x, 0));
        }
        let released = t.prune_to(4);
        assert_eq!(released, vec![Cell::new(0, 0), Cell::new(1, 0)]);
        assert_eq!(t.len(), 4);
        assert!(t.contains(Cell::new(5, 0)));
    }

    #[test]
    fn frontier_excludes_owned_cells() {
        let mut t = Territory::new();
        t.claim(Cell::new(5, 5));
        t.claim(Cell::new(6, 5));
        let frontier = t.frontier(dims());
        assert_eq!(frontier.len(), 6);
        assert!(!frontier.contains(&Cell::new(5, 5)));
        assert!(frontier.contains(&Cell::new(7, 5)));
    }

    #[test]
    fn centroid_of_compact_block() {
        let mut t = Territory::new();
        t.claim(Cell::new(4, 4));
        t.claim(Cell::new(5, 4));
        let c = t.centroid(dims()).unwrap();
        assert!((c.x - 5.0).abs() < 1e-9);
        assert!((c.y - 4.5).abs() < 1e-9);
    }

    #[test]
    fn centroid_respects_wrap_seam() {
        let mut t = Territory::new();
        t.claim(Cell::new(0, 10));
        t.claim(Cell::new(19, 10));
        let c = t.centroid(dims()).unwrap();
        // Centres are 0.5 and 19.5; the short-way midpoint is the seam.
        assert!(c.x < 0.01 || c.x > 19.99);
        assert!(Territory::new().centroid(dims()).is_none());
    }

    #[test]
    fn certain_expansion_claims_a_free_neighbour() {
        let mut clan = expanding_clan(10);
        let mut claimed: BTreeSet<Cell> = clan.territory.cells().collect();
        claimed.insert(Cell::new(6, 5));
        claimed.insert(Cell::new(4, 5));
        claimed.insert(Cell::new(5, 6));
        let mut rng = RandomSource::seeded(4);
        let change = clan
            .update_territory(&mut claimed, dims(), &BehaviorConfig::default(), &mut rng)
            .unwrap();
        assert_eq!(change.claimed, Some(Cell::new(5, 4)));
        assert!(claimed.contains(&Cell::new(5, 4)));
        assert_eq!(clan.territory.len(), 2);
    }

    #[test]
    fn territory_is_capped_by_size() {
        let mut clan = expanding_clan(1);
        let mut claimed = BTreeSet::new();
        let mut rng = RandomSource::seeded(8);
        for _ in 0..20 {
            clan.update_territory(&mut claimed, dims(), &BehaviorConfig::default(), &mut rng)
                .unwrap();
            assert!(clan.territory.len() <= 5);
        }
        assert_eq!(clan.territory.len(), 5);
        assert_eq!(claimed.len(), 5);
    }
}
