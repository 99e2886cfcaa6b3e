//! The behavior state machine and the per-state targeting rules.
//!
//! [`Clan::decide_state`] picks one of the five states from the latest
//! perception. The remaining methods answer "where would this state go?"
//! without moving the clan; the execution mode decides how faithfully to
//! follow those answers and adds its own noise.

use clanfield_types::{BehaviorState, ClanId, ClanStrategy};
use clanfield_world::{Cell, GridDims, Position, ResourceField};

use crate::clan::Clan;
use crate::config::BehaviorConfig;
use crate::perception::ClanView;

/// The richest cell within `radius` of `here` according to `level`.
///
/// Cells for which `level` returns `None` are skipped. Ties go to the
/// nearest cell, then to the lowest cell in `(x, y)` order.
pub fn richest_cell(
    dims: GridDims,
    here: Cell,
    radius: f64,
    level: impl Fn(Cell) -> Option<f64>,
) -> Option<Cell> {
    let mut best: Option<(Cell, f64, f64)> = None;
    for cell in dims.disc_cells(here.center(), radius) {
        let Some(level) = level(cell) else {
            continue;
        };
        let dist = dims.cell_distance(here, cell);
        let better = match best {
            None => true,
            Some((_, best_level, best_dist)) => level > best_level || (level >= best_level && dist < best_dist),
        };
        if better {
            best = Some((cell, level, dist));
        }
    }
    best.map(|(cell, _, _)| cell)
}

impl Clan {
    /// Choose this tick's state from energy, threats, and local food.
    ///
    /// Rules are checked in priority order:
    ///
    /// 1. Low energy: `Resting`.
    /// 2. Threatened with energy to spare: `Fighting` if large, else `Defending`.
    /// 3. Scarce food with energy to travel: `Migrating`.
    /// 4. Otherwise: `Foraging`.
    #[allow(clippy::cast_precision_loss)]
    pub fn decide_state(&mut self, behavior: &BehaviorConfig) -> BehaviorState {
        let needed = self.size as f64
            * self.params.resource_required_per_individual
            * behavior.migration_resource_factor;

        let state = if self.energy < behavior.rest_energy_threshold {
            BehaviorState::Resting
        } else if !self.perception.threats.is_empty() && self.energy > behavior.fight_energy_threshold {
            if self.size > behavior.fight_min_size {
                BehaviorState::Fighting
            } else {
                BehaviorState::Defending
            }
        } else if self.perception.local_average < needed
            && self.energy > behavior.migrate_energy_threshold
        {
            BehaviorState::Migrating
        } else {
            BehaviorState::Foraging
        };
        self.state = state;
        state
    }

    /// The richest remembered cell within the perception disc.
    ///
    /// Ties go to the nearest cell, then to the lowest cell in `(x, y)`
    /// order. Returns `None` when nothing in range is remembered.
    pub fn forage_target(&self, dims: GridDims) -> Option<Cell> {
        richest_cell(dims, self.cell(dims), self.params.perception_radius, |cell| {
            self.memory.get(cell)
        })
    }

    /// Bonus for moving onto `cell`, shrinking with each recorded visit.
    /// Exploratory clans get twice the bonus.
    #[allow(clippy::cast_precision_loss)]
    pub fn exploration_bonus(&self, cell: Cell, capacity: f64, behavior: &BehaviorConfig) -> f64 {
        let visits = self.movement_history.visits(cell) as f64;
        let base = self.params.exploration_tendency * capacity * behavior.exploration_bonus_scale / (1.0 + visits);
        if self.strategy == ClanStrategy::Exploratory {
            base * 2.0
        } else {
            base
        }
    }

    /// Where a migration step along the unit direction `(ux, uy)` would
    /// land: half the perception radius away.
    pub fn migration_landing(&self, direction: (f64, f64), dims: GridDims) -> Position {
        let reach = self.params.perception_radius / 2.0;
        dims.wrap(self.position.offset(direction.0 * reach, direction.1 * reach))
    }

    /// Score of a migration landing: local food plus the exploration bonus.
    pub fn migration_score(&self, landing: Position, field: &ResourceField, behavior: &BehaviorConfig) -> f64 {
        let dims = field.dims();
        field.local_density(landing, behavior.migration_scan_radius)
            + self.exploration_bonus(dims.cell_of(landing), field.capacity(), behavior)
    }

    /// Nearest enemy or current threat within the engagement radius.
    /// Allies are never targeted.
    ///
    /// Ties keep the earlier clan in roster order.
    pub fn fight_target(&self, roster: &[ClanView], dims: GridDims, behavior: &BehaviorConfig) -> Option<(ClanId, Position)> {
        let mut best: Option<(ClanId, Position, f64)> = None;
        for view in roster {
            if view.id == self.id || view.size == 0 {
                continue;
            }
            let hostile = self.enemies.contains(&view.id) || self.perception.threats.contains(&view.id);
            if !hostile || self.allies.contains(&view.id) {
                continue;
            }
            let dist = dims.distance(self.position, view.position);
            if dist > behavior.engagement_radius {
                continue;
            }
            if best.is_none_or(|(_, _, d)| dist < d) {
                best = Some((view.id, view.position, dist));
            }
        }
        best.map(|(id, pos, _)| (id, pos))
    }

    /// The territory centroid if the clan has strayed further than the
    /// defend distance from it.
    pub fn defend_target(&self, dims: GridDims, behavior: &BehaviorConfig) -> Option<Position> {
        let centroid = self.territory.centroid(dims)?;
        (dims.distance(self.position, centroid) > behavior.defend_distance).then_some(centroid)
    }

    /// Apply resting recovery, each amount scaled by `dt`.
    ///
    /// `extra_energy` and `extra_morale` are per-unit-time adjustments the
    /// execution mode may add (noise).
    pub fn rest(&mut self, behavior: &BehaviorConfig, dt: f64, extra_energy: f64, extra_morale: f64) {
        self.adjust_energy((behavior.rest_energy_recovery + extra_energy).max(0.0) * dt);
        self.adjust_morale((behavior.rest_morale_recovery + extra_morale).max(0.0) * dt);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clanfield_world::{FieldParams, InitialDistribution, RandomSource};

    use super::*;
    use crate::clan::ClanSeed;
    use crate::params::ClanParameters;

    fn dims() -> GridDims {
        GridDims::new(20, 20).unwrap()
    }

    fn clan(id: u32, size: u64, energy: f64, strategy: ClanStrategy) -> Clan {
        Clan::new(
            ClanId::new(id),
            ClanSeed {
                size,
                position: Position::new(10.5, 10.5),
                strategy,
                energy,
                morale: 100.0,
                params: ClanParameters::default(),
            },
            dims(),
            &BehaviorConfig::default(),
        )
    }

    fn flat_field(level: f64) -> ResourceField {
        let mut rng = RandomSource::seeded(0);
        ResourceField::generate(
            dims(),
            FieldParams {
                capacity: 100.0,
                regen_rate: 1.5,
                noise_std: 0.0,
            },
            &InitialDistribution::Uniform { fraction: level / 100.0 },
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn low_energy_rests_first() {
        let cfg = BehaviorConfig::default();
        let mut c = clan(1, 20, 10.0, ClanStrategy::Aggressive);
        c.perception.threats.push(ClanId::new(2));
        assert_eq!(c.decide_state(&cfg), BehaviorState::Resting);
    }

    #[test]
    fn threats_trigger_fight_or_defend_by_size() {
        let cfg = BehaviorConfig::default();
        let mut big = clan(1, 9, 50.0, ClanStrategy::Aggressive);
        big.perception.threats.push(ClanId::new(2));
        assert_eq!(big.decide_state(&cfg), BehaviorState::Fighting);
        let mut small = clan(1, 8, 50.0, ClanStrategy::Aggressive);
        small.perception.threats.push(ClanId::new(2));
        assert_eq!(small.decide_state(&cfg), BehaviorState::Defending);
    }

    #[test]
    fn scarcity_triggers_migration() {
        let cfg = BehaviorConfig::default();
        let mut c = clan(1, 20, 50.0, ClanStrategy::Cooperative);
        // Need = 20 * 0.1 * 10 = 20.
        c.perception.local_average = 19.0;
        assert_eq!(c.decide_state(&cfg), BehaviorState::Migrating);
        c.perception.local_average = 20.0;
        assert_eq!(c.decide_state(&cfg), BehaviorState::Foraging);
        c.perception.local_average = 0.0;
        c.energy = 40.0;
        assert_eq!(c.decide_state(&cfg), BehaviorState::Foraging);
    }

    #[test]
    fn forage_target_prefers_richest_then_nearest() {
        let cfg = BehaviorConfig::default();
        let mut field = flat_field(10.0);
        field.set_cell(Cell::new(13, 10), 50.0);
        field.set_cell(Cell::new(11, 10), 50.0);
        let mut c = clan(1, 10, 100.0, ClanStrategy::Cooperative);
        c.perceive(&field, &[], &cfg);
        assert_eq!(c.forage_target(dims()), Some(Cell::new(11, 10)));
    }

    #[test]
    fn exploration_bonus_decays_with_visits() {
        let cfg = BehaviorConfig::default();
        let c = clan(1, 10, 100.0, ClanStrategy::Cooperative);
        let here = Cell::new(10, 10);
        let fresh = c.exploration_bonus(Cell::new(0, 0), 100.0, &cfg);
        let visited = c.exploration_bonus(here, 100.0, &cfg);
        assert!((fresh - 10.0).abs() < 1e-12);
        assert!((visited - 5.0).abs() < 1e-12);
        let explorer = clan(2, 10, 100.0, ClanStrategy::Exploratory);
        assert!((explorer.exploration_bonus(Cell::new(0, 0), 100.0, &cfg) - 20.0).abs() < 1e-12);
        let halved = BehaviorConfig {
            exploration_bonus_scale: 0.1,
            ..cfg
        };
        assert!((c.exploration_bonus(Cell::new(0, 0), 100.0, &halved) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn fight_target_is_nearest_hostile_in_range() {
        let cfg = BehaviorConfig::default();
        let mut c = clan(1, 10, 100.0, ClanStrategy::Aggressive);
        c.declare_enemy(ClanId::new(2));
        c.declare_enemy(ClanId::new(3));
        let roster = [
            ClanView {
                id: ClanId::new(2),
                position: Position::new(12.5, 10.5),
                size: 5,
                strategy: ClanStrategy::Defensive,
            },
            ClanView {
                id: ClanId::new(3),
                position: Position::new(11.5, 10.5),
                size: 5,
                strategy: ClanStrategy::Defensive,
            },
            ClanView {
                id: ClanId::new(4),
                position: Position::new(10.5, 11.0),
                size: 5,
                strategy: ClanStrategy::Defensive,
            },
        ];
        let (id, _) = c.fight_target(&roster, dims(), &cfg).unwrap();
        assert_eq!(id, ClanId::new(3));
    }

    #[test]
    fn defend_target_only_when_far() {
        let cfg = BehaviorConfig::default();
        let mut c = clan(1, 10, 100.0, ClanStrategy::Defensive);
        assert!(c.defend_target(dims(), &cfg).is_none());
        c.move_by(3.0, 0.0, dims());
        let target = c.defend_target(dims(), &cfg).unwrap();
        assert!((target.x - 10.5).abs() < 1e-9);
    }

    #[test]
    fn resting_recovers_toward_cap() {
        let cfg = BehaviorConfig::default();
        let mut c = clan(1, 10, 10.0, ClanStrategy::Defensive);
        c.morale = 50.0;
        c.rest(&cfg, 0.1, 0.0, 0.0);
        assert!((c.energy - 12.5).abs() < 1e-12);
        assert!((c.morale - 51.0).abs() < 1e-12);
    }
}
