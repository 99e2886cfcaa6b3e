//! Per-tick perception: scanning the field and spotting threats.

use clanfield_types::{ClanId, ClanStrategy};
use clanfield_world::{Position, ResourceField};

use crate::clan::Clan;
use crate::config::BehaviorConfig;

/// A read-only view of a clan, taken before the behavior phase so every
/// clan perceives the same roster regardless of update order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClanView {
    /// Clan identifier.
    pub id: ClanId,
    /// Position at the start of the tick.
    pub position: Position,
    /// Population at the start of the tick.
    pub size: u64,
    /// Social strategy.
    pub strategy: ClanStrategy,
}

impl From<&Clan> for ClanView {
    fn from(clan: &Clan) -> Self {
        Self {
            id: clan.id,
            position: clan.position,
            size: clan.size,
            strategy: clan.strategy,
        }
    }
}

/// What a clan learned from its latest scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Perception {
    /// Mean resource level over the scanned disc.
    pub local_average: f64,
    /// Nearby clans at least comparable in size, in roster order.
    pub threats: Vec<ClanId>,
}

impl Clan {
    /// Re-scan the perception disc into memory and recount nearby threats.
    ///
    /// Memory grows to hold the whole disc, so every cell in range is
    /// remembered after the scan; older cells outside the disc go first.
    ///
    /// A threat is any other living clan within half the perception radius
    /// whose size is at least `threat_size_ratio` of this clan's size.
    #[allow(clippy::cast_precision_loss)]
    pub fn perceive(&mut self, field: &ResourceField, roster: &[ClanView], behavior: &BehaviorConfig) {
        let dims = field.dims();
        let cells = dims.disc_cells(self.position, self.params.perception_radius);
        self.memory.ensure_capacity(cells.len());
        let mut sum = 0.0;
        for &cell in &cells {
            let level = field.get_cell(cell);
            self.memory.record(cell, level);
            sum += level;
        }
        let local_average = if cells.is_empty() {
            0.0
        } else {
            sum / cells.len() as f64
        };

        let threat_radius = self.params.perception_radius / 2.0;
        let min_size = self.size as f64 * behavior.threat_size_ratio;
        let threats = roster
            .iter()
            .filter(|v| v.id != self.id && v.size > 0)
            .filter(|v| v.size as f64 >= min_size)
            .filter(|v| dims.distance(self.position, v.position) <= threat_radius)
            .map(|v| v.id)
            .collect();

        self.perception = Perception {
            local_average,
            threats,
        };
    }
}
