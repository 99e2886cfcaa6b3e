//! Eating from the field and the resulting energy change.

use clanfield_world::ResourceField;

use crate::clan::Clan;
use crate::config::BehaviorConfig;
use crate::error::AgentError;

/// Result of one consumption step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Consumption {
    /// Amount the clan tried to eat.
    pub needed: f64,
    /// Amount actually removed from the field.
    pub consumed: f64,
}

impl Clan {
    /// Eat from the current cell and update energy (and morale when hungry).
    ///
    /// The need is `size * resource_required_per_individual * dt`, discounted
    /// by `1 - cooperation_tendency * cooperation_efficiency`. Energy decays
    /// every tick and is restored in proportion to the share of the need
    /// actually met. An empty need (size 0 or zero requirement) counts as
    /// fully met.
    #[allow(clippy::cast_precision_loss)]
    pub fn consume(&mut self, field: &mut ResourceField, behavior: &BehaviorConfig, dt: f64) -> Result<Consumption, AgentError> {
        let efficiency = self
            .params
            .cooperation_tendency
            .mul_add(-behavior.cooperation_efficiency, 1.0)
            .max(0.0);
        let needed = self.size as f64 * self.params.resource_required_per_individual * dt * efficiency;
        let consumed = if needed > 0.0 {
            field.consume(self.position, needed)?
        } else {
            0.0
        };
        let fraction = if needed > 0.0 {
            (consumed / needed).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let gain = fraction * behavior.energy_conversion * dt;
        self.adjust_energy(gain - behavior.energy_decay * dt);
        if self.energy < behavior.rest_energy_threshold {
            self.adjust_morale(-behavior.hunger_morale_decay * dt);
        }
        Ok(Consumption { needed, consumed })
    }
}
