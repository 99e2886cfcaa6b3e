//! Pairwise interaction resolution.
//!
//! Runs once per tick after every clan has moved. Each unordered pair within
//! the interaction radius is resolved by the first matching rule:
//!
//! 1. Both cooperative: alliance attempt and a proximity morale bonus.
//! 2. Either aggressive, or already enemies, and within melee range: combat.
//! 3. Within the competition radius: competition for food.
//!
//! Pairs are visited in roster order `(i, j)` with `i < j`, so the random
//! draws happen in the same order on every run with the same seed.

use clanfield_types::{ClanId, ClanStrategy};
use clanfield_world::{GridDims, RandomSource};
use tracing::debug;

use crate::clan::Clan;
use crate::config::{BehaviorConfig, InteractionConfig};
use crate::error::AgentError;

/// Which rule resolved a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Two cooperative clans met; `formed` is true if they allied this tick.
    Cooperation {
        /// Whether a new alliance was formed.
        formed: bool,
    },
    /// The pair fought.
    Combat,
    /// The pair competed for food.
    Competition,
}

/// One resolved pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionEvent {
    /// Earlier clan in roster order.
    pub first: ClanId,
    /// Later clan in roster order.
    pub second: ClanId,
    /// Rule that applied.
    pub kind: InteractionKind,
}

/// Counts and events from one interaction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionReport {
    /// Alliances formed.
    pub alliances: u32,
    /// Combats fought.
    pub combats: u32,
    /// Competitions resolved.
    pub competitions: u32,
    /// Every resolved pair, in visit order.
    pub events: Vec<InteractionEvent>,
}

/// Mutable access to two distinct roster entries.
fn pair_mut(clans: &mut [Clan], i: usize, j: usize) -> Option<(&mut Clan, &mut Clan)> {
    if i >= j {
        return None;
    }
    let (head, tail) = clans.split_at_mut(j);
    Some((head.get_mut(i)?, tail.first_mut()?))
}

/// Resolve every pair of living clans within the interaction radius.
pub fn resolve_interactions(
    clans: &mut [Clan],
    dims: GridDims,
    interaction: &InteractionConfig,
    behavior: &BehaviorConfig,
    rng: &mut RandomSource,
    dt: f64,
) -> Result<InteractionReport, AgentError> {
    let mut report = InteractionReport::default();
    let n = clans.len();
    for i in 0..n {
        for j in i.saturating_add(1)..n {
            let Some((a, b)) = pair_mut(clans, i, j) else {
                continue;
            };
            if !a.is_alive() || !b.is_alive() {
                continue;
            }
            let distance = dims.distance(a.position, b.position);
            if distance > interaction.interaction_radius {
                continue;
            }
            let kind = resolve_pair(a, b, distance, interaction, behavior, rng, dt)?;
            let Some(kind) = kind else {
                continue;
            };
            match kind {
                InteractionKind::Cooperation { formed: true } => {
                    report.alliances = report.alliances.saturating_add(1);
                }
                InteractionKind::Cooperation { formed: false } => {}
                InteractionKind::Combat => report.combats = report.combats.saturating_add(1),
                InteractionKind::Competition => {
                    report.competitions = report.competitions.saturating_add(1);
                }
            }
            report.events.push(InteractionEvent {
                first: a.id,
                second: b.id,
                kind,
            });
        }
    }
    Ok(report)
}

fn resolve_pair(
    a: &mut Clan,
    b: &mut Clan,
    distance: f64,
    interaction: &InteractionConfig,
    behavior: &BehaviorConfig,
    rng: &mut RandomSource,
    dt: f64,
) -> Result<Option<InteractionKind>, AgentError> {
    if a.strategy == ClanStrategy::Cooperative && b.strategy == ClanStrategy::Cooperative {
        let formed = cooperate(a, b, distance, interaction, rng, dt);
        return Ok(Some(InteractionKind::Cooperation { formed }));
    }

    let hostile = a.strategy == ClanStrategy::Aggressive
        || b.strategy == ClanStrategy::Aggressive
        || a.enemies.contains(&b.id)
        || b.enemies.contains(&a.id);
    if hostile && distance <= behavior.melee_range {
        fight(a, b, interaction, rng, dt)?;
        return Ok(Some(InteractionKind::Combat));
    }

    if distance <= interaction.competition_radius {
        compete(a, b, interaction, dt);
        return Ok(Some(InteractionKind::Competition));
    }
    Ok(None)
}

/// Both sides roll against their own cooperation tendency, then the joint
/// gate. Morale rises for both either way, more when closer.
fn cooperate(
    a: &mut Clan,
    b: &mut Clan,
    distance: f64,
    interaction: &InteractionConfig,
    rng: &mut RandomSource,
    dt: f64,
) -> bool {
    let a_willing = rng.chance(a.params.cooperation_tendency);
    let b_willing = rng.chance(b.params.cooperation_tendency);
    let gate = rng.chance(interaction.alliance_probability);
    let formed = a_willing && b_willing && gate && !a.allies.contains(&b.id);
    if a_willing && b_willing && gate {
        a.ally_with(b.id);
        b.ally_with(a.id);
    }

    let proximity = if interaction.interaction_radius > 0.0 {
        (1.0 - distance / interaction.interaction_radius).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let bonus = interaction.alliance_morale_bonus * proximity * dt;
    a.adjust_morale(bonus);
    b.adjust_morale(bonus);
    if formed {
        debug!(first = %a.id, second = %b.id, "alliance formed");
    }
    formed
}

#[allow(clippy::cast_precision_loss)]
fn strength(clan: &Clan, noise: f64) -> f64 {
    let base = clan.size as f64 * (clan.energy / 100.0) * clan.params.aggressiveness;
    base * (1.0 + noise).max(0.0)
}

/// Casualties are proportional to the opponent's share of total strength
/// and accrue as pending losses for the population update.
fn fight(
    a: &mut Clan,
    b: &mut Clan,
    interaction: &InteractionConfig,
    rng: &mut RandomSource,
    dt: f64,
) -> Result<(), AgentError> {
    let noise_a = rng.normal(0.0, interaction.combat_noise_std)?;
    let noise_b = rng.normal(0.0, interaction.combat_noise_std)?;
    let sa = strength(a, noise_a);
    let sb = strength(b, noise_b);
    let total = sa + sb;

    if total > 0.0 {
        let damage = interaction.combat_damage * dt;
        a.pending_losses += damage * sb / total;
        b.pending_losses += damage * sa / total;
        let morale_loss = interaction.combat_morale_loss * dt;
        if sa < sb {
            a.adjust_morale(-morale_loss);
        } else if sb < sa {
            b.adjust_morale(-morale_loss);
        }
    }

    let cost = interaction.combat_energy_cost * dt;
    a.adjust_energy(-cost);
    b.adjust_energy(-cost);
    a.declare_enemy(b.id);
    b.declare_enemy(a.id);
    debug!(first = %a.id, second = %b.id, strength_a = sa, strength_b = sb, "combat resolved");
    Ok(())
}

/// The side with the lower `size * energy` score pays the larger share of
/// the penalty.
#[allow(clippy::cast_precision_loss)]
fn compete(a: &mut Clan, b: &mut Clan, interaction: &InteractionConfig, dt: f64) {
    let score_a = a.size as f64 * (a.energy / 100.0);
    let score_b = b.size as f64 * (b.energy / 100.0);
    let total = score_a + score_b;
    let (share_a, share_b) = if total > 0.0 {
        (score_b / total, score_a / total)
    } else {
        (0.5, 0.5)
    };
    let penalty = interaction.competition_energy_penalty * dt;
    a.adjust_energy(-penalty * share_a);
    b.adjust_energy(-penalty * share_b);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clanfield_world::Position;

    use super::*;
    use crate::clan::ClanSeed;
    use crate::params::ClanParameters;

    fn dims() -> GridDims {
        GridDims::new(30, 30).unwrap()
    }

    fn clan(id: u32, strategy: ClanStrategy, x: f64, size: u64, energy: f64) -> Clan {
        Clan::new(
            ClanId::new(id),
            ClanSeed {
                size,
                position: Position::new(x, 10.0),
                strategy,
                energy,
                morale: 50.0,
                params: ClanParameters {
                    cooperation_tendency: 1.0,
                    aggressiveness: 0.5,
                    ..ClanParameters::default()
                },
            },
            dims(),
            &BehaviorConfig::default(),
        )
    }

    fn run(clans: &mut [Clan], interaction: &InteractionConfig, seed: u64) -> InteractionReport {
        let mut rng = RandomSource::seeded(seed);
        resolve_interactions(
            clans,
            dims(),
            interaction,
            &BehaviorConfig::default(),
            &mut rng,
            0.1,
        )
        .unwrap()
    }

    #[test]
    fn certain_cooperation_forms_alliance() {
        let interaction = InteractionConfig {
            alliance_probability: 1.0,
            ..InteractionConfig::default()
        };
        let mut clans = vec![
            clan(1, ClanStrategy::Cooperative, 10.0, 10, 80.0),
            clan(2, ClanStrategy::Cooperative, 12.5, 10, 80.0),
        ];
        clans[0].declare_enemy(ClanId::new(2));
        let report = run(&mut clans, &interaction, 1);
        assert_eq!(report.alliances, 1);
        assert!(clans[0].allies.contains(&ClanId::new(2)));
        assert!(clans[1].allies.contains(&ClanId::new(1)));
        assert!(clans[0].enemies.is_empty());
        // Bonus: 2 * (1 - 2.5 / 5) * 0.1 = 0.1
        assert!((clans[0].morale - 50.1).abs() < 1e-9);
    }

    #[test]
    fn aggression_in_melee_range_fights() {
        let mut clans = vec![
            clan(1, ClanStrategy::Aggressive, 10.0, 20, 100.0),
            clan(2, ClanStrategy::Cooperative, 11.0, 10, 100.0),
        ];
        clans[1].ally_with(ClanId::new(1));
        clans[0].ally_with(ClanId::new(2));
        let report = run(&mut clans, &InteractionConfig::default(), 3);
        assert_eq!(report.combats, 1);
        for (me, other) in [(0, 2), (1, 1)] {
            let c = &clans[me];
            assert!(c.enemies.contains(&ClanId::new(other)));
            assert!(!c.allies.contains(&ClanId::new(other)));
            assert!((c.energy - 98.0).abs() < 1e-9);
        }
        let losses = clans[0].pending_losses + clans[1].pending_losses;
        assert!((losses - 0.5).abs() < 1e-9);
    }

    #[test]
    fn aggression_out_of_melee_range_does_nothing() {
        let mut clans = vec![
            clan(1, ClanStrategy::Aggressive, 10.0, 20, 100.0),
            clan(2, ClanStrategy::Defensive, 13.0, 10, 100.0),
        ];
        let report = run(&mut clans, &InteractionConfig::default(), 3);
        assert!(report.events.is_empty());
        assert!(clans[0].enemies.is_empty());
    }

    #[test]
    fn competition_hurts_the_weaker_side_more() {
        let mut clans = vec![
            clan(1, ClanStrategy::Defensive, 10.0, 30, 100.0),
            clan(2, ClanStrategy::Exploratory, 11.0, 10, 100.0),
        ];
        let report = run(&mut clans, &InteractionConfig::default(), 5);
        assert_eq!(report.competitions, 1);
        let loss_strong = 100.0 - clans[0].energy;
        let loss_weak = 100.0 - clans[1].energy;
        assert!(loss_weak > loss_strong);
        assert!((loss_weak + loss_strong - 0.2).abs() < 1e-9);
        assert_eq!(clans[0].size, 30);
    }

    #[test]
    fn distant_pairs_are_ignored() {
        let mut clans = vec![
            clan(1, ClanStrategy::Aggressive, 2.0, 10, 100.0),
            clan(2, ClanStrategy::Aggressive, 20.0, 10, 100.0),
        ];
        let report = run(&mut clans, &InteractionConfig::default(), 9);
        assert_eq!(report, InteractionReport::default());
    }
}
