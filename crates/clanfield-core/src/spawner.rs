//! Building the initial clan roster.
//!
//! An explicit roster in the config is used as given. Otherwise
//! `initial_count` clans are scattered uniformly over the grid with sizes
//! drawn from `[min_size, max_size]` and strategies drawn by weight.

use clanfield_agents::{BehaviorConfig, Clan, ClanSeed};
use clanfield_types::{ClanId, ClanStrategy};
use clanfield_world::{GridDims, Position, RandomSource, WorldError};
use tracing::debug;

use crate::config::ClanConfig;

/// Create the starting clans.
///
/// # Errors
///
/// Returns [`WorldError`] if a random draw rejects its bounds.
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn spawn_clans(
    config: &ClanConfig,
    dims: GridDims,
    behavior: &BehaviorConfig,
    rng: &mut RandomSource,
) -> Result<Vec<Clan>, WorldError> {
    if !config.explicit.is_empty() {
        return Ok(config
            .explicit
            .iter()
            .map(|spec| {
                let [x, y] = spec.position;
                Clan::new(
                    spec.id,
                    ClanSeed {
                        size: spec.size,
                        position: Position::new(x, y),
                        strategy: spec.strategy,
                        energy: spec.energy.unwrap_or(config.initial_energy),
                        morale: spec.morale.unwrap_or(config.initial_morale),
                        params: spec.params.apply(&config.defaults),
                    },
                    dims,
                    behavior,
                )
            })
            .collect());
    }

    let min = size_bound(config.min_size)?;
    let max = size_bound(config.max_size)?;
    let weights = config.strategy_weights.as_array();
    let mut clans = Vec::with_capacity(usize::try_from(config.initial_count).unwrap_or(0));
    for n in 1..=config.initial_count {
        let x = rng.uniform(0.0, dims.width() as f64)?;
        let y = rng.uniform(0.0, dims.height() as f64)?;
        let size = rng.int_range(min, max)?.max(0) as u64;
        let strategy = ClanStrategy::ALL
            .get(rng.weighted_index(&weights)?)
            .copied()
            .unwrap_or(ClanStrategy::Cooperative);
        debug!(clan_id = n, size, %strategy, x, y, "spawned clan");
        clans.push(Clan::new(
            ClanId::new(n),
            ClanSeed {
                size,
                position: Position::new(x, y),
                strategy,
                energy: config.initial_energy,
                morale: config.initial_morale,
                params: config.defaults,
            },
            dims,
            behavior,
        ));
    }
    Ok(clans)
}

fn size_bound(size: u64) -> Result<i64, WorldError> {
    i64::try_from(size).map_err(|e| WorldError::invalid_argument(format!("clan size bound {size}: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clanfield_agents::ParameterOverrides;

    use super::*;
    use crate::config::ExplicitClan;

    #[test]
    fn random_roster_respects_bounds() {
        let dims = GridDims::new(30, 20).unwrap();
        let config = ClanConfig {
            initial_count: 12,
            min_size: 4,
            max_size: 6,
            ..ClanConfig::default()
        };
        let mut rng = RandomSource::seeded(11);
        let clans = spawn_clans(&config, dims, &BehaviorConfig::default(), &mut rng).unwrap();
        assert_eq!(clans.len(), 12);
        for (i, clan) in clans.iter().enumerate() {
            assert_eq!(clan.id, ClanId::new(u32::try_from(i + 1).unwrap()));
            assert!((4..=6).contains(&clan.size));
            assert!(clan.position.x < 30.0 && clan.position.y < 20.0);
        }
    }

    #[test]
    fn explicit_roster_is_used_verbatim() {
        let dims = GridDims::new(10, 10).unwrap();
        let config = ClanConfig {
            explicit: vec![ExplicitClan {
                id: ClanId::new(7),
                size: 3,
                position: [12.0, -1.0],
                strategy: ClanStrategy::Aggressive,
                energy: Some(40.0),
                morale: None,
                params: ParameterOverrides {
                    birth_rate: Some(0.5),
                    ..ParameterOverrides::default()
                },
            }],
            ..ClanConfig::default()
        };
        let mut rng = RandomSource::seeded(0);
        let clans = spawn_clans(&config, dims, &BehaviorConfig::default(), &mut rng).unwrap();
        let clan = clans.first().unwrap();
        assert_eq!(clan.id, ClanId::new(7));
        assert!((clan.position.x - 2.0).abs() < 1e-12);
        assert!((clan.position.y - 9.0).abs() < 1e-12);
        assert!((clan.energy - 40.0).abs() < f64::EPSILON);
        assert!((clan.morale - 100.0).abs() < f64::EPSILON);
        assert!((clan.params.birth_rate - 0.5).abs() < f64::EPSILON);
    }
}
