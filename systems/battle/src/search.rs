//! Search for the weakest elf attack power that wins without losses.

use cavern_skirmish_core::{BattleConfig, Faction};
use cavern_skirmish_world::CavernMap;

use crate::{Battle, BattleOutcome};

/// Result of a successful attack power search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerSearch {
    /// Lowest elf attack power that wins without a single elf falling.
    pub attack_power: u32,
    /// Outcome of the battle fought at that power.
    pub outcome: BattleOutcome,
}

/// Raises the elves' attack power one point at a time, starting just above
/// the configured value, until they win with every elf alive.
///
/// Each attempt stops the moment an elf falls. Once the power reaches the
/// goblins' hit points every blow is lethal, so higher powers cannot change
/// the battle and the search gives up with `None`.
#[must_use]
pub fn minimum_flawless_power(map: &CavernMap, config: &BattleConfig) -> Option<PowerSearch> {
    let start = config.elves.attack_power.saturating_add(1);
    let ceiling = config.goblins.hit_points.max(start);

    for attack_power in start..=ceiling {
        let attempt = config.with_attack_power(Faction::Elf, attack_power);
        let mut battle = Battle::new(map, &attempt).halt_when_fallen(Faction::Elf);
        let outcome = battle.run_simulation();

        if outcome.casualties.of(Faction::Elf) == 0 && outcome.winner == Some(Faction::Elf) {
            log::info!("elves win without losses at attack power {attack_power}");
            return Some(PowerSearch {
                attack_power,
                outcome,
            });
        }

        log::debug!("elf attack power {attack_power} is not enough");
    }

    None
}
