//! Battle configuration assembled from an optional TOML file and flags.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use cavern_skirmish_core::{BattleConfig, Faction};

/// Values given on the command line that take precedence over the file.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) hit_points: Option<u32>,
    pub(crate) elf_power: Option<u32>,
    pub(crate) goblin_power: Option<u32>,
}

/// Loads the configuration file, if any, and applies the overrides.
pub(crate) fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<BattleConfig> {
    let base = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            parse(&contents)
                .with_context(|| format!("failed to parse config at {}", path.display()))?
        }
        None => BattleConfig::default(),
    };

    Ok(apply_overrides(base, overrides))
}

fn parse(contents: &str) -> Result<BattleConfig> {
    toml::from_str(contents).context("invalid battle config toml")
}

fn apply_overrides(mut config: BattleConfig, overrides: Overrides) -> BattleConfig {
    if let Some(hit_points) = overrides.hit_points {
        for faction in Faction::ALL {
            config.stats_mut(faction).hit_points = hit_points;
        }
    }
    if let Some(power) = overrides.elf_power {
        config = config.with_attack_power(Faction::Elf, power);
    }
    if let Some(power) = overrides.goblin_power {
        config = config.with_attack_power(Faction::Goblin, power);
    }
    config
}
