#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that fights a cavern battle and prints its score.

mod config;

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use cavern_skirmish_system_battle::{minimum_flawless_power, Battle};
use cavern_skirmish_world::CavernMap;
use clap::Parser;

/// Simulates a battle between elves and goblins and prints the outcome score.
#[derive(Debug, Parser)]
#[command(name = "cavern-skirmish", version)]
struct Cli {
    /// Map to read; standard input is used when omitted or `-`.
    input: Option<PathBuf>,
    /// TOML file with per-faction `hit_points` and `attack_power`.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Starting hit points for every unit.
    #[arg(long, value_name = "HP")]
    hit_points: Option<u32>,
    /// Attack power of every elf.
    #[arg(long, value_name = "POWER")]
    elf_power: Option<u32>,
    /// Attack power of every goblin.
    #[arg(long, value_name = "POWER")]
    goblin_power: Option<u32>,
    /// Also print the score of the weakest elf power that wins without losses.
    #[arg(long)]
    search_elf_power: bool,
}

/// Entry point for the cavern skirmish command-line interface.
fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let text = read_input(cli.input.as_deref())?;
    let map = CavernMap::parse(&text).context("failed to parse battle map")?;
    let config = config::resolve(
        cli.config.as_deref(),
        config::Overrides {
            hit_points: cli.hit_points,
            elf_power: cli.elf_power,
            goblin_power: cli.goblin_power,
        },
    )?;
    log::info!(
        "loaded {}x{} map with {} units",
        map.columns(),
        map.rows(),
        map.placements().len()
    );
    log::debug!("{config:?}");

    let mut battle = Battle::new(&map, &config);
    let outcome = battle.run_simulation();
    log::info!(
        "{} full rounds, {} hit points left, winner {:?}",
        outcome.rounds,
        outcome.remaining_health,
        outcome.winner
    );
    println!("{}", outcome.score);

    if cli.search_elf_power {
        let Some(found) = minimum_flawless_power(&map, &config) else {
            eprintln!("no elf attack power wins without losses");
            return Ok(ExitCode::FAILURE);
        };
        log::info!(
            "elf attack power {} wins after {} full rounds",
            found.attack_power,
            found.outcome.rounds
        );
        println!("{}", found.outcome.score);
    }

    Ok(ExitCode::SUCCESS)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read map at {}", path.display())),
        _ => {
            let mut text = String::new();
            let _ = io::stdin()
                .read_to_string(&mut text)
                .context("failed to read map from standard input")?;
            Ok(text)
        }
    }
}
