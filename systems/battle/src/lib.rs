#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round driver that runs a battle to completion and tallies the score.
//!
//! Each round orders the living units in reading order and lets every one of
//! them act through the combat system, applying the emitted commands to the
//! world before the next unit moves. The first unit that finds no enemy ends
//! the battle; that round does not count.

mod search;

use cavern_skirmish_core::{BattleConfig, Command, Event, Faction, UnitId};
use cavern_skirmish_system_combat::{Combat, TurnOutcome};
use cavern_skirmish_world::{self as world, query, CavernMap, World};

pub use search::{minimum_flawless_power, PowerSearch};

/// Lifecycle of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattleState {
    /// Rounds are still being played.
    InProgress,
    /// The battle has finished and fallen units were purged.
    Ended,
}

/// Number of fallen units per faction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Casualties {
    elves: u32,
    goblins: u32,
}

impl Casualties {
    /// Fallen units of the provided faction.
    #[must_use]
    pub const fn of(&self, faction: Faction) -> u32 {
        match faction {
            Faction::Elf => self.elves,
            Faction::Goblin => self.goblins,
        }
    }

    fn record(&mut self, faction: Faction) {
        let counter = match faction {
            Faction::Elf => &mut self.elves,
            Faction::Goblin => &mut self.goblins,
        };
        *counter += 1;
    }
}

/// Final tally of a finished battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BattleOutcome {
    /// Rounds in which every living unit got its turn.
    pub rounds: u32,
    /// Hit points left across all surviving units.
    pub remaining_health: u64,
    /// `rounds * remaining_health`.
    pub score: u64,
    /// The only faction left standing, if the battle was fought to the end.
    pub winner: Option<Faction>,
    /// Units lost by each faction.
    pub casualties: Casualties,
}

/// Owns the world and the combat system for one battle.
#[derive(Debug)]
pub struct Battle {
    world: World,
    combat: Combat,
    completed_rounds: u32,
    state: BattleState,
    casualties: Casualties,
    halt_on_casualty: Option<Faction>,
    commands: Vec<Command>,
    journal: Vec<Event>,
}

impl Battle {
    /// Prepares a battle on the provided map.
    #[must_use]
    pub fn new(map: &CavernMap, config: &BattleConfig) -> Self {
        Self::from_world(World::new(map, config))
    }

    /// Prepares a battle from an existing world state.
    #[must_use]
    pub fn from_world(world: World) -> Self {
        Self {
            world,
            combat: Combat::new(),
            completed_rounds: 0,
            state: BattleState::InProgress,
            casualties: Casualties::default(),
            halt_on_casualty: None,
            commands: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// Stops the battle as soon as any unit of `faction` falls.
    #[must_use]
    pub fn halt_when_fallen(mut self, faction: Faction) -> Self {
        self.halt_on_casualty = Some(faction);
        self
    }

    /// Plays one round.
    ///
    /// Returns `false` when fewer than two factions are left standing, or
    /// when a unit found no enemy (or a halting casualty occurred) before
    /// every living unit had its turn; the round is then abandoned and must
    /// not be counted.
    pub fn process_turn(&mut self) -> bool {
        if self.state == BattleState::Ended {
            return false;
        }

        // Nobody can find an enemy, possibly because nobody is left to look.
        if query::living_factions(&self.world).len() < 2 {
            log::debug!(
                "no opposing factions remain before round {}",
                self.completed_rounds + 1
            );
            return false;
        }

        let order: Vec<UnitId> = query::unit_view(&self.world)
            .iter()
            .filter(|unit| unit.is_alive())
            .map(|unit| unit.id)
            .collect();

        for id in order {
            let Some(actor) = query::unit(&self.world, id) else {
                continue;
            };
            if !actor.is_alive() {
                continue;
            }

            let roster = query::unit_view(&self.world);
            let state = &self.world;
            self.commands.clear();
            let outcome = self.combat.take_turn(
                &actor,
                &roster,
                query::occupancy_view(state),
                |origin| query::distance_field(state, origin),
                &mut self.commands,
            );

            if outcome == TurnOutcome::EndOfBattle {
                log::debug!(
                    "{}{} finds no enemies during round {}",
                    actor.faction.token(),
                    id.get(),
                    self.completed_rounds + 1
                );
                return false;
            }

            let first_event = self.journal.len();
            for command in self.commands.drain(..) {
                world::apply(&mut self.world, command, &mut self.journal);
            }
            debug_assert!(query::occupancy_consistent(&self.world));

            let mut halted = false;
            for event in &self.journal[first_event..] {
                if let Event::UnitDied { faction, .. } = event {
                    self.casualties.record(*faction);
                    halted |= self.halt_on_casualty == Some(*faction);
                }
            }
            if halted {
                log::debug!(
                    "halting during round {}: a protected unit fell",
                    self.completed_rounds + 1
                );
                return false;
            }
        }

        true
    }

    /// Plays rounds until the battle ends and returns the final tally.
    ///
    /// Calling it again on an ended battle returns the same outcome.
    pub fn run_simulation(&mut self) -> BattleOutcome {
        while self.process_turn() {
            self.completed_rounds += 1;
            log::debug!(
                "round {} complete, {} hit points remain",
                self.completed_rounds,
                query::remaining_health(&self.world)
            );
            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "after round {}:\n{}",
                    self.completed_rounds,
                    query::render(&self.world)
                );
            }
        }

        if self.state == BattleState::InProgress {
            self.state = BattleState::Ended;
            world::apply(&mut self.world, Command::ClearFallen, &mut self.journal);
            log::info!(
                "battle ended after {} full rounds with {} hit points left",
                self.completed_rounds,
                query::remaining_health(&self.world)
            );
        }

        self.outcome()
    }

    /// Tally of the battle as it currently stands.
    #[must_use]
    pub fn outcome(&self) -> BattleOutcome {
        let living = query::living_factions(&self.world);
        BattleOutcome {
            rounds: self.completed_rounds,
            remaining_health: query::remaining_health(&self.world),
            score: self.score(),
            winner: match living.as_slice() {
                [faction] => Some(*faction),
                _ => None,
            },
            casualties: self.casualties,
        }
    }

    /// Completed rounds multiplied by the hit points left standing.
    #[must_use]
    pub fn score(&self) -> u64 {
        u64::from(self.completed_rounds) * query::remaining_health(&self.world)
    }

    /// Rounds in which every living unit got its turn.
    #[must_use]
    pub fn completed_rounds(&self) -> u32 {
        self.completed_rounds
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BattleState {
        self.state
    }

    /// Read-only access to the world the battle is fought in.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Every event the world reported so far, in order.
    #[must_use]
    pub fn journal(&self) -> &[Event] {
        &self.journal
    }
}
