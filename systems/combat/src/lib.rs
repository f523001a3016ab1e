#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides a single unit's turn.
//!
//! A turn never mutates the world. The system reads the roster and the
//! occupancy grid, asks the caller for distance fields rooted at whatever
//! cells it needs, and emits at most one `MoveUnit` followed by at most one
//! `Attack` command.

use cavern_skirmish_core::{CellCoord, Command, Faction, UnitId, UnitSnapshot, UnitView};
use cavern_skirmish_world::{query::OccupancyView, DistanceField};

/// Result of asking a unit to take its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The unit moved, attacked, or both.
    Acted,
    /// The unit had enemies but could neither reach nor strike any of them.
    Idle,
    /// No living enemy remains; the battle is over.
    EndOfBattle,
}

/// Combat system that reuses a scratch buffer between turns.
#[derive(Debug, Default)]
pub struct Combat {
    in_range: Vec<CellCoord>,
}

impl Combat {
    /// Creates a new combat system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans the turn of `actor` and appends the resulting commands to `out`.
    ///
    /// `distance_field` must return a field built over the current grid, with
    /// every occupied cell other than the origin treated as impassable.
    pub fn take_turn<F>(
        &mut self,
        actor: &UnitSnapshot,
        roster: &UnitView,
        occupancy: OccupancyView<'_>,
        mut distance_field: F,
        out: &mut Vec<Command>,
    ) -> TurnOutcome
    where
        F: FnMut(CellCoord) -> DistanceField,
    {
        if !actor.is_alive() {
            return TurnOutcome::Idle;
        }

        if roster.living_enemies_of(actor.faction).next().is_none() {
            return TurnOutcome::EndOfBattle;
        }

        if let Some(target) = select_victim(actor.cell, actor.faction, roster) {
            out.push(Command::Attack {
                attacker: actor.id,
                target,
            });
            return TurnOutcome::Acted;
        }

        let Some(step) = self.plan_step(actor, roster, occupancy, &mut distance_field) else {
            log::trace!("unit {} has no reachable enemy", actor.id.get());
            return TurnOutcome::Idle;
        };

        out.push(Command::MoveUnit {
            unit: actor.id,
            to: step,
        });

        if let Some(target) = select_victim(step, actor.faction, roster) {
            out.push(Command::Attack {
                attacker: actor.id,
                target,
            });
        }

        TurnOutcome::Acted
    }

    fn plan_step<F>(
        &mut self,
        actor: &UnitSnapshot,
        roster: &UnitView,
        occupancy: OccupancyView<'_>,
        distance_field: &mut F,
    ) -> Option<CellCoord>
    where
        F: FnMut(CellCoord) -> DistanceField,
    {
        self.in_range.clear();
        for enemy in roster.living_enemies_of(actor.faction) {
            self.in_range.extend(
                enemy
                    .cell
                    .neighbors()
                    .filter(|cell| occupancy.is_open(*cell)),
            );
        }
        if self.in_range.is_empty() {
            return None;
        }

        let from_actor = distance_field(actor.cell);
        let (distance, destination) = self
            .in_range
            .iter()
            .filter_map(|cell| from_actor.distance(*cell).map(|distance| (distance, *cell)))
            .min()?;

        let toward_destination = distance_field(destination);
        let (_, step) = actor
            .cell
            .neighbors()
            .filter(|cell| occupancy.is_open(*cell))
            .filter_map(|cell| {
                toward_destination
                    .distance(cell)
                    .map(|remaining| (remaining, cell))
            })
            .min()?;

        log::trace!(
            "unit {} heads for ({}, {}) {} steps away via ({}, {})",
            actor.id.get(),
            destination.column(),
            destination.row(),
            distance,
            step.column(),
            step.row()
        );

        Some(step)
    }
}

/// Picks the adjacent living enemy with the fewest hit points.
///
/// Ties resolve in reading order of the enemies' cells.
fn select_victim(cell: CellCoord, faction: Faction, roster: &UnitView) -> Option<UnitId> {
    roster
        .living_enemies_of(faction)
        .filter(|enemy| enemy.cell.is_adjacent(cell))
        .min_by_key(|enemy| (enemy.health, enemy.cell))
        .map(|enemy| enemy.id)
}
