#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state for the cavern skirmish engine.
//!
//! The world owns the static terrain, the occupancy grid and the unit
//! roster. [`apply`] is the only way to mutate it; everything else reads
//! through the [`query`] module.

mod navigation;
mod parse;

use cavern_skirmish_core::{
    BattleConfig, CellCoord, Command, Event, Faction, Health, Tile, UnitId, UnitSnapshot,
};

pub use navigation::DistanceField;
pub use parse::{CavernMap, ParseError, Placement};

/// Represents the authoritative battle state.
#[derive(Clone, Debug)]
pub struct World {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
    units: Vec<Unit>,
    occupancy: OccupancyGrid,
}

impl World {
    /// Creates a world from a parsed map, equipping units per `config`.
    ///
    /// Unit identifiers are allocated in reading order of the starting
    /// placements.
    #[must_use]
    pub fn new(map: &CavernMap, config: &BattleConfig) -> Self {
        let units: Vec<Unit> = (0u32..)
            .zip(map.placements())
            .map(|(id, placement)| {
                let stats = config.stats(placement.faction);
                Unit {
                    id: UnitId::new(id),
                    faction: placement.faction,
                    cell: placement.cell,
                    health: Health::new(stats.hit_points),
                    attack_power: stats.attack_power,
                }
            })
            .collect();

        let mut occupancy = OccupancyGrid::new(map.columns(), map.rows());
        for unit in units.iter().filter(|unit| unit.health.is_alive()) {
            occupancy.occupy(unit.id, unit.cell);
        }

        Self {
            columns: map.columns(),
            rows: map.rows(),
            tiles: map.tiles().to_vec(),
            units,
            occupancy,
        }
    }

    fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.units.binary_search_by_key(&id, |unit| unit.id).ok()
    }

    fn tile(&self, cell: CellCoord) -> Option<Tile> {
        self.occupancy
            .index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    fn is_traversable(&self, cell: CellCoord) -> bool {
        self.tile(cell) == Some(Tile::Open) && self.occupancy.occupant(cell).is_none()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// # Panics
///
/// Commands that would break the world's invariants (stepping onto a wall or
/// an occupied cell, moving more than one cell, acting while fallen,
/// attacking an ally or a distant unit) indicate a bug in the issuing system
/// and abort immediately.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MoveUnit { unit, to } => {
            let Some(index) = world.unit_index(unit) else {
                panic!("move issued for unknown unit {}", unit.get());
            };
            let from = world.units[index].cell;

            assert!(
                world.units[index].health.is_alive(),
                "fallen unit {} cannot move",
                unit.get()
            );
            assert!(
                from.is_adjacent(to),
                "unit {} cannot move from {from:?} to non-adjacent {to:?}",
                unit.get()
            );
            assert!(
                world.is_traversable(to),
                "unit {} cannot move onto blocked cell {to:?}",
                unit.get()
            );

            world.occupancy.vacate(unit, from);
            world.occupancy.occupy(unit, to);
            world.units[index].cell = to;
            out_events.push(Event::UnitMoved { unit, from, to });
        }
        Command::Attack { attacker, target } => {
            let (Some(attacker_index), Some(target_index)) =
                (world.unit_index(attacker), world.unit_index(target))
            else {
                panic!(
                    "attack issued between unknown units {} and {}",
                    attacker.get(),
                    target.get()
                );
            };
            let striker = world.units[attacker_index];
            let victim = &mut world.units[target_index];

            assert!(
                striker.health.is_alive() && victim.health.is_alive(),
                "attack between {} and {} involves a fallen unit",
                attacker.get(),
                target.get()
            );
            assert_ne!(
                striker.faction,
                victim.faction,
                "unit {} cannot attack ally {}",
                attacker.get(),
                target.get()
            );
            assert!(
                striker.cell.is_adjacent(victim.cell),
                "unit {} is not adjacent to {}",
                attacker.get(),
                target.get()
            );

            victim.health = victim.health.damaged(striker.attack_power);
            let remaining = victim.health;
            let faction = victim.faction;
            let cell = victim.cell;
            out_events.push(Event::UnitAttacked {
                attacker,
                target,
                damage: striker.attack_power,
                remaining,
            });

            if !remaining.is_alive() {
                world.occupancy.vacate(target, cell);
                log::trace!(
                    "{}{} fell at ({}, {})",
                    faction.token(),
                    target.get(),
                    cell.column(),
                    cell.row()
                );
                out_events.push(Event::UnitDied {
                    unit: target,
                    faction,
                    cell,
                });
            }
        }
        Command::ClearFallen => {
            let before = world.units.len();
            world.units.retain(|unit| unit.health.is_alive());
            out_events.push(Event::FallenCleared {
                removed: before - world.units.len(),
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::fmt::Write as _;

    use super::{DistanceField, OccupancyGrid, World};
    use cavern_skirmish_core::{CellCoord, Faction, Tile, UnitId, UnitSnapshot, UnitView};

    /// Captures a read-only view of every unit, fallen ones included.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Snapshot of a single unit, if it is still on the roster.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<UnitSnapshot> {
        world
            .unit_index(id)
            .map(|index| world.units[index].snapshot())
    }

    /// Exposes a read-only view of terrain and occupancy.
    ///
    /// Cells outside the grid are not an error here: they read as having no
    /// tile and no occupant, so a map without a wall border stays walkable
    /// only within its bounds. Commands that touch such cells still panic in
    /// [`apply`](crate::apply).
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView { world }
    }

    /// Builds a distance field from `origin` over the current grid.
    ///
    /// Walls and every occupied cell other than the origin are impassable.
    #[must_use]
    pub fn distance_field(world: &World, origin: CellCoord) -> DistanceField {
        DistanceField::build(world.columns, world.rows, origin, |cell| {
            !world.is_traversable(cell)
        })
    }

    /// Sum of the hit points of every living unit.
    #[must_use]
    pub fn remaining_health(world: &World) -> u64 {
        world
            .units
            .iter()
            .filter(|unit| unit.health.is_alive())
            .map(|unit| u64::from(unit.health.get()))
            .sum()
    }

    /// Factions that still have at least one living unit, in stable order.
    #[must_use]
    pub fn living_factions(world: &World) -> Vec<Faction> {
        Faction::ALL
            .into_iter()
            .filter(|faction| {
                world
                    .units
                    .iter()
                    .any(|unit| unit.faction == *faction && unit.health.is_alive())
            })
            .collect()
    }

    /// Checks that occupied cells and living units correspond one to one.
    #[must_use]
    pub fn occupancy_consistent(world: &World) -> bool {
        let living = world
            .units
            .iter()
            .filter(|unit| unit.health.is_alive())
            .all(|unit| {
                world.tile(unit.cell) == Some(Tile::Open)
                    && world.occupancy.occupant(unit.cell) == Some(unit.id)
            });
        let occupied = world.occupancy.occupied_count();
        let alive = world
            .units
            .iter()
            .filter(|unit| unit.health.is_alive())
            .count();

        living && occupied == alive
    }

    /// Draws the map with a per-row list of the units on it.
    ///
    /// Each row is followed by the units standing in it, formatted as
    /// `G(200), E(197)` in column order.
    #[must_use]
    pub fn render(world: &World) -> String {
        let view = occupancy_view(world);
        let mut out = String::new();

        for row in 0..world.rows {
            let mut annotations = Vec::new();
            for column in 0..world.columns {
                let cell = CellCoord::new(column, row);
                let glyph = match view.occupant(cell).and_then(|id| unit(world, id)) {
                    Some(snapshot) => {
                        annotations.push(format!(
                            "{}({})",
                            snapshot.faction.token(),
                            snapshot.health.get()
                        ));
                        snapshot.faction.token()
                    }
                    None if view.tile(cell) == Some(Tile::Open) => '.',
                    None => '#',
                };
                out.push(glyph);
            }
            if !annotations.is_empty() {
                let _ = write!(out, "   {}", annotations.join(", "));
            }
            out.push('\n');
        }

        out
    }

    /// Read-only view into terrain and the dense occupancy grid.
    #[derive(Clone, Copy, Debug)]
    pub struct OccupancyView<'a> {
        world: &'a World,
    }

    impl<'a> OccupancyView<'a> {
        /// Returns the living unit standing on the provided cell, if any.
        #[must_use]
        pub fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
            self.grid().occupant(cell)
        }

        /// Terrain of the provided cell, or `None` outside the map.
        #[must_use]
        pub fn tile(&self, cell: CellCoord) -> Option<Tile> {
            self.world.tile(cell)
        }

        /// Reports whether the cell is open floor with nobody standing on it.
        #[must_use]
        pub fn is_open(&self, cell: CellCoord) -> bool {
            self.world.is_traversable(cell)
        }

        fn grid(&self) -> &'a OccupancyGrid {
            &self.world.occupancy
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Unit {
    id: UnitId,
    faction: Faction,
    cell: CellCoord,
    health: Health,
    attack_power: u32,
}

impl Unit {
    fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            faction: self.faction,
            cell: self.cell,
            health: self.health,
            attack_power: self.attack_power,
        }
    }
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<UnitId>>,
}

impl OccupancyGrid {
    fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, unit: UnitId, cell: CellCoord) {
        let Some(index) = self.index(cell) else {
            panic!("unit {} placed outside the grid at {cell:?}", unit.get());
        };
        let slot = &mut self.cells[index];
        assert!(
            slot.is_none(),
            "unit {} placed on occupied cell {cell:?}",
            unit.get()
        );
        *slot = Some(unit);
    }

    fn vacate(&mut self, unit: UnitId, cell: CellCoord) {
        let Some(index) = self.index(cell) else {
            panic!("unit {} vacated a cell outside the grid", unit.get());
        };
        let slot = &mut self.cells[index];
        assert_eq!(
            *slot,
            Some(unit),
            "grid disagrees with the recorded position of unit {}",
            unit.get()
        );
        *slot = None;
    }

    fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|slot| slot.is_some()).count()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: &str = "\
#######
#E.G..#
#.#...#
#######
";

    fn world_from(map: &str) -> World {
        let map = CavernMap::parse(map).expect("valid map");
        World::new(&map, &BattleConfig::default())
    }

    #[test]
    fn units_are_numbered_in_reading_order() {
        let world = world_from("#####\n#G.E#\n#E..#\n#####\n");
        let view = query::unit_view(&world);
        let ids: Vec<_> = view.iter().map(|unit| unit.id.get()).collect();
        let tokens: Vec<_> = view.iter().map(|unit| unit.faction.token()).collect();

        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(tokens, vec!['G', 'E', 'E']);
        assert!(query::occupancy_consistent(&world));
    }

    #[test]
    fn config_sets_starting_stats() {
        let map = CavernMap::parse(DUEL).expect("valid map");
        let config = BattleConfig::default().with_attack_power(Faction::Elf, 20);
        let world = World::new(&map, &config);

        let elf = query::unit(&world, UnitId::new(0)).expect("elf");
        let goblin = query::unit(&world, UnitId::new(1)).expect("goblin");
        assert_eq!(elf.attack_power, 20);
        assert_eq!(goblin.attack_power, 3);
        assert_eq!(elf.health, Health::new(200));
        assert_eq!(query::remaining_health(&world), 400);
    }

    #[test]
    fn move_updates_grid_and_unit() {
        let mut world = world_from(DUEL);
        let mut events = Vec::new();
        let elf = UnitId::new(0);

        apply(
            &mut world,
            Command::MoveUnit {
                unit: elf,
                to: CellCoord::new(2, 1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UnitMoved {
                unit: elf,
                from: CellCoord::new(1, 1),
                to: CellCoord::new(2, 1),
            }]
        );
        let view = query::occupancy_view(&world);
        assert!(view.is_open(CellCoord::new(1, 1)));
        assert_eq!(view.occupant(CellCoord::new(2, 1)), Some(elf));
        assert!(query::occupancy_consistent(&world));
    }

    #[test]
    #[should_panic(expected = "blocked cell")]
    fn moving_onto_an_occupied_cell_panics() {
        let mut world = world_from("#####\n#EG.#\n#####\n");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                to: CellCoord::new(2, 1),
            },
            &mut events,
        );
    }

    #[test]
    #[should_panic(expected = "non-adjacent")]
    fn moving_two_cells_panics() {
        let mut world = world_from(DUEL);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveUnit {
                unit: UnitId::new(0),
                to: CellCoord::new(1, 3),
            },
            &mut events,
        );
    }

    #[test]
    fn lethal_attack_frees_the_cell() {
        let map = CavernMap::parse("#####\n#EG.#\n#####\n").expect("valid map");
        let config = BattleConfig::default().with_attack_power(Faction::Elf, 200);
        let mut world = World::new(&map, &config);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(0),
                target: UnitId::new(1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::UnitAttacked {
                    attacker: UnitId::new(0),
                    target: UnitId::new(1),
                    damage: 200,
                    remaining: Health::new(0),
                },
                Event::UnitDied {
                    unit: UnitId::new(1),
                    faction: Faction::Goblin,
                    cell: CellCoord::new(2, 1),
                },
            ]
        );
        assert!(query::occupancy_view(&world).is_open(CellCoord::new(2, 1)));
        assert!(query::occupancy_consistent(&world));
        assert_eq!(query::living_factions(&world), vec![Faction::Elf]);

        events.clear();
        apply(&mut world, Command::ClearFallen, &mut events);
        assert_eq!(events, vec![Event::FallenCleared { removed: 1 }]);
        assert_eq!(query::unit_view(&world).iter().count(), 1);
        assert_eq!(query::unit(&world, UnitId::new(1)), None);
    }

    #[test]
    #[should_panic(expected = "cannot attack ally")]
    fn attacking_an_ally_panics() {
        let mut world = world_from("#####\n#EE.#\n#####\n");
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(0),
                target: UnitId::new(1),
            },
            &mut events,
        );
    }

    #[test]
    fn distance_field_treats_units_as_obstacles() {
        let world = world_from("######\n#E.G.#\n#....#\n######\n");
        let field = query::distance_field(&world, CellCoord::new(1, 1));

        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(0));
        assert_eq!(field.distance(CellCoord::new(3, 1)), None);
        assert_eq!(field.distance(CellCoord::new(4, 1)), Some(5));
        assert_eq!(field.distance(CellCoord::new(0, 0)), None);
    }

    #[test]
    fn render_annotates_rows_with_health() {
        let world = world_from(DUEL);
        assert_eq!(
            query::render(&world),
            "#######\n#E.G..#   E(200), G(200)\n#.#...#\n#######\n"
        );
    }
}
