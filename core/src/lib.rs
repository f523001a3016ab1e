#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the cavern skirmish engine.
//!
//! This crate defines the message surface that connects the authoritative
//! world, the pure combat system and the round driver. Systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing what happened. Systems never mutate state directly; they read
//! immutable snapshots such as [`UnitView`] and respond with new commands.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Hit points every unit starts with unless configured otherwise.
pub const DEFAULT_HIT_POINTS: u32 = 200;

/// Damage dealt per attack unless configured otherwise.
pub const DEFAULT_ATTACK_POWER: u32 = 3;

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Cells are ordered in reading order: top to bottom, then left to right.
/// Every tie-break in the simulation relies on this ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Reports whether the two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Orthogonal neighbours in the order up, left, right, down.
    ///
    /// That order coincides with reading order, so the first neighbour that
    /// satisfies a predicate is also the reading-order winner. Neighbours that
    /// would underflow or overflow the coordinate space are skipped; grid
    /// bounds are the caller's concern.
    pub fn neighbors(self) -> impl Iterator<Item = CellCoord> {
        let up = self
            .row
            .checked_sub(1)
            .map(|row| CellCoord::new(self.column, row));
        let left = self
            .column
            .checked_sub(1)
            .map(|column| CellCoord::new(column, self.row));
        let right = self
            .column
            .checked_add(1)
            .map(|column| CellCoord::new(column, self.row));
        let down = self
            .row
            .checked_add(1)
            .map(|row| CellCoord::new(self.column, row));

        [up, left, right, down].into_iter().flatten()
    }
}

impl Ord for CellCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for CellCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The two sides of the battle. Both follow identical rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Units drawn as `E` on the map.
    Elf,
    /// Units drawn as `G` on the map.
    Goblin,
}

impl Faction {
    /// Both factions in a stable order.
    pub const ALL: [Faction; 2] = [Faction::Elf, Faction::Goblin];

    /// Resolves a map glyph into the faction it denotes.
    #[must_use]
    pub const fn from_token(token: char) -> Option<Self> {
        match token {
            'E' => Some(Self::Elf),
            'G' => Some(Self::Goblin),
            _ => None,
        }
    }

    /// Map glyph used to draw units of this faction.
    #[must_use]
    pub const fn token(self) -> char {
        match self {
            Self::Elf => 'E',
            Self::Goblin => 'G',
        }
    }

    /// The faction this one fights against.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Elf => Self::Goblin,
            Self::Goblin => Self::Elf,
        }
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Remaining hit points of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Health(u32);

impl Health {
    /// Creates a health value with the provided hit points.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// A unit is alive while it has at least one hit point left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.0 > 0
    }

    /// Health after absorbing `damage`, bottoming out at zero.
    #[must_use]
    pub const fn damaged(self, damage: u32) -> Self {
        Self(self.0.saturating_sub(damage))
    }
}

/// Combat parameters shared by every unit of one faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactionStats {
    /// Hit points each unit starts the battle with.
    pub hit_points: u32,
    /// Damage dealt by a single attack.
    pub attack_power: u32,
}

impl Default for FactionStats {
    fn default() -> Self {
        Self {
            hit_points: DEFAULT_HIT_POINTS,
            attack_power: DEFAULT_ATTACK_POWER,
        }
    }
}

/// Battle-wide configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BattleConfig {
    /// Parameters applied to every elf.
    pub elves: FactionStats,
    /// Parameters applied to every goblin.
    pub goblins: FactionStats,
}

impl BattleConfig {
    /// Parameters for the provided faction.
    #[must_use]
    pub const fn stats(&self, faction: Faction) -> FactionStats {
        match faction {
            Faction::Elf => self.elves,
            Faction::Goblin => self.goblins,
        }
    }

    /// Mutable access to the parameters of the provided faction.
    pub fn stats_mut(&mut self, faction: Faction) -> &mut FactionStats {
        match faction {
            Faction::Elf => &mut self.elves,
            Faction::Goblin => &mut self.goblins,
        }
    }

    /// Copy of the configuration with a faction's attack power replaced.
    #[must_use]
    pub fn with_attack_power(mut self, faction: Faction, attack_power: u32) -> Self {
        self.stats_mut(faction).attack_power = attack_power;
        self
    }
}

/// Static terrain of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Impassable rock.
    Wall,
    /// Cavern floor that units may stand on.
    Open,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Moves a unit one step onto an adjacent free cell.
    MoveUnit {
        /// Identifier of the unit that moves.
        unit: UnitId,
        /// Adjacent cell the unit steps onto.
        to: CellCoord,
    },
    /// Makes one unit strike an adjacent enemy.
    Attack {
        /// Identifier of the unit dealing damage.
        attacker: UnitId,
        /// Identifier of the unit receiving damage.
        target: UnitId,
    },
    /// Removes every fallen unit from the roster.
    ClearFallen,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Confirms that a unit moved between two cells.
    UnitMoved {
        /// Identifier of the unit that moved.
        unit: UnitId,
        /// Cell the unit occupied before moving.
        from: CellCoord,
        /// Cell the unit occupies after moving.
        to: CellCoord,
    },
    /// Confirms that an attack landed.
    UnitAttacked {
        /// Identifier of the unit that attacked.
        attacker: UnitId,
        /// Identifier of the unit that was struck.
        target: UnitId,
        /// Damage dealt by the attack.
        damage: u32,
        /// Health the target has left.
        remaining: Health,
    },
    /// Announces that a unit fell and vacated its cell.
    UnitDied {
        /// Identifier of the fallen unit.
        unit: UnitId,
        /// Faction the fallen unit fought for.
        faction: Faction,
        /// Cell the unit occupied when it fell.
        cell: CellCoord,
    },
    /// Reports how many fallen units were purged from the roster.
    FallenCleared {
        /// Number of units removed.
        removed: usize,
    },
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Side the unit fights for.
    pub faction: Faction,
    /// Grid cell currently occupied by the unit.
    pub cell: CellCoord,
    /// Remaining hit points.
    pub health: Health,
    /// Damage dealt by one of the unit's attacks.
    pub attack_power: u32,
}

impl UnitSnapshot {
    /// Reports whether the unit can still act, block and be targeted.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

/// Read-only snapshot describing every unit on the map.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view, ordering the snapshots in reading order.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| (snapshot.cell, snapshot.id));
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in reading order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the living units that oppose `faction`.
    pub fn living_enemies_of(&self, faction: Faction) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.faction == faction.opponent() && snapshot.is_alive())
    }
}
