//! Text map parser that produces the initial grid and unit placements.

use std::str::FromStr;

use cavern_skirmish_core::{CellCoord, Faction, Tile};
use thiserror::Error;

/// Reasons a map description may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input contained no map rows.
    #[error("map contains no rows")]
    Empty,
    /// A row's length differs from the first row.
    #[error("row {row} has {found} cells but the first row has {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: u32,
        /// Length of the first row.
        expected: u32,
        /// Length of the offending row.
        found: u32,
    },
    /// A cell used a glyph that is neither terrain nor a faction token.
    #[error("unknown glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Zero-based column of the glyph.
        column: u32,
        /// Zero-based row of the glyph.
        row: u32,
        /// The glyph itself.
        glyph: char,
    },
    /// The map is too large to address with cell coordinates.
    #[error("map dimensions exceed the addressable range")]
    TooLarge,
}

/// Initial position of one unit on the parsed map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Side the unit fights for.
    pub faction: Faction,
    /// Cell the unit starts on.
    pub cell: CellCoord,
}

/// Parsed battle map: static terrain plus starting unit placements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CavernMap {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
    placements: Vec<Placement>,
}

impl CavernMap {
    /// Parses a map drawn with `#` walls, `.` floor and `E`/`G` units.
    ///
    /// Carriage returns and trailing blank lines are ignored. Units stand on
    /// open floor, so their cells are recorded as [`Tile::Open`].
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut lines: Vec<&str> = input
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            let _ = lines.pop();
        }

        let Some(first) = lines.first() else {
            return Err(ParseError::Empty);
        };

        let expected = first.chars().count();
        if expected == 0 {
            return Err(ParseError::Empty);
        }
        let columns = u32::try_from(expected).map_err(|_| ParseError::TooLarge)?;
        let rows = u32::try_from(lines.len()).map_err(|_| ParseError::TooLarge)?;

        let mut tiles = Vec::with_capacity(expected * lines.len());
        let mut placements = Vec::new();

        for (row, line) in (0..rows).zip(&lines) {
            let found = line.chars().count();
            if found != expected {
                return Err(ParseError::RaggedRow {
                    row,
                    expected: columns,
                    found: u32::try_from(found).map_err(|_| ParseError::TooLarge)?,
                });
            }

            for (column, glyph) in (0..columns).zip(line.chars()) {
                let tile = match glyph {
                    '#' => Tile::Wall,
                    '.' => Tile::Open,
                    other => {
                        let Some(faction) = Faction::from_token(other) else {
                            return Err(ParseError::UnknownGlyph { column, row, glyph });
                        };
                        placements.push(Placement {
                            faction,
                            cell: CellCoord::new(column, row),
                        });
                        Tile::Open
                    }
                };
                tiles.push(tile);
            }
        }

        Ok(Self {
            columns,
            rows,
            tiles,
            placements,
        })
    }

    /// Width of the map in cells.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Height of the map in cells.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Terrain stored in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Starting units in reading order.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}

impl FromStr for CavernMap {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_terrain_and_units() {
        let map: CavernMap = "#####\n#E.G#\n#####\n".parse().expect("valid map");

        assert_eq!(map.columns(), 5);
        assert_eq!(map.rows(), 3);
        assert_eq!(map.tiles().len(), 15);
        assert_eq!(map.tiles()[0], Tile::Wall);
        assert_eq!(map.tiles()[6], Tile::Open);
        assert_eq!(map.tiles()[7], Tile::Open);
        assert_eq!(
            map.placements(),
            &[
                Placement {
                    faction: Faction::Elf,
                    cell: CellCoord::new(1, 1),
                },
                Placement {
                    faction: Faction::Goblin,
                    cell: CellCoord::new(3, 1),
                },
            ]
        );
    }

    #[test]
    fn ignores_carriage_returns_and_trailing_blank_lines() {
        let map = CavernMap::parse("###\r\n#G#\r\n###\r\n\n\n").expect("valid map");

        assert_eq!(map.rows(), 3);
        assert_eq!(map.columns(), 3);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(CavernMap::parse(""), Err(ParseError::Empty));
        assert_eq!(CavernMap::parse("\n\n"), Err(ParseError::Empty));
    }

    #[test]
    fn rejects_ragged_rows() {
        assert_eq!(
            CavernMap::parse("####\n#.#\n####"),
            Err(ParseError::RaggedRow {
                row: 1,
                expected: 4,
                found: 3,
            })
        );
    }

    #[test]
    fn rejects_unknown_glyphs() {
        assert_eq!(
            CavernMap::parse("###\n#X#\n###"),
            Err(ParseError::UnknownGlyph {
                column: 1,
                row: 1,
                glyph: 'X',
            })
        );
    }
}
