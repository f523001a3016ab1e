//! Single-source distance field builder used by the combat system.

use std::collections::VecDeque;

use cavern_skirmish_core::CellCoord;

const UNREACHED: u32 = u32::MAX;

/// Dense shortest-path distances from one origin cell.
///
/// Distances count orthogonal steps over traversable cells. The field is
/// built from a snapshot of the grid and goes stale as soon as any unit
/// moves or falls, so callers rebuild it for every decision. Walls,
/// occupied cells and cells the search never reached all report `None`.
#[derive(Clone, Debug)]
pub struct DistanceField {
    columns: u32,
    rows: u32,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Builds a fresh field rooted at `origin` using a breadth-first work queue.
    ///
    /// `is_blocked` decides which cells are impassable. The origin itself is
    /// always seeded at distance zero, even if it is occupied by the unit the
    /// field is built for. Neighbours are expanded up, left, right, down.
    #[must_use]
    pub fn build<F>(columns: u32, rows: u32, origin: CellCoord, mut is_blocked: F) -> Self
    where
        F: FnMut(CellCoord) -> bool,
    {
        let width = usize::try_from(columns).unwrap_or(0);
        let height = usize::try_from(rows).unwrap_or(0);
        let cell_count = width.checked_mul(height).unwrap_or(0);

        let mut field = Self {
            columns,
            rows,
            distances: vec![UNREACHED; cell_count],
        };

        let Some(origin_index) = index(columns, rows, origin) else {
            return field;
        };
        field.distances[origin_index] = 0;

        let mut queue = VecDeque::with_capacity(cell_count / 2);
        queue.push_back(origin);

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = index(columns, rows, cell) else {
                continue;
            };
            let next_distance = field.distances[current_index].saturating_add(1);

            for neighbor in cell.neighbors() {
                let Some(neighbor_index) = index(columns, rows, neighbor) else {
                    continue;
                };

                if field.distances[neighbor_index] <= next_distance {
                    continue;
                }

                if is_blocked(neighbor) {
                    continue;
                }

                field.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }

        field
    }

    /// Shortest distance from the origin, or `None` when unreachable.
    ///
    /// Cells outside the grid also report `None` rather than panicking, the
    /// same answer a wall gives.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        let offset = index(self.columns, self.rows, cell)?;
        match self.distances.get(offset).copied() {
            Some(UNREACHED) | None => None,
            Some(distance) => Some(distance),
        }
    }
}

fn index(columns: u32, rows: u32, cell: CellCoord) -> Option<usize> {
    if cell.column() >= columns || cell.row() >= rows {
        return None;
    }

    let width = usize::try_from(columns).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
