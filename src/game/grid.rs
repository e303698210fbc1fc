//! Grid and coordinate types.

// Index/coordinate conversions use intentional casts: indices are bounded
// by size * size, which fits u16 arithmetic by construction.
#![allow(clippy::cast_possible_truncation)]

use std::fmt;

use crate::error::{EngineError, EngineResult};

/// Smallest playable side length.
pub const MIN_GRID_SIZE: u16 = 2;

/// A coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// A square grid of tile values.
///
/// Cells hold 0 (empty) or a power of two. The grid is a dumb container:
/// it enforces bounds and the value invariant, but all gameplay mutation
/// goes through [`crate::game::GameEngine`], which keeps the empty-cell
/// count and terminal-state latches consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Side length (width == height).
    size: u16,
    /// Tile values stored in row-major order.
    cells: Vec<u32>,
}

impl Grid {
    /// Create a new empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDimensions`] if either side is below
    /// [`MIN_GRID_SIZE`] or the sides differ (the board is square by
    /// definition).
    pub fn new(width: u16, height: u16) -> EngineResult<Self> {
        if width < MIN_GRID_SIZE || height < MIN_GRID_SIZE || width != height {
            return Err(EngineError::InvalidDimensions { width, height });
        }

        let cells = vec![0; usize::from(width) * usize::from(height)];
        Ok(Self { size: width, cells })
    }

    /// Get the side length of the grid.
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// Get the raw cells slice in row-major order.
    ///
    /// Use this when you don't need coordinates, just the values.
    #[must_use]
    #[inline]
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Get the raw cells slice for direct index-based mutation.
    ///
    /// Bypasses value validation; the engine only writes values produced
    /// by merging or spawning, which are powers of two by construction.
    #[inline]
    pub(crate) fn cells_mut(&mut self) -> &mut [u32] {
        &mut self.cells
    }

    /// Check if a coordinate is within bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.size && coord.y < self.size
    }

    /// Convert a coordinate to an index into the cells array.
    fn coord_to_index(&self, coord: Coord) -> EngineResult<usize> {
        if self.in_bounds(coord) {
            Ok(usize::from(coord.y) * usize::from(self.size) + usize::from(coord.x))
        } else {
            Err(EngineError::OutOfBounds {
                x: coord.x,
                y: coord.y,
                size: self.size,
            })
        }
    }

    /// Get the tile value at the given coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] if the coordinate is outside
    /// the grid.
    pub fn get(&self, coord: Coord) -> EngineResult<u32> {
        self.coord_to_index(coord).map(|idx| self.cells[idx])
    }

    /// Set the tile value at the given coordinate, returning the previous
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] if the coordinate is outside
    /// the grid, or [`EngineError::InvalidValue`] if `value` is neither 0
    /// nor a power of two.
    pub fn set(&mut self, coord: Coord, value: u32) -> EngineResult<u32> {
        if value != 0 && !value.is_power_of_two() {
            return Err(EngineError::InvalidValue(value));
        }
        let idx = self.coord_to_index(coord)?;
        let previous = self.cells[idx];
        self.cells[idx] = value;
        Ok(previous)
    }

    /// Iterate over all coordinates and values in row-major order.
    pub fn iter(&self) -> Cells<'_> {
        Cells {
            inner: self.cells.iter().enumerate(),
            size: usize::from(self.size),
        }
    }

    /// Iterate over the coordinates of all empty cells in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.iter()
            .filter(|&(_, value)| value == 0)
            .map(|(coord, _)| coord)
    }

    /// Count the empty cells by scanning the grid.
    ///
    /// The engine maintains this count incrementally; the scan exists for
    /// construction and for cross-checking in tests.
    #[must_use]
    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|&&value| value == 0).count()
    }

    /// Check if the grid has no empty cells left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&value| value != 0)
    }
}

/// Iterator over a grid's coordinates and values in row-major order.
#[derive(Debug, Clone)]
pub struct Cells<'a> {
    inner: std::iter::Enumerate<std::slice::Iter<'a, u32>>,
    size: usize,
}

impl Iterator for Cells<'_> {
    type Item = (Coord, u32);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(idx, &value)| {
            let x = (idx % self.size) as u16;
            let y = (idx / self.size) as u16;
            (Coord::new(x, y), value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = (Coord, u32);
    type IntoIter = Cells<'a>;

    fn into_iter(self) -> Cells<'a> {
        self.iter()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let idx = usize::from(y) * usize::from(self.size) + usize::from(x);
                let value = self.cells[idx];
                if value == 0 {
                    write!(f, "{:>6}", ".")?;
                } else {
                    write!(f, "{value:>6}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
