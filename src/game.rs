//! Game layer for Brix.
//!
//! Implements the sliding-tile merge puzzle rules:
//! - Grid of power-of-two tiles (0 = empty)
//! - Directional moves with single-pass compact-and-merge
//! - Random tile spawning after every move that changed something
//! - Latched win/loss detection

mod engine;
mod grid;
mod invariants;

pub use engine::{DEFAULT_WIN_THRESHOLD, Direction, GameEngine, MoveResult, SPAWN_VALUE};
pub use grid::{Cells, Coord, Grid, MIN_GRID_SIZE};
pub use invariants::{InvariantViolation, check_invariants};
