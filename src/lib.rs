// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Brix: a deterministic game-state engine for sliding-tile merge puzzles.
//!
//! This crate owns the grid of numeric tiles for a 2048-style game,
//! responds to the four directional move commands, and detects win and
//! loss conditions. It contains no drawing or input logic: presentation
//! layers query state after each move and map values to visuals
//! themselves.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Presentation / driver (caller)    │
//! ├─────────────────────────────────────┤
//! │   GameEngine (moves, spawn, latches)│
//! ├─────────────────────────────────────┤
//! │   Grid (values, bounds, iteration)  │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use brix::{Direction, GameEngine};
//!
//! let mut engine = GameEngine::with_seed(4, 4, 2048, 7)?;
//! engine.spawn_random_tile();
//! engine.spawn_random_tile();
//!
//! let result = engine.apply_move(Direction::Left);
//! if result.changed {
//!     assert_eq!(engine.empty_cell_count(), engine.grid().count_empty());
//! }
//! # Ok::<(), brix::EngineError>(())
//! ```

pub mod error;
pub mod game;

pub use error::{EngineError, EngineResult};

// Re-export key game types at crate root for convenience
pub use game::{
    Coord, DEFAULT_WIN_THRESHOLD, Direction, GameEngine, Grid, InvariantViolation, MoveResult,
    SPAWN_VALUE, check_invariants,
};
